use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reserva::auth::CredentialHasher;
use reserva::config::{DEFAULT_ADMIN_EMAIL, ServerConfig};
use reserva::server::{AppState, create_router};
use reserva::service::staff::create_admin;
use reserva::store::{SqliteStore, Store};

const GENERATED_PASSWORD_LENGTH: usize = 20;
const PASSWORD_FILE: &str = ".admin_password";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "reserva")]
#[command(about = "A restaurant reservation server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and administrator account)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Email of the protected administrator account
        #[arg(long, default_value = DEFAULT_ADMIN_EMAIL)]
        admin_email: String,

        /// Administrator password. Prompted for when omitted.
        #[arg(long)]
        admin_password: Option<String>,

        /// Skip interactive prompts. Generates a password if none is given.
        #[arg(long)]
        non_interactive: bool,
    },
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

fn prompt_password() -> anyhow::Result<String> {
    let password = inquire::Password::new("Administrator password:")
        .with_validator(|input: &str| {
            if input.chars().count() < 6 {
                Err("Password must have at least 6 characters".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(password)
}

fn run_init(
    data_dir: PathBuf,
    admin_email: String,
    admin_password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;

    let config = ServerConfig {
        data_dir,
        admin_email,
        ..ServerConfig::default()
    };
    config.validate()?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    if store.get_staff_by_email(&config.admin_email)?.is_some() {
        bail!(
            "Server already initialized. Administrator account {} exists.",
            config.admin_email
        );
    }

    let (password, generated) = match admin_password {
        Some(password) => (password, false),
        None if non_interactive => (generate_password(), true),
        None => (prompt_password()?, false),
    };

    let admin = create_admin(
        &store,
        &CredentialHasher::new(),
        &config.admin_email,
        &password,
    )?;
    info!(staff_id = admin.id, "administrator account created");

    println!();
    println!("========================================");
    println!("Administrator: {}", admin.email);

    if generated {
        let password_file = config.data_dir.join(PASSWORD_FILE);
        fs::write(&password_file, &password)?;

        #[cfg(unix)]
        set_restrictive_permissions(&password_file);

        println!();
        println!("Generated password (save this, it won't be shown again):");
        println!();
        println!("  {password}");
        println!();
        println!("Password also written to: {}", password_file.display());
    }

    println!("========================================");
    println!();

    store.close()?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "Server not initialized. Run 'reserva admin init' first to create the database and administrator account."
        );
    }

    let store = Arc::new(SqliteStore::new(&db_path)?);
    store.initialize()?;

    if store.get_staff_by_email(&config.admin_email)?.is_none() {
        bail!(
            "Server not initialized. Run 'reserva admin init' first to create the database and administrator account."
        );
    }

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(store.clone(), config));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close()?;
    info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("reserva=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                admin_email,
                admin_password,
                non_interactive,
            } => {
                run_init(data_dir, admin_email, admin_password, non_interactive)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }

            run_serve(config).await?;
        }
    }

    Ok(())
}
