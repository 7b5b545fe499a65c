use std::path::Path;
use std::sync::Arc;

use reserva::auth::CredentialHasher;
use reserva::config::ServerConfig;
use reserva::server::{AppState, create_router};
use reserva::service::staff::create_admin;
use reserva::store::{SqliteStore, Store};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub config: ServerConfig,
    server_task: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Starts an initialized server on an ephemeral port in this process.
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize schema");
        create_admin(
            &store,
            &CredentialHasher::new(),
            &config.admin_email,
            ADMIN_PASSWORD,
        )
        .expect("create admin");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = Arc::new(AppState::new(Arc::new(store), config.clone()));
        let app = create_router(state);
        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self::wait_for_ready(&base_url).await;

        Self {
            temp_dir,
            base_url,
            config,
            server_task: Some(server_task),
        }
    }

    async fn wait_for_ready(base_url: &str) {
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
    }
}
