use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Upper bound for `token_ttl_hours`: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// Staff account that can never be deleted.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@restaurante.com";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Email of the protected administrative staff account.
    pub admin_email: String,
    /// Lifetime of bearer tokens issued by the login endpoint.
    pub token_ttl_hours: i64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.token_ttl()?;
        if !self.admin_email.contains('@') {
            return Err(Error::Config(format!(
                "admin_email '{}' is not an email address",
                self.admin_email
            )));
        }
        Ok(())
    }

    /// Lifetime of login tokens, between one hour and [`MAX_TOKEN_TTL_HOURS`].
    pub fn token_ttl(&self) -> Result<TimeDelta> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(Error::Config(format!(
                "token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                self.token_ttl_hours
            )));
        }
        TimeDelta::try_hours(self.token_ttl_hours).ok_or_else(|| {
            Error::Config(format!(
                "token_ttl_hours {} is out of range",
                self.token_ttl_hours
            ))
        })
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("reserva.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            token_ttl_hours: 12,
        }
    }
}
