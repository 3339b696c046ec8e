//! Service settings

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Backing store for tickets, archive, score and users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
}

impl ServerConfig {
    /// Load settings from `TRACKER_*` environment variables
    ///
    /// # Environment Variables
    /// - `TRACKER_HOST`: bind address (default: "0.0.0.0")
    /// - `TRACKER_PORT`: bind port (default: 5000)
    /// - `TRACKER_STORAGE`: `postgres` or `memory` (default: "postgres")
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("storage", "postgres")?
            .add_source(Environment::with_prefix("TRACKER"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.storage, StorageBackend::Postgres);
    }

    #[test]
    #[serial]
    fn test_server_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("TRACKER_PORT", "8080");
            std::env::set_var("TRACKER_STORAGE", "memory");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageBackend::Memory);

        unsafe {
            std::env::remove_var("TRACKER_PORT");
            std::env::remove_var("TRACKER_STORAGE");
        }
    }
}
