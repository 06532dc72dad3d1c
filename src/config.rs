// Rapport Configuration
//
// Server address, database location and log level, loaded from an optional
// TOML file. CLI flags and RAPPORT_DB_PATH override the file.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the configured database path
pub const DB_PATH_ENV: &str = "RAPPORT_DB_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RapportConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level for the rapport crate (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default database path under the platform's local data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rapport")
        .join("rapport.db")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // The dashboard has always talked to port 5000
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for RapportConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl RapportConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: RapportConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "log_level must be one of trace, debug, info, warn, error (got '{}')",
                other
            ))),
        }
    }

    /// Parsed server address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.addr.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "server.addr '{}' is not a socket address: {}",
                self.server.addr, e
            ))
        })
    }

    /// Apply CLI and environment overrides
    ///
    /// Precedence: CLI flag, then `RAPPORT_DB_PATH`, then the file value.
    pub fn with_overrides(
        mut self,
        db_path: Option<String>,
        env_db_path: Option<String>,
        addr: Option<String>,
    ) -> Self {
        if let Some(path) = db_path.or(env_db_path).filter(|p| !p.is_empty()) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        self
    }
}
