//! Process configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HRMS_BIND_ADDR` | `0.0.0.0:8080` |
//! | `JWT_SECRET` | insecure dev secret |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `HRMS_DB_MAX_CONNECTIONS` | `5` |
//! | `HRMS_SEED_FILE` | unset: no seed |
//! | `HRMS_LOG_FORMAT` | `json` |

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use hrms_observability::{LogFormat, ParseLogFormatError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid HRMS_BIND_ADDR '{0}'")]
    InvalidBindAddr(String),

    #[error("invalid HRMS_DB_MAX_CONNECTIONS '{0}'")]
    InvalidMaxConnections(String),

    #[error("invalid HRMS_LOG_FORMAT: {0}")]
    InvalidLogFormat(#[from] ParseLogFormatError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was unset and the dev secret is in use.
    pub jwt_secret_is_default: bool,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub seed_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("HRMS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let db_max_connections = match get("HRMS_DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidMaxConnections(v.clone()))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match get("HRMS_LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_secret_is_default,
            database_url: get("DATABASE_URL"),
            db_max_connections,
            seed_file: get("HRMS_SEED_FILE").map(PathBuf::from),
            log_format,
        })
    }
}
