// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    /// Upper bound on every store call.
    pub request_timeout: Duration,
    /// When set, deleting an item hides it (`isActive = false`) instead of removing it.
    pub soft_delete: bool,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = parse_var("PORT", 3000)?;
        let timeout_ms: u64 = parse_var("REQUEST_TIMEOUT_MS", 5000)?;
        let soft_delete = parse_var("LOSTFOUND_SOFT_DELETE", false)?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 5)?;

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            request_timeout: Duration::from_millis(timeout_ms),
            soft_delete,
            db_max_connections,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, given secret.
    pub fn for_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.into(),
            rust_log: "error".to_string(),
            port: 0,
            request_timeout: Duration::from_secs(5),
            soft_delete: false,
            db_max_connections: 1,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
