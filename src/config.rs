use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "debug";

#[derive(Debug, Clone)]
pub struct Config {
    pub postgres_url: String,
    pub bind_address: SocketAddr,
    pub static_dir: PathBuf,
    pub max_connections: u32,
    pub log_level: LevelFilter,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let postgres_url = vars
            .get("POSTGRES_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("POSTGRES_URL".to_string()))?
            .clone();

        let bind_address = parse_var(vars, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?;

        let static_dir = vars
            .get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let max_connections: u32 = parse_var(
            vars,
            "DB_MAX_CONNECTIONS",
            &DEFAULT_MAX_CONNECTIONS.to_string(),
        )?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DB_MAX_CONNECTIONS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let log_level = parse_var(vars, "LOG_LEVEL", DEFAULT_LOG_LEVEL)?;

        Ok(Config {
            postgres_url,
            bind_address,
            static_dir,
            max_connections,
            log_level,
        })
    }
}

/// Log level to start logging with before the full configuration is loaded,
/// so configuration errors can be logged. An invalid `LOG_LEVEL` falls back
/// to the default here and is reported by [`Config::from_vars`].
pub fn startup_log_level(vars: &HashMap<String, String>) -> LevelFilter {
    vars.get("LOG_LEVEL")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(LevelFilter::DEBUG)
}

fn parse_var<T>(vars: &HashMap<String, String>, name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = vars.get(name).map(String::as_str).unwrap_or(default);
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
