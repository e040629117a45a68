use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "SurgicalConsent";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address for the booklet API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Signature rasters arrive inline as base64 data URLs; 5 MiB leaves room
/// for large canvases without accepting unbounded bodies.
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub const ENV_DB_PATH: &str = "CONSENT_DB_PATH";
pub const ENV_BIND_ADDR: &str = "CONSENT_BIND_ADDR";
pub const ENV_MAX_BODY_BYTES: &str = "CONSENT_MAX_BODY_BYTES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory; set {ENV_DB_PATH}")]
    NoHomeDir,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "surgical_consent=info,tower_http=warn"
}

/// Get the application data directory
/// ~/SurgicalConsent/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Runtime settings, read once at process start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match non_empty(lookup(ENV_DB_PATH)) {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("consent.db"),
        };

        let bind_raw =
            non_empty(lookup(ENV_BIND_ADDR)).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: ENV_BIND_ADDR,
                value: bind_raw.clone(),
            })?;

        let max_body_bytes = match non_empty(lookup(ENV_MAX_BODY_BYTES)) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: ENV_MAX_BODY_BYTES,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            db_path,
            bind_addr,
            max_body_bytes,
        })
    }

    /// Create the database's parent directory if it does not exist yet.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::DataDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
