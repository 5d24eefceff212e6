//! Server configuration.
//!
//! The shared `config.json` (see [`streamline_core::config`]) is resolved
//! here into a [`ServerConfig`], with command-line flags taking precedence.
//! The loaded `ServerConfig` is immutable for the lifetime of the server.

use thiserror::Error;

use streamline_core::NicknamePolicy;

pub use streamline_core::config::{
    ConfigFile, ConfigFileError, TlsConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME,
};

use crate::port::allocate_ephemeral_port;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default number of concurrently served connection handlers
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub max_workers: Option<usize>,
    pub allow_any_nickname: bool,
}

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to bind (0 lets the OS pick at bind time)
    pub port: u16,

    /// Shared secret required before nickname negotiation
    pub password: Option<String>,

    /// Connection handlers served concurrently; others wait for a slot
    pub max_workers: usize,

    /// Only letters and digits in nicknames
    pub require_alphanumeric: bool,

    /// TLS material; `None` means plaintext TCP
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
            password: None,
            max_workers: DEFAULT_MAX_WORKERS,
            require_alphanumeric: true,
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Merges a config file with command-line overrides.
    ///
    /// A blank password means no password. When no port is given anywhere,
    /// a free ephemeral port is allocated.
    pub fn resolve(file: ConfigFile, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let host = overrides
            .host
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match overrides.port.or(file.port) {
            Some(port) if port != 0 => port,
            _ => allocate_ephemeral_port().map_err(|e| ConfigError::PortAllocation(e.to_string()))?,
        };

        let password = overrides
            .password
            .or(file.password)
            .filter(|p| !p.trim().is_empty());

        let max_workers = overrides
            .max_workers
            .or(file.max_workers)
            .unwrap_or(DEFAULT_MAX_WORKERS);
        if max_workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }

        let require_alphanumeric =
            !overrides.allow_any_nickname && file.require_alphanumeric.unwrap_or(true);

        Ok(Self {
            host,
            port,
            password,
            max_workers,
            require_alphanumeric,
            tls: file.tls,
        })
    }

    /// Nickname rules derived from this configuration.
    pub fn nickname_policy(&self) -> NicknamePolicy {
        NicknamePolicy {
            require_alphanumeric: self.require_alphanumeric,
            ..NicknamePolicy::default()
        }
    }

    /// `host:port` for display and logging.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] ConfigFileError),

    #[error("Failed to allocate a free port: {0}")]
    PortAllocation(String),

    #[error("max_workers must be at least 1")]
    InvalidWorkers,
}
