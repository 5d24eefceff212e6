//! The `config.json` file shared by the server and the client.
//!
//! Every field is optional. The server resolves the file into its runtime
//! configuration; the client only uses it for prompt defaults.
//!
//! ```json
//! {
//!   "host": "0.0.0.0",
//!   "port": 5050,
//!   "password": "hunter2",
//!   "max_workers": 10,
//!   "require_alphanumeric": true,
//!   "tls": { "cert_path": "cert.pem", "key_path": "key.pem" }
//! }
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "STREAMLINE_CONFIG";

/// Config file name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// TLS certificate and key locations (PEM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// On-disk configuration, every field optional.
///
/// `server_port` and `server_password` are accepted as aliases for files
/// written by older releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub host: Option<String>,
    #[serde(alias = "server_port")]
    pub port: Option<u16>,
    #[serde(alias = "server_password")]
    pub password: Option<String>,
    pub max_workers: Option<usize>,
    pub require_alphanumeric: Option<bool>,
    pub tls: Option<TlsConfig>,
}

impl ConfigFile {
    /// Loads and parses a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigFileError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let file: ConfigFile =
            serde_json::from_str(&contents).map_err(|e| ConfigFileError::Parse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        debug!(path = %path.display(), "Config file loaded");
        Ok(file)
    }

    /// Finds and loads the config file.
    ///
    /// Lookup order: `explicit` (a `--config` flag), `$STREAMLINE_CONFIG`,
    /// `./config.json`, `<config dir>/streamline/config.json`. An explicitly
    /// named file must exist; the implicit locations are skipped when absent.
    /// Returns defaults when nothing is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigFileError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }
}

/// Implicit config file locations, in lookup order.
fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("streamline").join(CONFIG_FILE_NAME));
    }
    locations
}

/// Errors from reading the config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Invalid config file {path}: {error}")]
    Parse { path: PathBuf, error: String },
}
