//! Error types for the StreamLine client.
//!
//! All error types use `thiserror` for derive macros and provide clear,
//! user-friendly error messages.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;

use streamline_core::{ConfigFileError, NicknameError};
use streamline_protocol::PemError;
use thiserror::Error;

// ============================================================================
// Client Error Type
// ============================================================================

/// Client errors, from input validation through connecting to the session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server could not be reached.
    ///
    /// Usually a wrong host/port or the server is not running.
    #[error("Unable to connect to {address}: {error}")]
    Connection { address: String, error: String },

    /// TLS setup or handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server refused admission. Holds the server's explanation.
    #[error("{0}")]
    Rejected(String),

    /// The server closed the connection before admission completed.
    #[error("Server closed the connection during the handshake")]
    HandshakeClosed,

    /// The port entered is not a number in 1..=65535.
    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    /// The chosen nickname fails the local policy check.
    #[error("Invalid nickname: {0}")]
    InvalidNickname(#[from] NicknameError),

    /// The config file exists but could not be used.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// CA certificate could not be loaded.
    #[error("{0}")]
    Pem(#[from] PemError),

    /// I/O error passthrough.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
