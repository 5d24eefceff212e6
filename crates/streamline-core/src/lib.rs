//! StreamLine Core - Shared types for the chat relay
//!
//! This crate provides the domain types shared between
//! the server (streamlined) and the terminal client.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod config;
pub mod connection;
pub mod nickname;
pub mod participant;

// Re-exports for convenience
pub use config::{ConfigFile, ConfigFileError, TlsConfig};
pub use connection::ConnectionId;
pub use nickname::{Nickname, NicknameError, NicknamePolicy, MAX_NICKNAME_LENGTH};
pub use participant::Participant;
