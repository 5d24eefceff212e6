//! StreamLine client - library modules
//!
//! This library provides the interactive terminal client for the StreamLine
//! relay.
//!
//! # Architecture
//!
//! A session runs two concurrent flows over one connection:
//!
//! 1. **Input Thread**: Reads stdin lines and forwards them over a channel
//! 2. **Session Loop**: Sends those lines to the server and prints what the
//!    server relays back, until `/exit`, end of input, or server close
//!
//! Settings are resolved from flags, then prompts with config-file defaults.

pub mod cli;
pub mod client;
pub mod error;
pub mod settings;
pub mod ui;

// Re-export commonly used types
pub use client::{connect, Session, SessionEnd};
pub use error::{ClientError, Result};
pub use settings::{ClientArgs, ClientSettings};
