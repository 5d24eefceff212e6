//! Participant registry using the actor pattern.
//!
//! The registry is the only shared state in the server. It maps each
//! admitted connection to its nickname and write half, and it is the single
//! place where nickname uniqueness is decided.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  RegistryCommand   ┌─────────────────┐
//! │ RegistryHandle  │───────────────────▶│  RegistryActor  │
//! │ (per task clone)│◀───────────────────│                 │
//! └─────────────────┘  oneshot replies   └────────┬────────┘
//!                                                 │
//!                                                 ▼
//!                                  BTreeMap<ConnectionId, Entry>
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::mpsc;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{Recipient, RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

/// Command channel buffer size
const COMMAND_BUFFER: usize = 256;

/// Spawn the registry actor and return a handle for interaction.
///
/// The actor stops once every handle has been dropped.
///
/// # Example
///
/// ```no_run
/// use streamlined::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let registry = spawn_registry();
///     let online = registry.snapshot().await;
///     println!("{} online", online.len());
/// }
/// ```
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(RegistryActor::new(cmd_rx).run());
    RegistryHandle::new(cmd_tx)
}
