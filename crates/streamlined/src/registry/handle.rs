//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending commands
//! to the registry actor.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use streamline_core::{ConnectionId, Participant};

use super::commands::{Recipient, RegistryCommand, RegistryError};
use crate::transport::ParticipantWriter;

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across connection
/// tasks. All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let handle = registry.clone();
///
/// // Register an admitted connection
/// handle.add(participant, writer, close_token).await?;
///
/// // Copy the recipients for a broadcast
/// let recipients = handle.snapshot().await;
///
/// // Remove; only one caller ever sees `Some`
/// if let Some(gone) = handle.remove(connection).await { /* announce */ }
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Register an admitted connection under its nickname.
    ///
    /// The nickname check and the insertion happen inside the actor as one
    /// step, so two concurrent admissions of the same nickname cannot both
    /// succeed.
    ///
    /// # Errors
    ///
    /// - `RegistryError::DuplicateNickname` if a live participant holds the nickname
    /// - `RegistryError::AlreadyRegistered` if this connection is already registered
    /// - `RegistryError::ShuttingDown` if the server is closing
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn add(
        &self,
        participant: Participant,
        writer: ParticipantWriter,
        close_token: CancellationToken,
    ) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Add {
                participant,
                writer,
                close_token,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Remove a connection.
    ///
    /// Returns the removed participant, or `None` if the connection was not
    /// registered (never admitted, or already removed). Safe to call from
    /// any number of tasks for the same connection.
    pub async fn remove(&self, connection: ConnectionId) -> Option<Participant> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Remove {
                connection,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            warn!(connection = %connection, "Registry unavailable, cannot remove");
            return None;
        }

        rx.await.ok().flatten()
    }

    /// Point-in-time copy of every recipient, ordered by connection id.
    ///
    /// Returns an empty list if the actor has shut down.
    pub async fn snapshot(&self) -> Vec<Recipient> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Snapshot { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Remove every participant and refuse further additions.
    ///
    /// Each removed connection's close token is cancelled. The returned
    /// recipients let the caller shut their writers down.
    pub async fn close_all(&self) -> Vec<Recipient> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::CloseAll { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }
}
