//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `Recipient`: A participant paired with its write half
//!
//! All types are designed for async message passing and follow the panic-free policy.

use streamline_core::{ConnectionId, Nickname, Participant};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::transport::ParticipantWriter;

// ============================================================================
// Recipients
// ============================================================================

/// A registered participant together with its write half.
///
/// Snapshots hand these out so the broadcaster can write without touching
/// the live registry.
#[derive(Clone)]
pub struct Recipient {
    pub participant: Participant,
    pub writer: ParticipantWriter,
}

impl std::fmt::Debug for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipient")
            .field("participant", &self.participant)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command uses a oneshot channel for the response. The actor handles
/// one command at a time, which is what makes the nickname check-and-add in
/// `Add` a single critical section.
pub enum RegistryCommand {
    /// Register an admitted connection.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateNickname` if a live participant holds the nickname
    /// - `RegistryError::AlreadyRegistered` if the connection is already registered
    /// - `RegistryError::ShuttingDown` after `CloseAll`
    Add {
        participant: Participant,
        writer: ParticipantWriter,
        /// Cancelled when the registry closes this connection
        close_token: CancellationToken,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Remove a connection. Idempotent: `None` if it was not registered.
    Remove {
        connection: ConnectionId,
        respond_to: oneshot::Sender<Option<Participant>>,
    },

    /// Point-in-time copy of all recipients, in admission order.
    Snapshot {
        respond_to: oneshot::Sender<Vec<Recipient>>,
    },

    /// Remove and close every connection; refuse further additions.
    CloseAll {
        respond_to: oneshot::Sender<Vec<Recipient>>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another live participant holds this nickname.
    #[error("nickname already in use: {0}")]
    DuplicateNickname(Nickname),

    /// The connection is already registered.
    #[error("connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),

    /// The registry is draining for shutdown.
    #[error("registry is shutting down")]
    ShuttingDown,

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}
