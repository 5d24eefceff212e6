//! Registry actor - owns all participant state and processes commands.
//!
//! The RegistryActor is the single owner of participant state in the system.
//! It receives commands via an mpsc channel and answers each on a oneshot.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use streamline_core::{ConnectionId, Nickname, Participant};

use super::commands::{Recipient, RegistryCommand, RegistryError};
use crate::transport::ParticipantWriter;

// ============================================================================
// Registry Actor
// ============================================================================

/// One registered connection.
struct Entry {
    nickname: Nickname,
    writer: ParticipantWriter,
    close_token: CancellationToken,
}

impl Entry {
    fn recipient(&self, connection: ConnectionId) -> Recipient {
        Recipient {
            participant: Participant::new(connection, self.nickname.clone()),
            writer: self.writer.clone(),
        }
    }
}

/// The registry actor - owns all participant state.
///
/// Implements the actor pattern: receives commands via mpsc channel,
/// and processes them sequentially.
///
/// # Ownership
///
/// The actor owns a single map keyed by connection identity. Nickname
/// uniqueness is checked against that same map, so there is no second
/// index that could drift out of step with it.
///
/// # Thread Safety
///
/// The actor runs in a single task and processes commands sequentially.
/// All state mutations happen within this single task.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Registered connections, ordered by connection id
    participants: BTreeMap<ConnectionId, Entry>,

    /// Set by `CloseAll`; no further additions are accepted
    closed: bool,
}

impl RegistryActor {
    /// Creates a new registry actor reading commands from `receiver`.
    pub fn new(receiver: mpsc::Receiver<RegistryCommand>) -> Self {
        Self {
            receiver,
            participants: BTreeMap::new(),
            closed: false,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    /// This is the main entry point - call this in a spawned task.
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            "Registry actor stopped (participants: {})",
            self.participants.len()
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Add {
                participant,
                writer,
                close_token,
                respond_to,
            } => {
                let result = self.handle_add(participant, writer, close_token);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Remove {
                connection,
                respond_to,
            } => {
                let result = self.handle_remove(connection);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.handle_snapshot());
            }
            RegistryCommand::CloseAll { respond_to } => {
                let _ = respond_to.send(self.handle_close_all());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    /// Checks nickname uniqueness and inserts, as one step.
    fn handle_add(
        &mut self,
        participant: Participant,
        writer: ParticipantWriter,
        close_token: CancellationToken,
    ) -> Result<(), RegistryError> {
        if self.closed {
            return Err(RegistryError::ShuttingDown);
        }

        if self.participants.contains_key(&participant.connection) {
            return Err(RegistryError::AlreadyRegistered(participant.connection));
        }

        if self
            .participants
            .values()
            .any(|entry| entry.nickname == participant.nickname)
        {
            debug!(
                connection = %participant.connection,
                nickname = %participant.nickname,
                "Nickname already in use, rejecting registration"
            );
            return Err(RegistryError::DuplicateNickname(participant.nickname));
        }

        self.participants.insert(
            participant.connection,
            Entry {
                nickname: participant.nickname.clone(),
                writer,
                close_token,
            },
        );

        info!(
            connection = %participant.connection,
            nickname = %participant.nickname,
            total_participants = self.participants.len(),
            "Participant registered"
        );

        Ok(())
    }

    /// Removes a connection and signals its handler to stop.
    fn handle_remove(&mut self, connection: ConnectionId) -> Option<Participant> {
        let entry = self.participants.remove(&connection)?;
        entry.close_token.cancel();

        let participant = Participant::new(connection, entry.nickname);

        info!(
            connection = %connection,
            nickname = %participant.nickname,
            total_participants = self.participants.len(),
            "Participant removed"
        );

        Some(participant)
    }

    fn handle_snapshot(&self) -> Vec<Recipient> {
        self.participants
            .iter()
            .map(|(connection, entry)| entry.recipient(*connection))
            .collect()
    }

    fn handle_close_all(&mut self) -> Vec<Recipient> {
        self.closed = true;

        let drained: Vec<Recipient> = std::mem::take(&mut self.participants)
            .into_iter()
            .map(|(connection, entry)| {
                entry.close_token.cancel();
                entry.recipient(connection)
            })
            .collect();

        info!(closed = drained.len(), "Registry closed all connections");
        drained
    }

    /// Returns the current participant count (for testing).
    #[cfg(test)]
    pub(crate) fn participant_count(&self) -> usize {
        self.participants.len()
    }
}
