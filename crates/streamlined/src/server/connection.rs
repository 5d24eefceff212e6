//! Connection handler for an admitted participant.
//!
//! The handler reads lines from its participant and relays each one to
//! everybody else. It stops on EOF, a read error, an oversized line, or
//! when its close token is cancelled (the registry removed it, or the
//! server is shutting down). On the way out it evicts its own connection,
//! which announces the departure unless someone else already removed it.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Connection errors are logged and result in graceful disconnect

use futures::StreamExt;
use tokio_util::codec::LinesCodecError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use streamline_core::Participant;
use streamline_protocol::Announcement;

use super::broadcast::{close_writer, Broadcaster};
use crate::transport::{ConnectionReader, ParticipantWriter};

/// Why a handler stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Peer closed its side
    Eof,
    /// Read failed or the line exceeded the length limit
    ReadError,
    /// Close token cancelled from outside
    Closed,
}

/// Relay loop for a single participant.
pub struct ConnectionHandler {
    participant: Participant,
    reader: ConnectionReader,
    writer: ParticipantWriter,
    close_token: CancellationToken,
    broadcaster: Broadcaster,
}

impl ConnectionHandler {
    pub fn new(
        participant: Participant,
        reader: ConnectionReader,
        writer: ParticipantWriter,
        close_token: CancellationToken,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            participant,
            reader,
            writer,
            close_token,
            broadcaster,
        }
    }

    /// Runs until the participant leaves, then cleans up.
    pub async fn run(mut self) -> ExitReason {
        let reason = self.relay_lines().await;

        let evicted = self.broadcaster.evict(self.participant.connection).await;
        close_writer(&self.writer).await;

        info!(
            connection = %self.participant.connection,
            nickname = %self.participant.nickname,
            reason = ?reason,
            announced = evicted,
            "Participant disconnected"
        );
        reason
    }

    async fn relay_lines(&mut self) -> ExitReason {
        loop {
            tokio::select! {
                biased;

                _ = self.close_token.cancelled() => {
                    debug!(connection = %self.participant.connection, "Connection closed by server");
                    return ExitReason::Closed;
                }

                next = self.reader.next() => match next {
                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        self.broadcaster
                            .broadcast(
                                Announcement::chat(self.participant.nickname.clone(), line),
                                Some(self.participant.connection),
                            )
                            .await;
                    }
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        warn!(connection = %self.participant.connection, "Line too long, disconnecting");
                        return ExitReason::ReadError;
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        debug!(connection = %self.participant.connection, error = %e, "Read error");
                        return ExitReason::ReadError;
                    }
                    None => {
                        debug!(connection = %self.participant.connection, "Client sent EOF");
                        return ExitReason::Eof;
                    }
                },
            }
        }
    }
}
