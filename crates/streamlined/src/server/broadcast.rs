//! Broadcast engine: fan-out of announcements and eviction of dead recipients.
//!
//! A broadcast takes a registry snapshot and writes the line to every
//! recipient concurrently, each write bounded by a timeout. A recipient whose
//! write fails or times out is removed from the registry and its departure is
//! queued as a further broadcast. The queue is drained iteratively, so a chain
//! of failures never recurses, and a removed participant is never part of a
//! later snapshot, so it never receives its own departure.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Write failures evict that recipient only; the fan-out always completes

use std::collections::VecDeque;
use std::time::Duration;

use futures::future::join_all;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, warn};

use streamline_core::{ConnectionId, Participant};
use streamline_protocol::Announcement;

use crate::registry::RegistryHandle;
use crate::transport::ParticipantWriter;

/// Write timeout (10 seconds)
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Relays announcements to every registered participant.
#[derive(Clone)]
pub struct Broadcaster {
    registry: RegistryHandle,
    write_timeout: Duration,
}

/// Outcome of one `broadcast` call, departures included.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Lines successfully written, across the original announcement and any
    /// departures it caused
    pub delivered: usize,

    /// Participants evicted because a write to them failed
    pub evicted: Vec<Participant>,
}

impl Broadcaster {
    pub fn new(registry: RegistryHandle) -> Self {
        Self::with_write_timeout(registry, WRITE_TIMEOUT)
    }

    pub fn with_write_timeout(registry: RegistryHandle, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Sends `announcement` to every participant except `exclude`.
    ///
    /// Never fails as a whole. Every recipient that cannot be written to is
    /// evicted, and each eviction announces `<nickname> left` to whoever
    /// remains.
    pub async fn broadcast(
        &self,
        announcement: Announcement,
        exclude: Option<ConnectionId>,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut pending = VecDeque::from([(announcement, exclude)]);

        while let Some((announcement, exclude)) = pending.pop_front() {
            let line = announcement.to_wire();

            let recipients: Vec<_> = self
                .registry
                .snapshot()
                .await
                .into_iter()
                .filter(|r| Some(r.participant.connection) != exclude)
                .collect();

            let results = join_all(
                recipients
                    .iter()
                    .map(|r| write_line(&r.writer, &line, self.write_timeout)),
            )
            .await;

            for (recipient, result) in recipients.iter().zip(results) {
                let connection = recipient.participant.connection;
                match result {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        warn!(
                            connection = %connection,
                            nickname = %recipient.participant.nickname,
                            error = %e,
                            "Write failed, evicting participant"
                        );
                        if let Some(gone) = self.registry.remove(connection).await {
                            pending.push_back((Announcement::Left(gone.nickname.clone()), None));
                            report.evicted.push(gone);
                        }
                    }
                }
            }

            debug!(
                line = %line,
                recipients = recipients.len(),
                "Broadcast complete"
            );
        }

        report
    }

    /// Removes a connection and announces its departure.
    ///
    /// Returns `true` if this call performed the removal. Concurrent callers
    /// for the same connection see `false`, so the departure is announced
    /// exactly once.
    pub async fn evict(&self, connection: ConnectionId) -> bool {
        match self.registry.remove(connection).await {
            Some(gone) => {
                self.broadcast(Announcement::Left(gone.nickname), None).await;
                true
            }
            None => false,
        }
    }
}

/// Writes one line plus delimiter and flushes, bounded by `write_timeout`.
///
/// The timeout also covers waiting for the writer's lock.
pub async fn write_line(
    writer: &ParticipantWriter,
    line: &str,
    write_timeout: Duration,
) -> Result<(), RelayError> {
    let write = async {
        let mut writer = writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    };

    match timeout(write_timeout, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RelayError::Write(e.to_string())),
        Err(_) => Err(RelayError::WriteTimeout),
    }
}

/// Flushes and shuts down the write half. Errors are only logged.
pub async fn close_writer(writer: &ParticipantWriter) {
    let close = async {
        let mut writer = writer.lock().await;
        writer.shutdown().await
    };

    match timeout(WRITE_TIMEOUT, close).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "Error closing connection"),
        Err(_) => debug!("Timed out closing connection"),
    }
}

/// Errors writing to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("Write failed: {0}")]
    Write(String),

    #[error("Write timeout")]
    WriteTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::spawn_registry;
    use crate::transport::split_stream;
    use streamline_core::Nickname;
    use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream, Lines};
    use tokio_util::sync::CancellationToken;

    type PeerLines = Lines<BufReader<DuplexStream>>;

    /// Registers `nickname` and returns the peer side of its stream.
    async fn join(registry: &RegistryHandle, id: u64, nickname: &str, buffer: usize) -> DuplexStream {
        let (server_side, peer) = tokio::io::duplex(buffer);
        let (_reader, writer) = split_stream(Box::new(server_side));
        registry
            .add(
                Participant::new(ConnectionId::new(id), Nickname::new_unchecked(nickname)),
                writer,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        peer
    }

    fn lines(peer: DuplexStream) -> PeerLines {
        BufReader::new(peer).lines()
    }

    async fn next_line(lines: &mut PeerLines) -> String {
        tokio::time::timeout(Duration::from_secs(1), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_sender_is_excluded() {
        let registry = spawn_registry();
        let mut alice = lines(join(&registry, 1, "alice", 1024).await);
        let mut bob = lines(join(&registry, 2, "bob", 1024).await);

        let broadcaster = Broadcaster::new(registry.clone());
        let report = broadcaster
            .broadcast(
                Announcement::chat(Nickname::new_unchecked("alice"), "hi"),
                Some(ConnectionId::new(1)),
            )
            .await;

        assert_eq!(report.delivered, 1);
        assert!(report.evicted.is_empty());
        assert_eq!(next_line(&mut bob).await, "alice: hi");

        // alice gets nothing
        let nothing =
            tokio::time::timeout(Duration::from_millis(100), alice.next_line()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_evicts_and_announces_once() {
        let registry = spawn_registry();
        let mut alice = lines(join(&registry, 1, "alice", 1024).await);
        let quinn = join(&registry, 2, "quinn", 1024).await;
        let mut carol = lines(join(&registry, 3, "carol", 1024).await);

        drop(quinn);

        let broadcaster = Broadcaster::new(registry.clone());
        let report = broadcaster
            .broadcast(Announcement::Joined(Nickname::new_unchecked("dave")), None)
            .await;

        assert_eq!(report.evicted.len(), 1);
        assert_eq!(report.evicted[0].nickname.as_str(), "quinn");
        assert!(!registry.snapshot().await.iter().any(|r| r.participant.nickname.as_str() == "quinn"));

        for peer in [&mut alice, &mut carol] {
            assert_eq!(next_line(peer).await, "dave joined");
            assert_eq!(next_line(peer).await, "quinn left");
        }
        let extra = tokio::time::timeout(Duration::from_millis(100), alice.next_line()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_slow_reader_times_out_and_is_evicted() {
        let registry = spawn_registry();
        let mut alice = lines(join(&registry, 1, "alice", 1024).await);
        // Nobody reads this peer and its buffer is tiny
        let _stalled = join(&registry, 2, "slow", 8).await;

        let broadcaster =
            Broadcaster::with_write_timeout(registry.clone(), Duration::from_millis(100));
        let report = broadcaster
            .broadcast(
                Announcement::chat(Nickname::new_unchecked("alice"), "a line longer than eight bytes"),
                Some(ConnectionId::new(1)),
            )
            .await;

        assert_eq!(report.evicted.len(), 1);
        assert_eq!(next_line(&mut alice).await, "slow left");
    }

    #[tokio::test]
    async fn test_evict_is_exactly_once() {
        let registry = spawn_registry();
        let mut alice = lines(join(&registry, 1, "alice", 1024).await);
        let _bob = join(&registry, 2, "bob", 1024).await;

        let broadcaster = Broadcaster::new(registry.clone());
        let (first, second) = tokio::join!(
            broadcaster.evict(ConnectionId::new(2)),
            broadcaster.evict(ConnectionId::new(2)),
        );

        assert!(first ^ second);
        assert_eq!(next_line(&mut alice).await, "bob left");
        let extra = tokio::time::timeout(Duration::from_millis(100), alice.next_line()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_evict_unknown_connection_is_noop() {
        let registry = spawn_registry();
        let broadcaster = Broadcaster::new(registry);
        assert!(!broadcaster.evict(ConnectionId::new(42)).await);
    }

    #[test]
    fn test_relay_error_display() {
        assert_eq!(RelayError::WriteTimeout.to_string(), "Write timeout");
        assert!(RelayError::Write("broken pipe".into())
            .to_string()
            .contains("broken pipe"));
    }
}
