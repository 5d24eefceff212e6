//! TCP server for the relay.
//!
//! The server:
//! - Listens on a TCP socket for client connections
//! - Spawns one task per connection (transport setup, admission, relay)
//! - Gates relay loops with a `max_workers` semaphore
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   ChatServer    │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │   admission     │────▶│  RegistryHandle │
//! │ (per connection)│     │                 │
//! └───────┬─────────┘     └────────▲────────┘
//!         │ worker permit          │ snapshot / remove
//!         ▼                        │
//! ┌─────────────────┐     ┌────────┴────────┐
//! │ConnectionHandler│────▶│   Broadcaster   │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Per-connection errors are logged and never stop the accept loop

mod admission;
mod broadcast;
mod connection;

pub use admission::{admit, AdmissionError, AdmissionSettings, ADMISSION_TIMEOUT};
pub use broadcast::{close_writer, write_line, BroadcastReport, Broadcaster, RelayError, WRITE_TIMEOUT};
pub use connection::{ConnectionHandler, ExitReason};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use streamline_core::ConnectionId;
use streamline_protocol::Announcement;

use crate::config::ServerConfig;
use crate::registry::RegistryHandle;
use crate::transport::{split_stream, ParticipantWriter, TransportError, TransportProvider};

/// How long shutdown waits for connection tasks to finish
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// State shared by every connection task.
struct Shared {
    transport: TransportProvider,
    registry: RegistryHandle,
    broadcaster: Broadcaster,
    admission: AdmissionSettings,
    workers: Arc<Semaphore>,
    cancel_token: CancellationToken,
}

/// TCP relay server.
///
/// Binding happens in [`ChatServer::bind`], so the caller learns the actual
/// address (and any bind error) before the server starts running.
pub struct ChatServer {
    listener: TcpListener,
    shared: Arc<Shared>,
    tracker: TaskTracker,
    next_connection: AtomicU64,
}

impl ChatServer {
    /// Binds the listening socket.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved server configuration
    /// * `transport` - Plain or TLS stream provider
    /// * `registry` - Handle to the participant registry
    /// * `cancel_token` - Token for graceful shutdown
    pub async fn bind(
        config: &ServerConfig,
        transport: TransportProvider,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServerError::Bind {
                address: address.clone(),
                error: e.to_string(),
            })?;

        let shared = Shared {
            transport,
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            admission: AdmissionSettings::from_config(config),
            workers: Arc::new(Semaphore::new(config.max_workers)),
            cancel_token,
        };

        Ok(Self {
            listener,
            shared: Arc::new(shared),
            tracker: TaskTracker::new(),
            next_connection: AtomicU64::new(1),
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::LocalAddr(e.to_string()))
    }

    /// Runs the server.
    ///
    /// Accepts connections until the cancellation token is triggered, then
    /// closes the listener, closes every registered connection, and waits
    /// (up to `SHUTDOWN_GRACE`) for connection tasks to finish.
    pub async fn run(self) -> Result<(), ServerError> {
        let ChatServer {
            listener,
            shared,
            tracker,
            next_connection,
        } = self;

        info!(
            address = ?listener.local_addr().ok(),
            secure = shared.transport.is_secure(),
            max_workers = shared.workers.available_permits(),
            password = shared.admission.password.is_some(),
            "Relay server listening"
        );

        loop {
            tokio::select! {
                _ = shared.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let connection =
                                ConnectionId::new(next_connection.fetch_add(1, Ordering::Relaxed));
                            debug!(connection = %connection, peer = %peer, "Accepted connection");
                            tracker.spawn(serve_connection(Arc::clone(&shared), stream, connection));
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
            }
        }

        drop(listener);
        shutdown(&shared, &tracker).await;
        Ok(())
    }
}

/// Closes every participant and drains connection tasks.
async fn shutdown(shared: &Shared, tracker: &TaskTracker) {
    let closed = shared.registry.close_all().await;
    let writers: Vec<ParticipantWriter> = closed.iter().map(|r| Arc::clone(&r.writer)).collect();
    if !close_writers(&writers, SHUTDOWN_GRACE).await {
        warn!(
            participants = writers.len(),
            "Connections still closing after grace period"
        );
    }

    tracker.close();
    if tokio::time::timeout(SHUTDOWN_GRACE, tracker.wait()).await.is_err() {
        warn!(
            remaining = tracker.len(),
            "Connection tasks still running after grace period"
        );
    }

    info!(closed = closed.len(), "Server shutdown complete");
}

/// Closes writers concurrently. Returns `false` if `grace` ran out first.
async fn close_writers(writers: &[ParticipantWriter], grace: Duration) -> bool {
    let close = join_all(writers.iter().map(close_writer));
    tokio::time::timeout(grace, close).await.is_ok()
}

/// Everything that happens to one accepted connection.
async fn serve_connection(shared: Arc<Shared>, stream: TcpStream, connection: ConnectionId) {
    let stream = match shared.transport.establish(stream).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(connection = %connection, error = %e, "Transport setup failed");
            return;
        }
    };
    let (mut reader, writer) = split_stream(stream);
    let close_token = CancellationToken::new();

    let admitted = tokio::select! {
        _ = shared.cancel_token.cancelled() => None,
        result = admit(
            connection,
            &mut reader,
            &writer,
            close_token.clone(),
            &shared.registry,
            &shared.admission,
        ) => match result {
            Ok(participant) => Some(participant),
            Err(e) => {
                info!(connection = %connection, error = %e, "Admission failed");
                None
            }
        },
    };

    let Some(participant) = admitted else {
        close_writer(&writer).await;
        return;
    };

    shared
        .broadcaster
        .broadcast(
            Announcement::Joined(participant.nickname.clone()),
            Some(connection),
        )
        .await;

    // Registered participants already receive broadcasts while waiting here.
    let permit = tokio::select! {
        _ = close_token.cancelled() => None,
        permit = Arc::clone(&shared.workers).acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        shared.broadcaster.evict(connection).await;
        close_writer(&writer).await;
        return;
    };

    ConnectionHandler::new(
        participant,
        reader,
        writer,
        close_token,
        shared.broadcaster.clone(),
    )
    .run()
    .await;
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {error}")]
    Bind { address: String, error: String },

    #[error("Failed to read listener address: {0}")]
    LocalAddr(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
