//! Relay connection for the StreamLine client.
//!
//! This module provides the [`Session`] which handles:
//! - Connecting over plain TCP or TLS
//! - The admission handshake (password, then nickname)
//! - Relaying stdin lines to the server and server lines to the terminal
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use futures::StreamExt;
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_util::codec::LinesCodecError;
use tracing::{debug, info, warn};

use streamline_protocol::{
    load_certificates, split_lines, BoxedStream, LineReader, ServerLine, PASSWORD_ACCEPTED,
};

use crate::error::{ClientError, Result};
use crate::settings::ClientSettings;
use crate::ui::{Printer, SemanticColor};

/// Typed by the user to leave.
pub const EXIT_COMMAND: &str = "/exit";

/// Lines buffered between the stdin thread and the session.
const INPUT_BUFFER: usize = 64;

// ============================================================================
// Connecting
// ============================================================================

/// Opens the connection described by `settings`.
///
/// With a CA configured the stream is TLS and the server certificate must
/// chain to that CA; there is no plaintext fallback.
pub async fn connect(settings: &ClientSettings) -> Result<BoxedStream> {
    let address = settings.address();
    let stream = TcpStream::connect(&address)
        .await
        .map_err(|e| ClientError::Connection {
            address: address.clone(),
            error: e.to_string(),
        })?;
    let _ = stream.set_nodelay(true);

    let Some(ca) = settings.tls_ca.as_deref() else {
        debug!(address = %address, "Connected (plain)");
        return Ok(Box::new(stream));
    };

    let connector = tls_connector(ca)?;
    let server_name = ServerName::try_from(settings.host.clone())
        .map_err(|e| ClientError::Tls(format!("invalid server name {}: {e}", settings.host)))?;
    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(|e| ClientError::Tls(e.to_string()))?;

    debug!(address = %address, "Connected (TLS)");
    Ok(Box::new(tls_stream))
}

fn tls_connector(ca: &Path) -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    for cert in load_certificates(ca)? {
        roots
            .add(cert)
            .map_err(|e| ClientError::Tls(e.to_string()))?;
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

// ============================================================================
// Session
// ============================================================================

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// `/exit` or end of input.
    UserExit,

    /// The server closed the connection.
    ServerClosed,

    /// The server refused the nickname after the handshake.
    Rejected(String),
}

/// One connection to a relay server.
pub struct Session {
    reader: LineReader,
    writer: WriteHalf<BoxedStream>,
}

impl Session {
    pub fn new(stream: BoxedStream) -> Self {
        let (reader, writer) = split_lines(stream);
        Self { reader, writer }
    }

    /// Answers the server's admission prompts.
    ///
    /// Returns once the nickname has been sent. A nickname rejection
    /// arrives afterwards and is reported by [`Session::run`].
    pub async fn handshake<W: Write>(
        &mut self,
        settings: &ClientSettings,
        printer: &mut Printer<W>,
    ) -> Result<()> {
        loop {
            let line = match self.reader.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(read_error(e)),
                None => return Err(ClientError::HandshakeClosed),
            };

            match ServerLine::parse(&line) {
                ServerLine::PasswordPrompt => {
                    let password = settings.password.as_deref().unwrap_or_default();
                    self.send(password).await?;
                }
                ServerLine::PasswordAccepted => {
                    printer.status(PASSWORD_ACCEPTED, SemanticColor::Success)?;
                }
                ServerLine::NickRequest => {
                    self.send(settings.nickname.as_str()).await?;
                    info!(nickname = %settings.nickname, "Nickname sent");
                    return Ok(());
                }
                ServerLine::Rejected(reason) => return Err(ClientError::Rejected(reason)),
                other => printer.server_line(&other)?,
            }
        }
    }

    /// Relays until the user leaves or the server goes away.
    pub async fn run<W: Write>(
        mut self,
        mut input: mpsc::Receiver<String>,
        printer: &mut Printer<W>,
    ) -> Result<SessionEnd> {
        loop {
            tokio::select! {
                incoming = self.reader.next() => match incoming {
                    Some(Ok(line)) => {
                        let line = ServerLine::parse(&line);
                        printer.server_line(&line)?;
                        if let ServerLine::Rejected(reason) = line {
                            return Ok(SessionEnd::Rejected(reason));
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Read from server failed");
                        printer.status("Connection closed.", SemanticColor::Error)?;
                        return Ok(SessionEnd::ServerClosed);
                    }
                    None => {
                        printer.status("Connection closed.", SemanticColor::Error)?;
                        return Ok(SessionEnd::ServerClosed);
                    }
                },

                typed = input.recv() => match typed {
                    Some(text) if text.trim().eq_ignore_ascii_case(EXIT_COMMAND) => {
                        printer.status("Disconnecting...", SemanticColor::Error)?;
                        self.close().await;
                        return Ok(SessionEnd::UserExit);
                    }
                    Some(text) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        if let Err(e) = self.send(&text).await {
                            warn!(error = %e, "Write to server failed");
                            printer.status("Connection closed.", SemanticColor::Error)?;
                            return Ok(SessionEnd::ServerClosed);
                        }
                    }
                    None => {
                        debug!("Input closed");
                        self.close().await;
                        return Ok(SessionEnd::UserExit);
                    }
                },
            }
        }
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(error = %e, "Shutdown of write half failed");
        }
    }
}

fn read_error(error: LinesCodecError) -> ClientError {
    match error {
        LinesCodecError::Io(e) => ClientError::Io(e),
        LinesCodecError::MaxLineLengthExceeded => ClientError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "line from server too long",
        )),
    }
}

// ============================================================================
// Terminal input
// ============================================================================

/// Forwards stdin lines to a channel from a dedicated thread.
///
/// Blocking stdin reads stay off the runtime, so the session can end while
/// a read is pending. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (sender, receiver) = mpsc::channel(INPUT_BUFFER);
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.blocking_send(line).is_err() {
                    break;
                }
            }
        });

    if let Err(e) = spawned {
        // The receiver sees a closed channel and the session ends as on EOF.
        warn!(error = %e, "Failed to start stdin reader");
    }
    receiver
}
