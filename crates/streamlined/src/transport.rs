//! Transport provider: plain TCP or TLS.
//!
//! The relay core never looks at how bytes are protected. It receives a
//! [`BoxedStream`] from the provider and splits it into a framed reader and
//! a shared writer. TLS is opt-in through configuration; a provider built
//! from a TLS section either works or fails at startup, it never falls back
//! to plaintext.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{BufWriter, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::info;

use streamline_core::TlsConfig;
use streamline_protocol::{load_certificates, load_private_key, split_lines, LineReader, PemError};

pub use streamline_protocol::{AsyncStream, BoxedStream};

/// TLS handshake timeout
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Line-framed read half of a connection.
pub type ConnectionReader = LineReader;

/// Shared write half of a connection.
///
/// The registry, the broadcaster and the connection's own handler all hold
/// clones; the mutex keeps every line written atomically.
pub type ParticipantWriter = Arc<Mutex<BufWriter<WriteHalf<BoxedStream>>>>;

/// Splits a stream into its line reader and shared writer.
pub fn split_stream(stream: BoxedStream) -> (ConnectionReader, ParticipantWriter) {
    let (reader, writer) = split_lines(stream);
    (reader, Arc::new(Mutex::new(BufWriter::new(writer))))
}

/// Wraps accepted TCP streams.
#[derive(Clone)]
pub enum TransportProvider {
    /// Plaintext TCP
    Plain,

    /// TLS terminated by the server
    Tls(TlsAcceptor),
}

impl TransportProvider {
    /// Builds the provider described by the configuration.
    pub fn from_config(tls: Option<&TlsConfig>) -> Result<Self, TransportError> {
        match tls {
            None => Ok(TransportProvider::Plain),
            Some(tls) => {
                let acceptor = load_tls_acceptor(tls)?;
                info!(cert = %tls.cert_path.display(), "TLS enabled");
                Ok(TransportProvider::Tls(acceptor))
            }
        }
    }

    /// Whether connections are encrypted.
    pub fn is_secure(&self) -> bool {
        matches!(self, TransportProvider::Tls(_))
    }

    /// Turns an accepted TCP stream into a relay stream.
    ///
    /// For TLS this performs the server handshake; a failed or slow
    /// handshake fails this connection only.
    pub async fn establish(&self, stream: TcpStream) -> Result<BoxedStream, TransportError> {
        // Relay lines are small; do not batch them.
        let _ = stream.set_nodelay(true);

        match self {
            TransportProvider::Plain => Ok(Box::new(stream)),
            TransportProvider::Tls(acceptor) => {
                match timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                    Ok(Ok(tls_stream)) => Ok(Box::new(tls_stream)),
                    Ok(Err(e)) => Err(TransportError::Handshake(e.to_string())),
                    Err(_) => Err(TransportError::Handshake("timed out".to_string())),
                }
            }
        }
    }
}

/// Builds a TLS acceptor from PEM certificate chain and private key files.
pub fn load_tls_acceptor(config: &TlsConfig) -> Result<TlsAcceptor, TransportError> {
    let certs = load_certificates(&config.cert_path)?;
    let key = load_private_key(&config.key_path)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Pem(#[from] PemError),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::path::PathBuf;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_plain_provider_is_not_secure() {
        let provider = TransportProvider::from_config(None).unwrap();
        assert!(!provider.is_secure());
    }

    #[test]
    fn test_missing_certificate_fails_loudly() {
        let tls = TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        };
        let err = TransportProvider::from_config(Some(&tls)).err().unwrap();
        assert!(matches!(err, TransportError::Pem(PemError::Certificate { .. })));
    }

    #[tokio::test]
    async fn test_split_stream_frames_lines() {
        let (server_side, mut peer) = tokio::io::duplex(1024);
        let (mut reader, writer) = split_stream(Box::new(server_side));

        peer.write_all(b"first\r\nsecond\n").await.unwrap();
        assert_eq!(reader.next().await.unwrap().unwrap(), "first");
        assert_eq!(reader.next().await.unwrap().unwrap(), "second");

        {
            let mut w = writer.lock().await;
            w.write_all(b"out\n").await.unwrap();
            w.flush().await.unwrap();
        }
        let mut buf = [0u8; 4];
        tokio::io::AsyncReadExt::read_exact(&mut peer, &mut buf).await.unwrap();
        assert_eq!(&buf, b"out\n");
    }
}
