//! Shared helpers for integration tests: a loopback server and a raw
//! line-based client.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use streamline_protocol::NICK_REQUEST;
use streamlined::config::ServerConfig;
use streamlined::registry::{spawn_registry, RegistryHandle};
use streamlined::server::ChatServer;
use streamlined::transport::TransportProvider;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any single expected line
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long "nothing arrives" is observed
pub const SILENCE: Duration = Duration::from_millis(150);

/// Interval between registry polls
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Time for a join announcement to go out before the next join
const JOIN_SETTLE: Duration = Duration::from_millis(20);

// ============================================================================
// Test Server
// ============================================================================

/// A relay server on 127.0.0.1 with an OS-assigned port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: RegistryHandle,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(ServerConfig::default()).await
    }

    pub async fn spawn_with_password(password: &str) -> Self {
        Self::spawn_with(ServerConfig {
            password: Some(password.to_string()),
            ..ServerConfig::default()
        })
        .await
    }

    pub async fn spawn_with(config: ServerConfig) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..config
        };
        let registry = spawn_registry();
        let cancel_token = CancellationToken::new();

        let server = ChatServer::bind(
            &config,
            TransportProvider::Plain,
            registry.clone(),
            cancel_token.clone(),
        )
        .await
        .expect("bind test server");
        let addr = server.local_addr().expect("local addr");

        let task = tokio::spawn(async move {
            let _ = server.run().await;
        });

        TestServer {
            addr,
            registry,
            cancel_token,
            task,
        }
    }

    /// Opens a raw connection (no admission performed).
    pub async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.expect("connect to server");
        TestClient::new(stream)
    }

    /// Connects and completes admission as `nickname` (no password).
    ///
    /// Returns once the registry lists the nickname and its join
    /// announcement has had time to go out, so consecutive joins are seen
    /// in order.
    pub async fn join(&self, nickname: &str) -> TestClient {
        let mut client = self.connect().await;
        client.expect(NICK_REQUEST).await;
        client.send(nickname).await;
        self.wait_for_member(nickname).await;
        sleep(JOIN_SETTLE).await;
        client
    }

    /// Polls the registry until `nickname` is present.
    pub async fn wait_for_member(&self, nickname: &str) {
        timeout(RECV_TIMEOUT, async {
            while !self.nicknames().await.iter().any(|n| n == nickname) {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .expect("participant never registered");
    }

    /// Polls the registry until `nickname` is gone.
    pub async fn wait_for_departure(&self, nickname: &str) {
        timeout(RECV_TIMEOUT, async {
            while self.nicknames().await.iter().any(|n| n == nickname) {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .expect("participant never removed");
    }

    /// Registered nicknames, in connection order.
    pub async fn nicknames(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .await
            .into_iter()
            .map(|r| r.participant.nickname.as_str().to_string())
            .collect()
    }

    /// Cancels the server and waits for `run` to return.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        timeout(Duration::from_secs(10), self.task)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
    }
}

// ============================================================================
// Test Client
// ============================================================================

/// Raw line client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Sends one line.
    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\n").as_bytes()).await;
    }

    pub async fn send_raw(&mut self, data: &[u8]) {
        self.writer.write_all(data).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Next line without its delimiter, `None` on EOF.
    pub async fn recv(&mut self) -> Option<String> {
        timeout(RECV_TIMEOUT, self.recv_line())
            .await
            .expect("timed out waiting for a line")
    }

    /// Like `recv`, but a timeout yields `None` instead of failing.
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        timeout(duration, self.recv_line()).await.ok().flatten()
    }

    async fn recv_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    /// Asserts the next line equals `expected`.
    pub async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await.as_deref(), Some(expected));
    }

    /// Asserts nothing arrives for a short while.
    pub async fn expect_silence(&mut self) {
        let got = self.recv_timeout(SILENCE).await;
        assert!(got.is_none(), "unexpected line: {got:?}");
    }

    /// Asserts the server closes the connection.
    pub async fn expect_closed(&mut self) {
        assert_eq!(self.recv().await, None, "connection should be closed");
    }
}
