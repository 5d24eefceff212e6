//! Admission pipeline: password check, nickname negotiation, registration.
//!
//! ```text
//! Connected ──▶ PasswordPending ──▶ NickPending ──▶ Active
//!     │         (if configured)          │
//!     └──────────────┴───────────────────┴──────▶ Rejected
//! ```
//!
//! A rejected connection is told why with a `... Disconnecting.` line and is
//! never registered. I/O errors, EOF and the admission timeout reject
//! silently.

use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use streamline_core::{ConnectionId, Nickname, NicknameError, NicknamePolicy, Participant};
use streamline_protocol::{Rejection, NICK_REQUEST, PASSWORD_ACCEPTED, PASSWORD_PROMPT};

use super::broadcast::{write_line, WRITE_TIMEOUT};
use crate::config::ServerConfig;
use crate::registry::{RegistryError, RegistryHandle};
use crate::transport::{ConnectionReader, ParticipantWriter};

/// Time allowed for a client to get through password and nickname (60 seconds)
pub const ADMISSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Admission rules, derived once from the server configuration.
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    pub password: Option<String>,
    pub policy: NicknamePolicy,
    pub timeout: Duration,
}

impl AdmissionSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            password: config.password.clone(),
            policy: config.nickname_policy(),
            timeout: ADMISSION_TIMEOUT,
        }
    }
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            password: None,
            policy: NicknamePolicy::default(),
            timeout: ADMISSION_TIMEOUT,
        }
    }
}

/// Runs admission for one connection and registers it on success.
///
/// `close_token` is handed to the registry so the participant can later be
/// closed from outside. Nothing is registered unless this returns `Ok`.
pub async fn admit(
    connection: ConnectionId,
    reader: &mut ConnectionReader,
    writer: &ParticipantWriter,
    close_token: CancellationToken,
    registry: &RegistryHandle,
    settings: &AdmissionSettings,
) -> Result<Participant, AdmissionError> {
    // Registration stays outside the timeout so a late timer can never
    // abandon an add that the registry already applied.
    let nickname = tokio::time::timeout(settings.timeout, negotiate(reader, writer, settings))
        .await
        .map_err(|_| AdmissionError::Timeout)??;

    let participant = Participant::new(connection, nickname);
    match registry
        .add(participant.clone(), writer.clone(), close_token)
        .await
    {
        Ok(()) => {
            info!(
                connection = %connection,
                nickname = %participant.nickname,
                "Participant admitted"
            );
            Ok(participant)
        }
        Err(RegistryError::DuplicateNickname(nickname)) => {
            reject(writer, Rejection::NicknameTaken).await;
            Err(AdmissionError::NicknameTaken(nickname))
        }
        Err(e) => Err(AdmissionError::Registry(e)),
    }
}

/// Password stage (if configured) followed by the nickname stage.
async fn negotiate(
    reader: &mut ConnectionReader,
    writer: &ParticipantWriter,
    settings: &AdmissionSettings,
) -> Result<Nickname, AdmissionError> {
    if let Some(expected) = &settings.password {
        send(writer, PASSWORD_PROMPT).await?;
        let supplied = read_line(reader).await?;

        if supplied != *expected {
            reject(writer, Rejection::InvalidPassword).await;
            return Err(AdmissionError::InvalidPassword);
        }
        send(writer, PASSWORD_ACCEPTED).await?;
    }

    send(writer, NICK_REQUEST).await?;
    let requested = read_line(reader).await?;

    match settings.policy.validate(&requested) {
        Ok(nickname) => Ok(nickname),
        Err(e) => {
            debug!(requested = %requested, error = %e, "Nickname rejected");
            reject(writer, Rejection::InvalidNickname(e.clone())).await;
            Err(AdmissionError::InvalidNickname(e))
        }
    }
}

async fn send(writer: &ParticipantWriter, line: &str) -> Result<(), AdmissionError> {
    write_line(writer, line, WRITE_TIMEOUT)
        .await
        .map_err(|e| AdmissionError::Io(e.to_string()))
}

/// Best effort: the connection is closed right after either way.
async fn reject(writer: &ParticipantWriter, rejection: Rejection) {
    if let Err(e) = write_line(writer, rejection.as_wire(), WRITE_TIMEOUT).await {
        debug!(error = %e, "Could not deliver rejection");
    }
}

async fn read_line(reader: &mut ConnectionReader) -> Result<String, AdmissionError> {
    match reader.next().await {
        Some(Ok(line)) => Ok(line),
        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(AdmissionError::LineTooLong),
        Some(Err(LinesCodecError::Io(e))) => Err(AdmissionError::Io(e.to_string())),
        None => Err(AdmissionError::Eof),
    }
}

/// Why a connection did not become a participant.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Nickname already in use: {0}")]
    NicknameTaken(Nickname),

    #[error("Invalid nickname: {0}")]
    InvalidNickname(NicknameError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed during admission")]
    Eof,

    #[error("Admission timed out")]
    Timeout,

    #[error("Line too long")]
    LineTooLong,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
