//! Protocol message types for relay communication.
//!
//! Admission exchange (server lines on the left):
//!
//! ```text
//! Enter password: ──▶              (only when a password is configured)
//!             ◀── <password>
//! Password accepted. Welcome! ──▶  (or "Invalid password. Disconnecting." + close)
//! NICK ──▶
//!             ◀── <nickname>
//!                                  (rejections end in "Disconnecting." + close)
//! ```
//!
//! After admission every line from a participant is relayed to the others
//! as `<nickname>: <text>`, and membership changes are announced as
//! `<nickname> joined` / `<nickname> left`.

use std::fmt;

use streamline_core::{Nickname, NicknameError};

/// Sent when a password is configured, before anything else.
pub const PASSWORD_PROMPT: &str = "Enter password: ";

/// Sent after a correct password.
pub const PASSWORD_ACCEPTED: &str = "Password accepted. Welcome!";

/// Asks the client for its nickname.
pub const NICK_REQUEST: &str = "NICK";

/// Common suffix of every rejection line.
const DISCONNECTING_SUFFIX: &str = "Disconnecting.";

/// Why the server refused a connection during admission.
///
/// Every rejection is followed by the server closing the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Password did not match.
    InvalidPassword,

    /// Nickname is held by a live participant.
    NicknameTaken,

    /// Nickname failed the server's policy.
    InvalidNickname(NicknameError),
}

impl Rejection {
    /// The exact line sent to the client.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Rejection::InvalidPassword => "Invalid password. Disconnecting.",
            Rejection::NicknameTaken => "Nickname already in use. Disconnecting.",
            Rejection::InvalidNickname(NicknameError::Empty) => {
                "Nickname cannot be empty. Disconnecting."
            }
            Rejection::InvalidNickname(NicknameError::TooLong { .. }) => {
                "Nickname is too long. Disconnecting."
            }
            Rejection::InvalidNickname(NicknameError::NotAlphanumeric) => {
                "Nickname should contain only letters and numbers. Disconnecting."
            }
            Rejection::InvalidNickname(NicknameError::ControlCharacter) => {
                "Nickname contains invalid characters. Disconnecting."
            }
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Steady-state messages fanned out to participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A participant completed admission.
    Joined(Nickname),

    /// A participant disconnected or was evicted.
    Left(Nickname),

    /// A line relayed from a participant.
    Chat { nickname: Nickname, text: String },
}

impl Announcement {
    pub fn chat(nickname: Nickname, text: impl Into<String>) -> Self {
        Self::Chat {
            nickname,
            text: text.into(),
        }
    }

    /// Renders the announcement as a wire line (without the delimiter).
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Announcement::Joined(nickname) => write!(f, "{nickname} joined"),
            Announcement::Left(nickname) => write!(f, "{nickname} left"),
            Announcement::Chat { nickname, text } => write!(f, "{nickname}: {text}"),
        }
    }
}

/// A line received by a client, classified for display.
///
/// Classification is best effort: the wire carries plain text, so a chat
/// line whose sender chose a name with spaces may fall back to `Notice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    PasswordPrompt,
    PasswordAccepted,
    NickRequest,
    Rejected(String),
    Joined(String),
    Left(String),
    Chat { nickname: String, text: String },
    Notice(String),
}

impl ServerLine {
    /// Classifies one line (delimiter already removed).
    pub fn parse(line: &str) -> Self {
        // The prompt may arrive with or without its trailing space.
        if line == PASSWORD_PROMPT || line == PASSWORD_PROMPT.trim_end() {
            return ServerLine::PasswordPrompt;
        }
        if line == PASSWORD_ACCEPTED {
            return ServerLine::PasswordAccepted;
        }
        if line == NICK_REQUEST {
            return ServerLine::NickRequest;
        }
        if line.ends_with(DISCONNECTING_SUFFIX) {
            return ServerLine::Rejected(line.to_string());
        }

        if let Some((nickname, text)) = line.split_once(": ") {
            if is_single_word(nickname) {
                return ServerLine::Chat {
                    nickname: nickname.to_string(),
                    text: text.to_string(),
                };
            }
        }

        if let Some(nickname) = line.strip_suffix(" joined") {
            if is_single_word(nickname) {
                return ServerLine::Joined(nickname.to_string());
            }
        }
        if let Some(nickname) = line.strip_suffix(" left") {
            if is_single_word(nickname) {
                return ServerLine::Left(nickname.to_string());
            }
        }

        ServerLine::Notice(line.to_string())
    }
}

fn is_single_word(s: &str) -> bool {
    !s.is_empty() && !s.contains(char::is_whitespace)
}
