//! Nicknames and the policy that admits them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum nickname length in characters.
pub const MAX_NICKNAME_LENGTH: usize = 32;

/// A validated participant nickname.
///
/// Comparison is exact and case-sensitive: `alice` and `Alice` are
/// different nicknames. Construct through [`NicknamePolicy::validate`] to
/// get a checked value; [`Nickname::new_unchecked`] exists for tests and for
/// values that already came out of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nickname(String);

impl Nickname {
    /// Wraps a string without running the policy.
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reasons a proposed nickname is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NicknameError {
    #[error("nickname cannot be empty")]
    Empty,

    #[error("nickname is too long ({len} characters, max: {max})")]
    TooLong { len: usize, max: usize },

    #[error("nickname should contain only letters and numbers")]
    NotAlphanumeric,

    #[error("nickname contains control characters")]
    ControlCharacter,
}

/// Rules applied to a proposed nickname before registration.
///
/// Uniqueness is not part of the policy; only the registry can decide that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NicknamePolicy {
    /// Reject anything that is not a letter or a digit.
    pub require_alphanumeric: bool,

    /// Maximum length in characters.
    pub max_length: usize,
}

impl Default for NicknamePolicy {
    fn default() -> Self {
        Self {
            require_alphanumeric: true,
            max_length: MAX_NICKNAME_LENGTH,
        }
    }
}

impl NicknamePolicy {
    /// Permissive policy: any non-empty name without control characters.
    pub fn permissive() -> Self {
        Self {
            require_alphanumeric: false,
            ..Self::default()
        }
    }

    /// Validates a raw nickname.
    ///
    /// Surrounding whitespace is trimmed first, so `"  bob \r"` is `bob`.
    pub fn validate(&self, raw: &str) -> Result<Nickname, NicknameError> {
        let name = raw.trim();

        if name.is_empty() {
            return Err(NicknameError::Empty);
        }

        let len = name.chars().count();
        if len > self.max_length {
            return Err(NicknameError::TooLong {
                len,
                max: self.max_length,
            });
        }

        if name.chars().any(char::is_control) {
            return Err(NicknameError::ControlCharacter);
        }

        if self.require_alphanumeric && !name.chars().all(char::is_alphanumeric) {
            return Err(NicknameError::NotAlphanumeric);
        }

        Ok(Nickname(name.to_string()))
    }
}
