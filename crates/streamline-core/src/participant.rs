//! Admitted participants.

use serde::{Deserialize, Serialize};

use crate::{ConnectionId, Nickname};

/// A connection that completed admission.
///
/// The nickname is fixed for the participant's lifetime; there is no
/// rename operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub connection: ConnectionId,
    pub nickname: Nickname,
}

impl Participant {
    pub fn new(connection: ConnectionId, nickname: Nickname) -> Self {
        Self {
            connection,
            nickname,
        }
    }
}
