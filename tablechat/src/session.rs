//! Browser-session equivalent: an opaque id scoping server-side agent
//! memory, plus the convenience snapshot of the raw connection text.

use std::sync::Mutex;
use uuid::Uuid;

/// Opaque token scoping server-side conversational memory.
///
/// Both analyst agents receive the same id so each remote thread stays
/// consistent for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ephemeral per-session state. Nothing here survives the process.
pub struct Session {
    id: SessionId,
    /// Raw connection text the user last submitted, kept only so a reconnect
    /// dialog can be pre-filled
    raw_connection_text: Mutex<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            raw_connection_text: Mutex::new(None),
        }
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            raw_connection_text: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn remember_connection_text(&self, text: impl Into<String>) {
        *self.raw_connection_text.lock().unwrap() = Some(text.into());
    }

    pub fn connection_text(&self) -> Option<String> {
        self.raw_connection_text.lock().unwrap().clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
