use chrono::{DateTime, Utc};

/// Published authentication state.
///
/// Only the orchestrator writes it. Everything else reads a snapshot or
/// subscribes to changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    authenticated: bool,
    unlocked_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub(crate) fn unlocked(at: DateTime<Utc>) -> Self {
        Self {
            authenticated: true,
            unlocked_at: Some(at),
        }
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        self.unlocked_at
    }
}
