use std::cell::Cell;

use serde::{Deserialize, Serialize};

/// A stable identifier for one owner.
/// Assigned lazily on first record, immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Mints monotonically increasing ids, unique within one session.
#[derive(Debug)]
pub struct TrackIdSource {
    next: Cell<u64>,
}

impl TrackIdSource {
    pub fn new() -> Self {
        Self { next: Cell::new(1) }
    }

    pub fn mint(&self) -> TrackId {
        let n = self.next.get();
        self.next.set(n + 1);
        TrackId(n.to_string())
    }
}

impl Default for TrackIdSource {
    fn default() -> Self {
        Self::new()
    }
}
