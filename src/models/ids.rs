//! Player identities issued by the realtime backend.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable unique identifier of a player on the realtime backend.
///
/// Ordering is plain lexicographic comparison of the underlying string,
/// which the ranking pass relies on as its final tie-break.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebcomId(String);

impl WebcomId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WebcomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for WebcomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebcomId({})", self.0)
    }
}

impl From<String> for WebcomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WebcomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for WebcomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
