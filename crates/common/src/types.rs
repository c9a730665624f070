//! Common data types for Session Gate components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a user account in the identity backend.
///
/// Opaque to the gate: the backend issues it, the gate only echoes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_transparent_in_json() {
        let id = UserId::from("f1d2c3");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"f1d2c3\"");

        let back: UserId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.as_str(), "f1d2c3");
        assert_eq!(back.to_string(), "f1d2c3");
    }
}
