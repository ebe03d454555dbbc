//! Type-safe identifiers for sessions and rovers.
//!
//! A [`SessionId`] is an opaque UUID token handed to clients when a session
//! starts. A [`RoverId`] is a short human-readable name (`Rover-1`,
//! `Rover-2`, ...) that is unique within one session only.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for an isolated fleet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Name of a rover within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoverId(String);

impl RoverId {
    /// Prefix shared by every generated rover name.
    pub const PREFIX: &'static str = "Rover-";

    /// Build the name of the `n`th rover in a fleet (`Rover-{n}`).
    pub fn numbered(n: u32) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    /// Borrow the rover name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoverId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoverId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for RoverId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn session_id_parses_its_display_form() {
        let id = SessionId::new();
        let parsed: Result<SessionId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn malformed_session_id_is_rejected() {
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn rover_names_are_numbered() {
        assert_eq!(RoverId::numbered(3).as_str(), "Rover-3");
        assert_eq!(RoverId::numbered(3), RoverId::from("Rover-3"));
    }

    #[test]
    fn rover_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoverId::numbered(1)).ok();
        assert_eq!(json.as_deref(), Some("\"Rover-1\""));
        let parsed = serde_json::from_str::<RoverId>("\"Rover-2\"").ok();
        assert_eq!(parsed, Some(RoverId::numbered(2)));
    }
}
