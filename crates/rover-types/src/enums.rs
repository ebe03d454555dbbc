//! Enumeration types for rover activity.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Returned when a direction string is not one of the four known headings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid direction: {0:?} (expected forward, backward, left or right)")]
pub struct ParseDirectionError(pub String);

/// A heading a rover can drive in.
///
/// Each direction maps to a unit step on the integer grid; see
/// [`Direction::delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// `+y`
    Forward,
    /// `-y`
    Backward,
    /// `-x`
    Left,
    /// `+x`
    Right,
}

impl Direction {
    /// All directions, in declaration order.
    pub const ALL: [Self; 4] = [Self::Forward, Self::Backward, Self::Left, Self::Right];

    /// Unit `(dx, dy)` applied to a rover's coordinates per motion tick.
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::Forward => (0, 1),
            Self::Backward => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Lowercase wire name of the direction.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseDirectionError(s.to_owned()))
    }
}

/// What a rover is currently doing.
///
/// On the wire this renders as `"idle"` or `"Moving <direction>"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoverStatus {
    /// Parked at its current coordinates.
    #[default]
    Idle,
    /// Driving in the given direction, one step per motion tick.
    Moving(Direction),
}

impl RoverStatus {
    /// Whether the rover is currently driving.
    pub const fn is_moving(self) -> bool {
        matches!(self, Self::Moving(_))
    }
}

impl core::fmt::Display for RoverStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Moving(direction) => write!(f, "Moving {direction}"),
        }
    }
}

impl From<RoverStatus> for String {
    fn from(status: RoverStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for RoverStatus {
    type Error = ParseDirectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "idle" {
            return Ok(Self::Idle);
        }
        value
            .strip_prefix("Moving ")
            .ok_or_else(|| ParseDirectionError(value.clone()))?
            .parse()
            .map(Self::Moving)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_directions() {
        assert_eq!("forward".parse::<Direction>().ok(), Some(Direction::Forward));
        assert_eq!("LEFT".parse::<Direction>().ok(), Some(Direction::Left));
        assert_eq!(" right ".parse::<Direction>().ok(), Some(Direction::Right));
    }

    #[test]
    fn parse_unknown_direction_fails() {
        let err = "up".parse::<Direction>().err();
        assert_eq!(err, Some(ParseDirectionError(String::from("up"))));
    }

    #[test]
    fn deltas_are_unit_steps() {
        assert_eq!(Direction::Forward.delta(), (0, 1));
        assert_eq!(Direction::Backward.delta(), (0, -1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }

    #[test]
    fn status_wire_format() {
        let idle = serde_json::to_string(&RoverStatus::Idle).ok();
        assert_eq!(idle.as_deref(), Some("\"idle\""));
        let moving = serde_json::to_string(&RoverStatus::Moving(Direction::Left)).ok();
        assert_eq!(moving.as_deref(), Some("\"Moving left\""));
    }

    #[test]
    fn status_parses_back() {
        let status: Result<RoverStatus, _> = serde_json::from_str("\"Moving backward\"");
        assert_eq!(status.ok(), Some(RoverStatus::Moving(Direction::Backward)));
        let bogus: Result<RoverStatus, _> = serde_json::from_str("\"Moving up\"");
        assert!(bogus.is_err());
    }
}
