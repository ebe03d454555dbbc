//! Core record types: rover snapshots, sensor values, and the telemetry
//! stream envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Direction, RoverStatus};
use crate::ids::RoverId;

/// Integer grid position of a rover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// East-west axis; `right` increases it.
    pub x: i64,
    /// North-south axis; `forward` increases it.
    pub y: i64,
}

impl Coordinates {
    /// The origin `(0, 0)`, where every rover starts and resets to.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a coordinate pair.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Return the position one unit step in `direction` from here.
    ///
    /// Saturates at the edges of the `i64` range instead of wrapping.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Point-in-time copy of one rover's state.
///
/// Produced under the rover's lock so status, battery, and coordinates
/// always come from the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoverSnapshot {
    /// The rover's name within its session.
    pub rover_id: RoverId,
    /// Current activity.
    #[ts(type = "string")]
    pub status: RoverStatus,
    /// Battery charge in percent (0-100).
    pub battery: u8,
    /// Current grid position.
    pub coordinates: Coordinates,
}

/// One set of synthetic sensor values.
///
/// Produced by a sensor source; the engine treats the contents as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SensorValues {
    /// Volumetric soil moisture in percent.
    pub soil_moisture: f64,
    /// Soil acidity.
    #[serde(rename = "soil_pH")]
    pub soil_ph: f64,
    /// Ambient temperature in degrees Celsius.
    pub temperature: f64,
    /// Battery level reported by the sensor package.
    pub battery_level: f64,
    /// Uncorrelated noise channel.
    pub random_value: f64,
}

/// A telemetry record for one rover at one instant.
///
/// These are the entries kept in a session's history buffer and pushed to
/// subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TelemetryReading {
    /// The rover that produced the reading.
    pub rover_id: RoverId,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// Rover activity at the time of the reading.
    #[ts(type = "string")]
    pub status: RoverStatus,
    /// Rover position at the time of the reading.
    pub coordinates: Coordinates,
    /// Sensor values, flattened into the record on the wire.
    #[serde(flatten)]
    pub sensors: SensorValues,
}

/// Envelope for every message sent to a telemetry subscriber.
///
/// Serialized as `{"type": "history" | "update", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum StreamMessage {
    /// The session's retained readings, oldest first. Sent exactly once,
    /// before any update.
    History(Vec<TelemetryReading>),
    /// A single live reading.
    Update(TelemetryReading),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> TelemetryReading {
        TelemetryReading {
            rover_id: RoverId::numbered(2),
            timestamp: Utc::now(),
            status: RoverStatus::Moving(Direction::Forward),
            coordinates: Coordinates::new(0, 3),
            sensors: SensorValues {
                soil_moisture: 41.5,
                soil_ph: 6.25,
                temperature: 22.0,
                battery_level: 87.0,
                random_value: 0.5,
            },
        }
    }

    #[test]
    fn step_applies_direction_delta() {
        let start = Coordinates::new(2, -1);
        assert_eq!(start.step(Direction::Forward), Coordinates::new(2, 0));
        assert_eq!(start.step(Direction::Left), Coordinates::new(1, -1));
    }

    #[test]
    fn step_saturates_at_range_edge() {
        let edge = Coordinates::new(i64::MAX, 0);
        assert_eq!(edge.step(Direction::Right), edge);
    }

    #[test]
    fn reading_flattens_sensor_fields() {
        let json = serde_json::to_value(sample_reading()).unwrap_or_default();
        assert_eq!(json["rover_id"], "Rover-2");
        assert_eq!(json["status"], "Moving forward");
        assert_eq!(json["coordinates"]["y"], 3);
        assert!(json["soil_pH"].is_number());
        assert!(json.get("sensors").is_none());
    }

    #[test]
    fn stream_message_is_tagged() {
        let update = serde_json::to_value(StreamMessage::Update(sample_reading()))
            .unwrap_or_default();
        assert_eq!(update["type"], "update");
        assert_eq!(update["payload"]["rover_id"], "Rover-2");

        let history = serde_json::to_value(StreamMessage::History(vec![sample_reading()]))
            .unwrap_or_default();
        assert_eq!(history["type"], "history");
        assert_eq!(history["payload"].as_array().map(Vec::len), Some(1));
    }
}
