//! Shared type definitions for the rover fleet simulator.
//!
//! Every crate in the workspace speaks in these types, and they flow to
//! `TypeScript` via `ts-rs` for browser clients of the telemetry stream.
//!
//! # Modules
//!
//! - [`ids`] -- Session and rover identifiers
//! - [`enums`] -- Driving direction and rover status
//! - [`structs`] -- Snapshots, sensor values, telemetry readings, and the
//!   stream envelope

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{Direction, ParseDirectionError, RoverStatus};
pub use ids::{RoverId, SessionId};
pub use structs::{Coordinates, RoverSnapshot, SensorValues, StreamMessage, TelemetryReading};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::RoverId::export_all();
        let _ = crate::enums::Direction::export_all();
        let _ = crate::structs::Coordinates::export_all();
        let _ = crate::structs::RoverSnapshot::export_all();
        let _ = crate::structs::SensorValues::export_all();
        let _ = crate::structs::TelemetryReading::export_all();
        let _ = crate::structs::StreamMessage::export_all();
    }
}
