//! Sensor source trait and the default random implementation.
//!
//! The engine asks a [`SensorSource`] for one set of [`SensorValues`] per
//! rover per telemetry tick (and for on-demand readings). It never looks at
//! the values, so any implementation producing the right shape will do: the
//! random source below for running the simulator, or a fixed source in
//! tests.

use chrono::{DateTime, Utc};
use rand::Rng;
use rover_types::{RoverId, SensorValues};

/// A source of sensor values for a rover at an instant.
///
/// Implementations must be side-effect free from the engine's point of
/// view and cheap enough to call for every rover on every tick.
pub trait SensorSource: Send + Sync {
    /// Produce one set of sensor values.
    fn sample(&self, rover_id: &RoverId, timestamp: DateTime<Utc>) -> SensorValues;
}

/// Uniformly random sensor values in plausible field ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSensorSource;

impl RandomSensorSource {
    /// Create a new random sensor source.
    pub const fn new() -> Self {
        Self
    }
}

impl SensorSource for RandomSensorSource {
    fn sample(&self, _rover_id: &RoverId, _timestamp: DateTime<Utc>) -> SensorValues {
        let mut rng = rand::rng();
        SensorValues {
            soil_moisture: round2(rng.random_range(20.0..=80.0)),
            soil_ph: round2(rng.random_range(5.5..=7.5)),
            temperature: round2(rng.random_range(10.0..=40.0)),
            battery_level: round2(rng.random_range(10.0..=100.0)),
            random_value: round2(rng.random_range(0.0..=1.0)),
        }
    }
}

/// A source that always returns the same values. Useful for tests and
/// deterministic demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSensorSource(pub SensorValues);

impl SensorSource for FixedSensorSource {
    fn sample(&self, _rover_id: &RoverId, _timestamp: DateTime<Utc>) -> SensorValues {
        self.0
    }
}

/// Round to two decimal places.
#[allow(clippy::arithmetic_side_effects)]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_values_stay_in_range() {
        let source = RandomSensorSource::new();
        let rover = RoverId::numbered(1);
        for _ in 0..200 {
            let v = source.sample(&rover, Utc::now());
            assert!((20.0..=80.0).contains(&v.soil_moisture));
            assert!((5.5..=7.5).contains(&v.soil_ph));
            assert!((10.0..=40.0).contains(&v.temperature));
            assert!((10.0..=100.0).contains(&v.battery_level));
            assert!((0.0..=1.0).contains(&v.random_value));
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn round2_truncates_precision() {
        assert_eq!(round2(6.128), 6.13);
        assert_eq!(round2(20.0), 20.0);
    }
}
