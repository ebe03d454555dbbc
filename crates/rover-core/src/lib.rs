//! Fleet state, rover motion, and telemetry fan-out for the rover simulator.
//!
//! Each session owns a small fleet of rovers and a broadcaster. Rovers move
//! on their own background loops; a telemetry generator samples every rover
//! on a fixed interval and fans the readings out to the session's
//! subscribers, keeping a bounded replay history for late joiners.
//!
//! # Modules
//!
//! - [`broadcaster`] -- Per-session [`SessionBroadcaster`] with replay
//!   history, and the [`BroadcastHub`] that maps sessions to broadcasters.
//! - [`config`] -- Configuration loading from `fleet-config.yaml`.
//! - [`error`] -- [`FleetError`] returned by lookups and commands.
//! - [`history`] -- Fixed-capacity FIFO of recent readings.
//! - [`registry`] -- Session-scoped [`FleetRegistry`].
//! - [`rover`] -- The [`Rover`] actor and its generation-guarded motion loop.
//! - [`sensors`] -- [`SensorSource`] trait and its implementations.
//! - [`session`] -- [`SessionManager`], the lifecycle owner and command surface.
//! - [`telemetry`] -- The periodic [`TelemetryGenerator`].
//!
//! [`SessionBroadcaster`]: broadcaster::SessionBroadcaster
//! [`BroadcastHub`]: broadcaster::BroadcastHub
//! [`FleetError`]: error::FleetError
//! [`FleetRegistry`]: registry::FleetRegistry
//! [`Rover`]: rover::Rover
//! [`SensorSource`]: sensors::SensorSource
//! [`SessionManager`]: session::SessionManager
//! [`TelemetryGenerator`]: telemetry::TelemetryGenerator

pub mod broadcaster;
pub mod config;
pub mod error;
pub mod history;
pub mod registry;
pub mod rover;
pub mod sensors;
pub mod session;
pub mod telemetry;

pub use error::{FleetError, Result};
pub use session::SessionManager;
