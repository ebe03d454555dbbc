//! Session lifecycle manager and the engine's command surface.
//!
//! [`SessionManager`] exclusively owns the [`FleetRegistry`] and the
//! [`BroadcastHub`], keyed by the same [`SessionId`]. Starting a session
//! creates an entry in both; tearing it down halts every rover and closes
//! every subscriber before both entries are dropped. All operations a
//! request layer needs (fleet snapshots, rover commands, subscriptions)
//! go through here.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rover_types::{
    Coordinates, Direction, RoverId, RoverSnapshot, SessionId, TelemetryReading,
};
use tracing::{debug, info};

use crate::broadcaster::{BroadcastHub, PublishReport, SubscriberId, Subscription};
use crate::config::{FleetConfig, FleetSection};
use crate::error::{FleetError, Result};
use crate::registry::FleetRegistry;
use crate::rover::Rover;
use crate::sensors::SensorSource;

/// What a teardown released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Rovers whose motion was invalidated.
    pub rovers_halted: usize,
    /// Subscribers that were detached.
    pub subscribers_detached: usize,
}

/// Owner of every live session.
pub struct SessionManager {
    registry: FleetRegistry,
    hub: BroadcastHub,
    fleet: FleetSection,
    motion_interval: Duration,
    sensors: Arc<dyn SensorSource>,
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("registry", &self.registry)
            .field("hub", &self.hub)
            .field("fleet", &self.fleet)
            .field("motion_interval", &self.motion_interval)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager with no sessions.
    pub fn new(config: &FleetConfig, sensors: Arc<dyn SensorSource>) -> Self {
        Self {
            registry: FleetRegistry::new(),
            hub: BroadcastHub::new(config.broadcast.clone()),
            fleet: config.fleet.clone(),
            motion_interval: config.timing.motion_interval(),
            sensors,
        }
    }

    /// The fleet registry.
    pub const fn registry(&self) -> &FleetRegistry {
        &self.registry
    }

    /// The broadcaster hub.
    pub const fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a new session with a default fleet and an empty broadcaster.
    pub async fn start_session(&self) -> SessionId {
        let session_id = self.registry.create(&self.fleet).await;
        let _ = self.hub.open(session_id).await;
        info!(
            %session_id,
            rovers = self.fleet.rovers_per_session,
            "Session started"
        );
        session_id
    }

    /// Tear a session down: halt its rovers, detach its subscribers, and
    /// drop both its registry and broadcaster entries.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn teardown(&self, session_id: SessionId) -> Result<TeardownReport> {
        let fleet = self
            .registry
            .remove(session_id)
            .await
            .ok_or(FleetError::SessionNotFound(session_id))?;
        fleet.halt_all().await;
        let subscribers_detached = self.hub.remove(session_id).await.unwrap_or(0);

        let report = TeardownReport {
            rovers_halted: fleet.rovers().len(),
            subscribers_detached,
        };
        info!(
            %session_id,
            rovers_halted = report.rovers_halted,
            subscribers_detached = report.subscribers_detached,
            "Session torn down"
        );
        Ok(report)
    }

    /// Point-in-time copy of the live session ids.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.registry.session_ids().await
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.len().await
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of every rover in a session, in fleet order.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn fleet_snapshot(&self, session_id: SessionId) -> Result<Vec<RoverSnapshot>> {
        self.registry.list_rovers(session_id).await
    }

    /// Snapshot of one rover.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or [`FleetError::RoverNotFound`].
    pub async fn rover_status(
        &self,
        session_id: SessionId,
        rover_id: &RoverId,
    ) -> Result<RoverSnapshot> {
        Ok(self.registry.rover(session_id, rover_id).await?.snapshot().await)
    }

    /// Battery charge of one rover.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or [`FleetError::RoverNotFound`].
    pub async fn rover_battery(&self, session_id: SessionId, rover_id: &RoverId) -> Result<u8> {
        Ok(self.registry.rover(session_id, rover_id).await?.battery().await)
    }

    /// Position of one rover.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or [`FleetError::RoverNotFound`].
    pub async fn rover_coordinates(
        &self,
        session_id: SessionId,
        rover_id: &RoverId,
    ) -> Result<Coordinates> {
        Ok(self
            .registry
            .rover(session_id, rover_id)
            .await?
            .coordinates()
            .await)
    }

    /// An on-demand telemetry reading for one rover.
    ///
    /// The reading is returned to the caller only; it is not published or
    /// added to history.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or [`FleetError::RoverNotFound`].
    pub async fn sensor_reading(
        &self,
        session_id: SessionId,
        rover_id: &RoverId,
    ) -> Result<TelemetryReading> {
        let rover = self.registry.rover(session_id, rover_id).await?;
        Ok(self.read_telemetry(&rover).await)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Start a rover driving in `direction`, superseding any motion already
    /// in progress.
    ///
    /// The direction is validated before any lookup or mutation.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidDirection`],
    /// [`FleetError::SessionNotFound`], or [`FleetError::RoverNotFound`].
    pub async fn move_rover(
        &self,
        session_id: SessionId,
        rover_id: &RoverId,
        direction: &str,
    ) -> Result<Direction> {
        let direction: Direction = direction.parse()?;
        let rover = self.registry.rover(session_id, rover_id).await?;
        let generation = rover.start_motion(direction, self.motion_interval).await;
        debug!(%session_id, %rover_id, %direction, generation, "Rover moving");
        Ok(direction)
    }

    /// Return a rover to idle at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or [`FleetError::RoverNotFound`].
    pub async fn reset_rover(&self, session_id: SessionId, rover_id: &RoverId) -> Result<()> {
        self.registry.rover(session_id, rover_id).await?.reset().await;
        debug!(%session_id, %rover_id, "Rover reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Telemetry stream
    // -----------------------------------------------------------------------

    /// Subscribe to a session's telemetry stream.
    ///
    /// The first message is always the session's history.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn subscribe(&self, session_id: SessionId) -> Result<Subscription> {
        self.hub.subscribe(session_id).await
    }

    /// Detach a subscriber. Returns whether it was still attached.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn unsubscribe(&self, session_id: SessionId, id: SubscriberId) -> Result<bool> {
        self.hub.unsubscribe(session_id, id).await
    }

    /// Publish a reading to a session's subscribers and history.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn publish(
        &self,
        session_id: SessionId,
        reading: TelemetryReading,
    ) -> Result<PublishReport> {
        self.hub.publish(session_id, reading).await
    }

    /// Combine a rover's current state with fresh sensor values.
    pub async fn read_telemetry(&self, rover: &Rover) -> TelemetryReading {
        let snapshot = rover.snapshot().await;
        let timestamp = Utc::now();
        let sensors = self.sensors.sample(&snapshot.rover_id, timestamp);
        TelemetryReading {
            rover_id: snapshot.rover_id,
            timestamp,
            status: snapshot.status,
            coordinates: snapshot.coordinates,
            sensors,
        }
    }
}
