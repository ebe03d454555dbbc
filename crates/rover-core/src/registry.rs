//! Fleet registry: the mapping from session to that session's rovers.
//!
//! The registry lock only guards the session map itself and is held just
//! long enough to clone an [`Arc`]. Rover state is protected per rover
//! (see [`Rover`]), so commands and telemetry reads against different
//! rovers never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rover_types::{RoverId, RoverSnapshot, SessionId};
use tokio::sync::RwLock;

use crate::config::FleetSection;
use crate::error::{FleetError, Result};
use crate::rover::Rover;

/// The rovers belonging to one session, in creation order.
#[derive(Debug)]
pub struct Fleet {
    session_id: SessionId,
    created_at: DateTime<Utc>,
    rovers: Vec<Arc<Rover>>,
}

impl Fleet {
    /// Build a fleet from already-constructed rovers.
    pub fn new(session_id: SessionId, rovers: Vec<Rover>) -> Self {
        Self {
            session_id,
            created_at: Utc::now(),
            rovers: rovers.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build `Rover-1` .. `Rover-N`, idle at the origin, each with a random
    /// battery charge in the configured range.
    pub fn generate(session_id: SessionId, config: &FleetSection) -> Self {
        let mut rng = rand::rng();
        let low = config.battery_min.min(config.battery_max);
        let rovers = (1..=config.rovers_per_session)
            .map(|n| {
                let battery = rng.random_range(low..=config.battery_max);
                Rover::new(RoverId::numbered(n), battery)
            })
            .collect();
        Self::new(session_id, rovers)
    }

    /// The owning session.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// When the fleet was created.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All rovers, in creation order.
    pub fn rovers(&self) -> &[Arc<Rover>] {
        &self.rovers
    }

    /// Look up a rover by name.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::RoverNotFound`] if no rover has that name.
    pub fn rover(&self, rover_id: &RoverId) -> Result<&Arc<Rover>> {
        self.rovers
            .iter()
            .find(|r| r.id() == rover_id)
            .ok_or_else(|| FleetError::RoverNotFound {
                session_id: self.session_id,
                rover_id: rover_id.clone(),
            })
    }

    /// Snapshot every rover, in creation order.
    pub async fn snapshot(&self) -> Vec<RoverSnapshot> {
        let mut out = Vec::with_capacity(self.rovers.len());
        for rover in &self.rovers {
            out.push(rover.snapshot().await);
        }
        out
    }

    /// Invalidate every rover's motion loop.
    pub async fn halt_all(&self) {
        for rover in &self.rovers {
            rover.halt().await;
        }
    }
}

/// Session-keyed store of fleets.
#[derive(Debug, Default)]
pub struct FleetRegistry {
    fleets: RwLock<BTreeMap<SessionId, Arc<Fleet>>>,
}

impl FleetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh session with a default fleet and return its id.
    pub async fn create(&self, config: &FleetSection) -> SessionId {
        let session_id = SessionId::new();
        self.insert(Fleet::generate(session_id, config)).await;
        session_id
    }

    /// Register a fleet under its session id, replacing any previous entry.
    pub async fn insert(&self, fleet: Fleet) -> Arc<Fleet> {
        let fleet = Arc::new(fleet);
        self.fleets
            .write()
            .await
            .insert(fleet.session_id(), Arc::clone(&fleet));
        fleet
    }

    /// Look up a session's fleet.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn get(&self, session_id: SessionId) -> Result<Arc<Fleet>> {
        self.fleets
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(FleetError::SessionNotFound(session_id))
    }

    /// Remove a session's fleet, returning it if it existed.
    pub async fn remove(&self, session_id: SessionId) -> Option<Arc<Fleet>> {
        self.fleets.write().await.remove(&session_id)
    }

    /// Look up one rover in one session.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] or
    /// [`FleetError::RoverNotFound`].
    pub async fn rover(&self, session_id: SessionId, rover_id: &RoverId) -> Result<Arc<Rover>> {
        let fleet = self.get(session_id).await?;
        fleet.rover(rover_id).cloned()
    }

    /// Snapshot every rover in a session, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn list_rovers(&self, session_id: SessionId) -> Result<Vec<RoverSnapshot>> {
        let fleet = self.get(session_id).await?;
        Ok(fleet.snapshot().await)
    }

    /// Point-in-time copy of the live session ids.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        self.fleets.read().await.keys().copied().collect()
    }

    /// Point-in-time copy of the live fleets.
    pub async fn fleets(&self) -> Vec<Arc<Fleet>> {
        self.fleets.read().await.values().cloned().collect()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.fleets.read().await.len()
    }

    /// Whether no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.fleets.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rover_types::{Coordinates, RoverStatus};

    use super::*;

    fn section(rovers: u32) -> FleetSection {
        FleetSection {
            rovers_per_session: rovers,
            battery_min: 50,
            battery_max: 100,
        }
    }

    #[tokio::test]
    async fn create_builds_default_fleet() {
        let registry = FleetRegistry::new();
        let session_id = registry.create(&section(5)).await;

        let rovers = registry.list_rovers(session_id).await.unwrap_or_default();
        assert_eq!(rovers.len(), 5);
        let names: Vec<&str> = rovers.iter().map(|r| r.rover_id.as_str()).collect();
        assert_eq!(names, ["Rover-1", "Rover-2", "Rover-3", "Rover-4", "Rover-5"]);
        for rover in &rovers {
            assert_eq!(rover.status, RoverStatus::Idle);
            assert_eq!(rover.coordinates, Coordinates::ORIGIN);
            assert!((50..=100).contains(&rover.battery));
        }
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let registry = FleetRegistry::new();
        let a = registry.create(&section(2)).await;
        let b = registry.create(&section(2)).await;
        assert_ne!(a, b);

        let rover_a = registry.rover(a, &RoverId::numbered(1)).await;
        let rover_b = registry.rover(b, &RoverId::numbered(1)).await;
        assert!(rover_a.is_ok() && rover_b.is_ok());
        if let (Ok(rover_a), Ok(rover_b)) = (rover_a, rover_b) {
            assert!(!Arc::ptr_eq(&rover_a, &rover_b));
        }
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let registry = FleetRegistry::new();
        let missing = SessionId::new();
        let result = registry.list_rovers(missing).await;
        assert_eq!(result, Err(FleetError::SessionNotFound(missing)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_rover_is_not_found() {
        let registry = FleetRegistry::new();
        let session_id = registry.create(&section(5)).await;
        let result = registry.rover(session_id, &RoverId::numbered(6)).await;
        assert!(matches!(result, Err(FleetError::RoverNotFound { .. })));
    }

    #[tokio::test]
    async fn remove_drops_session() {
        let registry = FleetRegistry::new();
        let session_id = registry.create(&section(1)).await;
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(session_id).await.is_some());
        assert!(registry.remove(session_id).await.is_none());
        assert!(registry.session_ids().await.is_empty());
    }

    #[tokio::test]
    async fn fixed_battery_range() {
        let fleet = Fleet::generate(
            SessionId::new(),
            &FleetSection {
                rovers_per_session: 3,
                battery_min: 80,
                battery_max: 80,
            },
        );
        for snap in fleet.snapshot().await {
            assert_eq!(snap.battery, 80);
        }
    }
}
