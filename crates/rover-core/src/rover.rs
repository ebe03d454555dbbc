//! Rover actor: one rover's mutable state plus its background motion loop.
//!
//! All of a rover's fields live behind a single per-rover lock, so readers
//! always observe status, battery, and coordinates from the same instant.
//!
//! # Motion and supersession
//!
//! Every command that changes what the rover is doing bumps a per-rover
//! **generation counter**. A motion loop remembers the generation it was
//! started with and, on each tick, takes the write lock, compares its
//! generation to the current one, and only then applies its step. A stale
//! loop therefore exits without mutating anything, and at most one loop
//! can ever advance a rover's coordinates.

use std::sync::{Arc, Weak};
use std::time::Duration;

use rover_types::{Coordinates, Direction, RoverId, RoverSnapshot, RoverStatus};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Shortest accepted motion period; an interval of zero would spin.
const MIN_MOTION_PERIOD: Duration = Duration::from_millis(1);

/// Mutable state guarded by the rover's lock.
#[derive(Debug)]
struct RoverState {
    status: RoverStatus,
    battery: u8,
    coordinates: Coordinates,
    generation: u64,
}

/// A single simulated rover.
#[derive(Debug)]
pub struct Rover {
    id: RoverId,
    state: RwLock<RoverState>,
}

impl Rover {
    /// Create an idle rover at the origin with the given battery charge.
    pub fn new(id: RoverId, battery: u8) -> Self {
        Self {
            id,
            state: RwLock::new(RoverState {
                status: RoverStatus::Idle,
                battery,
                coordinates: Coordinates::ORIGIN,
                generation: 0,
            }),
        }
    }

    /// The rover's name.
    pub const fn id(&self) -> &RoverId {
        &self.id
    }

    /// Consistent copy of the rover's current state.
    pub async fn snapshot(&self) -> RoverSnapshot {
        let state = self.state.read().await;
        RoverSnapshot {
            rover_id: self.id.clone(),
            status: state.status,
            battery: state.battery,
            coordinates: state.coordinates,
        }
    }

    /// Current grid position.
    pub async fn coordinates(&self) -> Coordinates {
        self.state.read().await.coordinates
    }

    /// Current battery charge in percent.
    pub async fn battery(&self) -> u8 {
        self.state.read().await.battery
    }

    /// Current generation; changes on every move, reset, or halt.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Start driving in `direction`, one unit step every `period`.
    ///
    /// Any motion loop started earlier is superseded: it observes the new
    /// generation on its next tick and exits without stepping. Coordinates
    /// are left where they are. Returns the generation of the new loop.
    pub async fn start_motion(self: &Arc<Self>, direction: Direction, period: Duration) -> u64 {
        let generation = {
            let mut state = self.state.write().await;
            state.generation = state.generation.wrapping_add(1);
            state.status = RoverStatus::Moving(direction);
            state.generation
        };

        tokio::spawn(motion_loop(
            Arc::downgrade(self),
            generation,
            direction,
            period.max(MIN_MOTION_PERIOD),
        ));

        debug!(rover_id = %self.id, %direction, generation, "Motion loop started");
        generation
    }

    /// Return to idle at the origin, stopping any motion loop.
    ///
    /// Idempotent.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        state.status = RoverStatus::Idle;
        state.coordinates = Coordinates::ORIGIN;
        debug!(rover_id = %self.id, generation = state.generation, "Rover reset");
    }

    /// Stop any motion loop and go idle, keeping the current position.
    ///
    /// Used when the owning session is torn down.
    pub async fn halt(&self) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        state.status = RoverStatus::Idle;
    }

    /// Apply one motion step if `generation` is still current.
    ///
    /// Returns `false` when the caller has been superseded.
    async fn step(&self, generation: u64, direction: Direction) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        state.coordinates = state.coordinates.step(direction);
        true
    }
}

/// Background loop advancing a rover until its generation goes stale or
/// the rover itself is dropped.
async fn motion_loop(rover: Weak<Rover>, generation: u64, direction: Direction, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(rover) = rover.upgrade() else {
            return;
        };
        if !rover.step(generation, direction).await {
            debug!(rover_id = %rover.id, generation, "Motion loop superseded");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(1);

    fn rover() -> Arc<Rover> {
        Arc::new(Rover::new(RoverId::numbered(3), 75))
    }

    /// Sleep to the middle of the motion tick `n` periods from now.
    async fn settle(ticks: u32) {
        let half = PERIOD.checked_div(2).unwrap_or_default();
        let total = PERIOD
            .checked_mul(ticks)
            .and_then(|d| d.checked_add(half))
            .unwrap_or_default();
        tokio::time::sleep(total).await;
    }

    #[tokio::test]
    async fn new_rover_is_idle_at_origin() {
        let rover = rover();
        let snap = rover.snapshot().await;
        assert_eq!(snap.rover_id, RoverId::numbered(3));
        assert_eq!(snap.status, RoverStatus::Idle);
        assert_eq!(snap.battery, 75);
        assert_eq!(snap.coordinates, Coordinates::ORIGIN);
    }

    #[tokio::test(start_paused = true)]
    async fn moving_rover_advances_once_per_tick() {
        let rover = rover();
        rover.start_motion(Direction::Forward, PERIOD).await;
        assert_eq!(
            rover.snapshot().await.status,
            RoverStatus::Moving(Direction::Forward)
        );

        settle(3).await;
        assert_eq!(rover.coordinates().await, Coordinates::new(0, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn second_move_supersedes_first() {
        let rover = rover();
        rover.start_motion(Direction::Left, PERIOD).await;
        rover.start_motion(Direction::Right, PERIOD).await;

        settle(4).await;
        // Only rightward steps accumulate; the left loop never stepped.
        assert_eq!(rover.coordinates().await, Coordinates::new(4, 0));
        assert_eq!(
            rover.snapshot().await.status,
            RoverStatus::Moving(Direction::Right)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_same_direction_does_not_stack() {
        let rover = rover();
        for _ in 0..3 {
            rover.start_motion(Direction::Backward, PERIOD).await;
        }

        settle(2).await;
        assert_eq!(rover.coordinates().await, Coordinates::new(0, -2));
    }

    #[tokio::test(start_paused = true)]
    async fn direction_change_keeps_position() {
        let rover = rover();
        rover.start_motion(Direction::Forward, PERIOD).await;
        settle(2).await;
        rover.start_motion(Direction::Right, PERIOD).await;
        settle(2).await;

        assert_eq!(rover.coordinates().await, Coordinates::new(2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_motion_and_returns_to_origin() {
        let rover = rover();
        rover.start_motion(Direction::Forward, PERIOD).await;
        settle(2).await;

        rover.reset().await;
        let snap = rover.snapshot().await;
        assert_eq!(snap.status, RoverStatus::Idle);
        assert_eq!(snap.coordinates, Coordinates::ORIGIN);

        settle(3).await;
        assert_eq!(rover.coordinates().await, Coordinates::ORIGIN);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let rover = rover();
        rover.reset().await;
        rover.reset().await;
        let snap = rover.snapshot().await;
        assert_eq!(snap.status, RoverStatus::Idle);
        assert_eq!(snap.coordinates, Coordinates::ORIGIN);
    }

    #[tokio::test(start_paused = true)]
    async fn halt_freezes_position() {
        let rover = rover();
        rover.start_motion(Direction::Left, PERIOD).await;
        settle(2).await;

        rover.halt().await;
        settle(2).await;
        let snap = rover.snapshot().await;
        assert_eq!(snap.status, RoverStatus::Idle);
        assert_eq!(snap.coordinates, Coordinates::new(-2, 0));
    }

    #[tokio::test]
    async fn every_command_bumps_generation() {
        let rover = rover();
        let g0 = rover.generation().await;
        let g1 = rover.start_motion(Direction::Forward, PERIOD).await;
        rover.reset().await;
        let g2 = rover.generation().await;
        assert!(g0 < g1 && g1 < g2);
    }

    #[tokio::test(start_paused = true)]
    async fn motion_loop_ends_when_rover_dropped() {
        let rover = rover();
        let weak = Arc::downgrade(&rover);
        rover.start_motion(Direction::Forward, PERIOD).await;
        drop(rover);

        settle(2).await;
        assert!(weak.upgrade().is_none());
    }
}
