//! Periodic telemetry generation.
//!
//! Every tick the [`TelemetryGenerator`] takes a snapshot of the live
//! sessions, builds one [`TelemetryReading`] per rover, and publishes the
//! readings to each session's broadcaster. Sessions are processed
//! concurrently; readings within one session are published in fleet order.
//! A session torn down mid-tick is skipped without error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::registry::Fleet;
use crate::session::SessionManager;

/// Outcome of one telemetry tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Sessions that received readings.
    pub sessions: usize,
    /// Readings published across all sessions.
    pub readings: usize,
    /// Successful deliveries to subscribers.
    pub delivered: usize,
    /// Subscribers evicted during this tick.
    pub evicted: usize,
}

/// Stop signal shared between the generator loop and its owner.
#[derive(Debug, Default)]
pub struct TelemetryControl {
    stop_requested: AtomicBool,
    notify: Notify,
}

impl TelemetryControl {
    /// Create a control in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Drives the periodic telemetry broadcast.
#[derive(Debug)]
pub struct TelemetryGenerator {
    manager: Arc<SessionManager>,
    interval: Duration,
    control: Arc<TelemetryControl>,
    completed: u64,
}

impl TelemetryGenerator {
    /// Create a generator ticking every `interval`.
    pub fn new(manager: Arc<SessionManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval: interval.max(Duration::from_millis(1)),
            control: Arc::new(TelemetryControl::new()),
            completed: 0,
        }
    }

    /// Handle for stopping [`run`](Self::run) from another task.
    pub fn control(&self) -> Arc<TelemetryControl> {
        Arc::clone(&self.control)
    }

    /// Number of ticks completed so far.
    pub const fn ticks(&self) -> u64 {
        self.completed
    }

    /// Run one tick: sample every rover of every live session and publish.
    pub async fn tick(&mut self) -> TickReport {
        self.completed = self.completed.saturating_add(1);
        let fleets = self.manager.registry().fleets().await;

        let manager = &self.manager;
        let outcomes = join_all(fleets.iter().map(|fleet| publish_fleet(manager, fleet))).await;

        let mut report = TickReport {
            tick: self.completed,
            ..TickReport::default()
        };
        for outcome in outcomes.into_iter().flatten() {
            report.sessions = report.sessions.saturating_add(1);
            report.readings = report.readings.saturating_add(outcome.readings);
            report.delivered = report.delivered.saturating_add(outcome.delivered);
            report.evicted = report.evicted.saturating_add(outcome.evicted);
        }
        report
    }

    /// Tick on a fixed interval until a stop is requested.
    ///
    /// The first tick fires immediately. Returns the number of ticks run.
    pub async fn run(mut self) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let control = self.control();

        info!(interval_ms = self.interval.as_millis(), "Telemetry generator started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = control.stopped() => break,
            }
            if control.is_stop_requested() {
                break;
            }
            let report = self.tick().await;
            debug!(
                tick = report.tick,
                sessions = report.sessions,
                readings = report.readings,
                delivered = report.delivered,
                evicted = report.evicted,
                "Telemetry tick"
            );
        }
        info!(ticks = self.completed, "Telemetry generator stopped");
        self.completed
    }
}

#[derive(Debug, Default)]
struct FleetOutcome {
    readings: usize,
    delivered: usize,
    evicted: usize,
}

/// Publish one reading per rover to the fleet's broadcaster.
///
/// Returns `None` if the session's broadcaster is already gone.
async fn publish_fleet(manager: &SessionManager, fleet: &Arc<Fleet>) -> Option<FleetOutcome> {
    let broadcaster = manager.hub().get(fleet.session_id()).await.ok()?;
    let mut outcome = FleetOutcome::default();
    for rover in fleet.rovers() {
        let reading = manager.read_telemetry(rover).await;
        let published = broadcaster.publish(reading).await;
        outcome.readings = outcome.readings.saturating_add(1);
        outcome.delivered = outcome.delivered.saturating_add(published.delivered);
        outcome.evicted = outcome.evicted.saturating_add(published.evicted);
    }
    Some(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rover_types::{RoverId, StreamMessage};

    use super::*;
    use crate::config::FleetConfig;
    use crate::sensors::RandomSensorSource;

    fn manager() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            &FleetConfig::default(),
            Arc::new(RandomSensorSource::new()),
        ))
    }

    #[tokio::test]
    async fn tick_publishes_one_reading_per_rover() {
        let manager = manager();
        let a = manager.start_session().await;
        let _b = manager.start_session().await;
        let mut sub = manager.subscribe(a).await.unwrap();
        let mut generator = TelemetryGenerator::new(Arc::clone(&manager), Duration::from_secs(1));

        let report = generator.tick().await;
        assert_eq!(report.tick, 1);
        assert_eq!(report.sessions, 2);
        assert_eq!(report.readings, 10);
        assert_eq!(report.delivered, 5);

        assert_eq!(sub.try_recv(), Some(StreamMessage::History(Vec::new())));
        let ids: Vec<RoverId> = (0..5)
            .filter_map(|_| match sub.try_recv() {
                Some(StreamMessage::Update(reading)) => Some(reading.rover_id),
                _ => None,
            })
            .collect();
        let expected: Vec<RoverId> = (1..=5).map(RoverId::numbered).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn tick_without_sessions_is_empty() {
        let mut generator = TelemetryGenerator::new(manager(), Duration::from_secs(1));
        let report = generator.tick().await;
        assert_eq!(
            report,
            TickReport {
                tick: 1,
                ..TickReport::default()
            }
        );
    }

    #[tokio::test]
    async fn torn_down_session_is_skipped() {
        let manager = manager();
        let a = manager.start_session().await;
        let b = manager.start_session().await;
        let mut generator = TelemetryGenerator::new(Arc::clone(&manager), Duration::from_secs(1));

        // Broadcaster gone but fleet still registered: simulates a teardown
        // racing the tick.
        manager.hub().remove(b).await;
        let report = generator.tick().await;
        assert_eq!(report.sessions, 1);
        assert_eq!(report.readings, 5);
        assert_eq!(manager.hub().get(a).await.unwrap().history().await.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_until_stopped() {
        let manager = manager();
        let session_id = manager.start_session().await;
        let generator = TelemetryGenerator::new(Arc::clone(&manager), Duration::from_secs(1));
        let control = generator.control();
        let handle = tokio::spawn(generator.run());

        // Ticks at 0s, 1s, 2s.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        control.request_stop();
        let ticks = handle.await.unwrap();

        assert_eq!(ticks, 3);
        let history = manager.hub().get(session_id).await.unwrap().history().await;
        assert_eq!(history.len(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn history_stays_bounded_under_long_runs() {
        let manager = manager();
        let session_id = manager.start_session().await;
        let mut generator = TelemetryGenerator::new(Arc::clone(&manager), Duration::from_secs(1));

        for _ in 0..30 {
            generator.tick().await;
        }
        assert_eq!(generator.ticks(), 30);
        let history = manager.hub().get(session_id).await.unwrap().history().await;
        assert_eq!(history.len(), 100);
    }

    #[tokio::test]
    async fn stop_before_run_exits_immediately() {
        let generator = TelemetryGenerator::new(manager(), Duration::from_secs(1));
        generator.control().request_stop();
        assert_eq!(generator.run().await, 0);
    }
}
