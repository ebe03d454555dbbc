//! Rover fleet simulator binary.
//!
//! Wires the session manager, the telemetry generator, and the HTTP and
//! `WebSocket` server together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fleet-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the session manager with the random sensor source
//! 4. Spawn the telemetry generator
//! 5. Serve the API until `Ctrl-C`
//! 6. Stop telemetry and tear down remaining sessions

mod error;

use std::path::Path;
use std::sync::Arc;

use rover_core::SessionManager;
use rover_core::config::FleetConfig;
use rover_core::sensors::RandomSensorSource;
use rover_core::telemetry::TelemetryGenerator;
use rover_observer::{AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up relative to the working directory.
const CONFIG_PATH: &str = "fleet-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the server cannot bind,
/// or the telemetry task fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        host = config.server.host,
        port = config.server.port,
        rovers_per_session = config.fleet.rovers_per_session,
        telemetry_interval_ms = config.timing.telemetry_interval_ms,
        motion_interval_ms = config.timing.motion_interval_ms,
        history_capacity = config.broadcast.history_capacity,
        "rover-engine starting"
    );

    // 3. Session manager.
    let manager = Arc::new(SessionManager::new(
        &config,
        Arc::new(RandomSensorSource::new()),
    ));

    // 4. Telemetry generator.
    let generator = TelemetryGenerator::new(Arc::clone(&manager), config.timing.telemetry_interval());
    let control = generator.control();
    let telemetry = tokio::spawn(generator.run());

    // 5. Serve until Ctrl-C.
    let state = Arc::new(AppState::new(Arc::clone(&manager)));
    let server_config = ServerConfig::from(&config.server);
    let served = rover_observer::start_server(&server_config, state, shutdown_signal()).await;

    // 6. Shut down.
    control.request_stop();
    let ticks = telemetry.await.map_err(|e| EngineError::Telemetry {
        message: e.to_string(),
    })?;

    let sessions = manager.session_ids().await;
    for session_id in &sessions {
        if let Err(e) = manager.teardown(*session_id).await {
            warn!(%session_id, error = %e, "Teardown during shutdown failed");
        }
    }

    served?;
    info!(
        ticks,
        sessions_closed = sessions.len(),
        "rover-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`].
///
/// A missing file yields the defaults; the `PORT` override still applies.
fn load_config() -> Result<FleetConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(FleetConfig::from_file(config_path)?)
    } else {
        Ok(FleetConfig::default().with_env_overrides())
    }
}

/// Resolve on `Ctrl-C`.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
    }
}
