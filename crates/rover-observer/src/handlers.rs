//! REST endpoint handlers.
//!
//! Every handler parses its path and query, calls one
//! [`SessionManager`](rover_core::SessionManager) operation, and shapes the
//! result as JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and live session count |
//! | `POST` | `/api/session/start` | Start a session |
//! | `DELETE` | `/api/session/{session_id}` | Tear a session down |
//! | `GET` | `/api/fleet/status` | Every rover in a session |
//! | `GET` | `/api/rover/{rover_id}/status` | One rover |
//! | `GET` | `/api/rover/{rover_id}/battery` | Battery charge |
//! | `GET` | `/api/rover/{rover_id}/coordinates` | Position |
//! | `GET` | `/api/rover/{rover_id}/sensor-data` | On-demand sensor reading |
//! | `POST` | `/api/rover/{rover_id}/move` | Start driving |
//! | `POST` | `/api/rover/{rover_id}/reset` | Return to idle at origin |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use rover_types::{RoverId, SessionId};
use serde::Serialize;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for endpoints scoped to a session.
#[derive(Debug, serde::Deserialize)]
pub struct SessionQuery {
    /// The session token returned by `POST /api/session/start`.
    pub session_id: Option<String>,
}

/// Query parameters for `POST /api/rover/{rover_id}/move`.
#[derive(Debug, serde::Deserialize)]
pub struct MoveQuery {
    /// The session token.
    pub session_id: Option<String>,
    /// One of `forward`, `backward`, `left`, `right`.
    pub direction: Option<String>,
}

/// One rover's entry in the fleet status map.
#[derive(Debug, Serialize)]
struct RoverView {
    status: String,
    battery: u8,
    coordinates: rover_types::Coordinates,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Report liveness and the number of live sessions.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.manager.session_count().await,
        "uptime_seconds": state.uptime_seconds(),
    }))
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Start a new session with a fresh fleet.
pub async fn start_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.manager.start_session().await;
    Json(serde_json::json!({
        "session_id": session_id,
        "message": "Session started. Use this ID for API calls.",
    }))
}

/// Tear a session down, stopping its rovers and closing its streams.
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = parse_session_id(&session_id)?;
    let report = state.manager.teardown(session_id).await?;
    info!(%session_id, "Session ended via API");
    Ok(Json(serde_json::json!({
        "session_id": session_id,
        "message": "Session ended",
        "rovers_halted": report.rovers_halted,
        "subscribers_detached": report.subscribers_detached,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/fleet/status
// ---------------------------------------------------------------------------

/// Every rover in the session, keyed by rover id.
pub async fn fleet_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let fleet: BTreeMap<String, RoverView> = state
        .manager
        .fleet_snapshot(session_id)
        .await?
        .into_iter()
        .map(|snap| {
            (
                snap.rover_id.to_string(),
                RoverView {
                    status: snap.status.to_string(),
                    battery: snap.battery,
                    coordinates: snap.coordinates,
                },
            )
        })
        .collect();
    Ok(Json(fleet))
}

// ---------------------------------------------------------------------------
// Rover queries
// ---------------------------------------------------------------------------

/// Status, battery, and position of one rover.
pub async fn rover_status(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let snapshot = state
        .manager
        .rover_status(session_id, &RoverId::from(rover_id))
        .await?;
    Ok(Json(snapshot))
}

/// Battery charge of one rover.
pub async fn rover_battery(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let rover_id = RoverId::from(rover_id);
    let battery = state.manager.rover_battery(session_id, &rover_id).await?;
    Ok(Json(serde_json::json!({
        "rover_id": rover_id,
        "battery_level": battery,
    })))
}

/// Position of one rover.
pub async fn rover_coordinates(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let rover_id = RoverId::from(rover_id);
    let coordinates = state.manager.rover_coordinates(session_id, &rover_id).await?;
    Ok(Json(serde_json::json!({
        "rover_id": rover_id,
        "coordinates": coordinates,
    })))
}

/// A fresh sensor reading for one rover. Not published to subscribers.
pub async fn rover_sensor_data(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let reading = state
        .manager
        .sensor_reading(session_id, &RoverId::from(rover_id))
        .await?;
    Ok(Json(reading))
}

// ---------------------------------------------------------------------------
// Rover commands
// ---------------------------------------------------------------------------

/// Start a rover driving, superseding any motion already in progress.
pub async fn move_rover(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<MoveQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let direction = query
        .direction
        .ok_or_else(|| ObserverError::InvalidQuery(String::from("missing direction")))?;
    let rover_id = RoverId::from(rover_id);
    let direction = state
        .manager
        .move_rover(session_id, &rover_id, &direction)
        .await?;
    Ok(Json(serde_json::json!({
        "message": format!("{rover_id} moving {direction}"),
    })))
}

/// Return a rover to idle at the origin.
pub async fn reset_rover(
    State(state): State<Arc<AppState>>,
    Path(rover_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let session_id = require_session(query.session_id.as_deref())?;
    let rover_id = RoverId::from(rover_id);
    state.manager.reset_rover(session_id, &rover_id).await?;
    Ok(Json(serde_json::json!({
        "message": format!("{rover_id} reset to idle"),
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a session id, rejecting malformed tokens with `400`.
pub(crate) fn parse_session_id(s: &str) -> Result<SessionId, ObserverError> {
    s.parse::<SessionId>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}

fn require_session(s: Option<&str>) -> Result<SessionId, ObserverError> {
    let s = s.ok_or_else(|| ObserverError::InvalidQuery(String::from("missing session_id")))?;
    parse_session_id(s)
}
