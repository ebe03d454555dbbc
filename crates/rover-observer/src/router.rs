//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// See [`handlers`] for the REST endpoints. `GET /ws/{session_id}` serves
/// the telemetry stream.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Sessions
        .route("/api/session/start", post(handlers::start_session))
        .route("/api/session/{session_id}", delete(handlers::end_session))
        // Fleet and rovers
        .route("/api/fleet/status", get(handlers::fleet_status))
        .route("/api/rover/{rover_id}/status", get(handlers::rover_status))
        .route("/api/rover/{rover_id}/battery", get(handlers::rover_battery))
        .route(
            "/api/rover/{rover_id}/coordinates",
            get(handlers::rover_coordinates),
        )
        .route(
            "/api/rover/{rover_id}/sensor-data",
            get(handlers::rover_sensor_data),
        )
        .route("/api/rover/{rover_id}/move", post(handlers::move_rover))
        .route("/api/rover/{rover_id}/reset", post(handlers::reset_rover))
        // WebSocket
        .route("/ws/{session_id}", get(ws::ws_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
