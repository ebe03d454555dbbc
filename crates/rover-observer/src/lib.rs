//! HTTP and `WebSocket` adapter for the rover fleet simulator.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **Session endpoints** to start and tear down sessions
//! - **Fleet and rover endpoints** for status, battery, coordinates,
//!   on-demand sensor readings, and the move/reset commands
//! - **`WebSocket` endpoint** (`/ws/{session_id}`) streaming the session's
//!   replay history followed by live telemetry updates
//!
//! # Architecture
//!
//! Every handler is a thin translation onto [`SessionManager`]; the
//! adapter holds no fleet state of its own. Core errors are mapped to HTTP
//! status codes by [`ObserverError`].
//!
//! [`SessionManager`]: rover_core::SessionManager
//! [`ObserverError`]: error::ObserverError

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
