//! Shared application state for the HTTP adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rover_core::SessionManager;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    /// The engine's session manager.
    pub manager: Arc<SessionManager>,
    /// When the server state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wrap a session manager.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the state was created.
    pub fn uptime_seconds(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
