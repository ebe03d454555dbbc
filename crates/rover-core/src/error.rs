//! Error types for the `rover-core` crate.
//!
//! Lookup failures and rejected commands are returned to callers as
//! [`FleetError`]. Subscriber transport failures never surface here; the
//! broadcaster recovers from them locally (see
//! [`SendFailure`](crate::broadcaster::SendFailure)).

use rover_types::{ParseDirectionError, RoverId, SessionId};

/// Errors returned by fleet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FleetError {
    /// No live session has this identifier.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session exists but has no rover with this name.
    #[error("rover {rover_id} not found in session {session_id}")]
    RoverNotFound {
        /// The session that was searched.
        session_id: SessionId,
        /// The rover name that was requested.
        rover_id: RoverId,
    },

    /// A move command named an unknown direction.
    #[error(transparent)]
    InvalidDirection(#[from] ParseDirectionError),
}

/// Convenience alias for results carrying a [`FleetError`].
pub type Result<T> = std::result::Result<T, FleetError>;
