//! Error types for the HTTP adapter.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rover_core::FleetError;

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested session or rover was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A query parameter was missing or invalid.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A session id could not be parsed as a UUID.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

impl From<FleetError> for ObserverError {
    fn from(err: FleetError) -> Self {
        match &err {
            FleetError::SessionNotFound(_) | FleetError::RoverNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            FleetError::InvalidDirection(_) => Self::InvalidQuery(err.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::InvalidQuery(msg) | Self::InvalidUuid(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rover_types::{RoverId, SessionId};

    use super::*;

    #[test]
    fn fleet_errors_map_to_status_codes() {
        let session_id = SessionId::new();
        let cases = [
            (FleetError::SessionNotFound(session_id), StatusCode::NOT_FOUND),
            (
                FleetError::RoverNotFound {
                    session_id,
                    rover_id: RoverId::numbered(9),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                FleetError::InvalidDirection(
                    "up".parse::<rover_types::Direction>().unwrap_err(),
                ),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            let response = ObserverError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
