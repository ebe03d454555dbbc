//! `WebSocket` handler for a session's telemetry stream.
//!
//! Clients connect to `GET /ws/{session_id}`. The first frame is the
//! session's replay history (`{"type":"history","payload":[...]}`); every
//! later frame is one live reading (`{"type":"update","payload":{...}}`).
//!
//! The subscription is taken before the upgrade completes, so an unknown
//! session is answered with `404` instead of an open socket, and no reading
//! published while the handshake is in flight is lost. The stream ends when
//! the client closes, the transport fails, or the session is torn down.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use rover_core::broadcaster::Subscription;
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::handlers::parse_session_id;
use crate::state::AppState;

/// Subscribe to a session and upgrade to a `WebSocket`.
///
/// # Route
///
/// `GET /ws/{session_id}`
pub async fn ws_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ObserverError> {
    let session_id = parse_session_id(&session_id)?;
    let subscription = state.manager.subscribe(session_id).await?;
    match ws {
        Ok(ws) => Ok(ws.on_upgrade(move |socket| handle_ws(socket, state, subscription))),
        Err(rejection) => {
            // Dropping the subscription closes its channel; the next publish
            // evicts it.
            debug!(%session_id, "WebSocket upgrade rejected");
            Ok(rejection.into_response())
        }
    }
}

/// Forward every stream message to the socket until either side ends.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, mut subscription: Subscription) {
    let session_id = subscription.session_id();
    let subscriber_id = subscription.id();
    debug!(%session_id, subscriber_id, "WebSocket client connected");

    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else {
                    debug!(%session_id, subscriber_id, "Stream closed by broadcaster");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize stream message: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(%session_id, subscriber_id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%session_id, subscriber_id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%session_id, subscriber_id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%session_id, subscriber_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Client text and binary frames are ignored.
                    }
                }
            }
        }
    }

    // The session may already be gone; that is not an error here.
    let _ = state.manager.unsubscribe(session_id, subscriber_id).await;
}
