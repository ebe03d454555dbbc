//! Per-session fan-out of telemetry readings with replay for late joiners.
//!
//! Each session owns one [`SessionBroadcaster`]. A subscriber is the
//! sending half of a bounded [`mpsc`] channel; the transport task (for
//! example a `WebSocket` handler) drains the receiving half.
//!
//! # Ordering
//!
//! History appends, fan-out, and subscriber attachment all happen under one
//! per-session lock, and every send is a non-blocking `try_send`. So:
//!
//! - publishes for a session are serialized, and every subscriber receives
//!   them in publish order;
//! - a new subscriber's replay is queued before it joins the fan-out set,
//!   so it never sees an update before its history, and no publish can
//!   fall between the two.
//!
//! A subscriber whose channel is closed or full is evicted during fan-out.
//! Eviction of one subscriber never affects delivery to the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use rover_types::{SessionId, StreamMessage, TelemetryReading};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, warn};

use crate::config::BroadcastConfig;
use crate::error::{FleetError, Result};
use crate::history::HistoryBuffer;

/// Identifier of one subscriber within a session.
pub type SubscriberId = u64;

/// Why a message could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    /// The receiving side has been dropped.
    #[error("subscriber disconnected")]
    Disconnected,

    /// The subscriber's queue is full; it is not keeping up.
    #[error("subscriber lagging")]
    Lagged,

    /// The broadcaster has been closed by session teardown.
    #[error("broadcaster closed")]
    Closed,
}

impl<T> From<TrySendError<T>> for SendFailure {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::Lagged,
            TrySendError::Closed(_) => Self::Disconnected,
        }
    }
}

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers the reading was queued for.
    pub delivered: usize,
    /// Subscribers removed because their send failed.
    pub evicted: usize,
}

/// Receiving end of a subscription created by
/// [`SessionBroadcaster::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    session_id: SessionId,
    receiver: mpsc::Receiver<StreamMessage>,
}

impl Subscription {
    /// The subscriber's id, for [`SessionBroadcaster::unsubscribe`].
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// The session this subscription belongs to.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Wait for the next message.
    ///
    /// Returns `None` once the subscriber has been evicted or the session
    /// torn down and every queued message has been drained.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.receiver.recv().await
    }

    /// Take the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<StreamMessage> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug)]
struct Inner {
    history: HistoryBuffer,
    subscribers: BTreeMap<SubscriberId, mpsc::Sender<StreamMessage>>,
    next_id: SubscriberId,
    closed: bool,
}

/// Fan-out and replay state for one session.
#[derive(Debug)]
pub struct SessionBroadcaster {
    session_id: SessionId,
    subscriber_buffer: usize,
    inner: Mutex<Inner>,
}

impl SessionBroadcaster {
    /// Create an empty broadcaster for a session.
    pub fn new(session_id: SessionId, config: &BroadcastConfig) -> Self {
        Self {
            session_id,
            subscriber_buffer: config.subscriber_buffer.max(1),
            inner: Mutex::new(Inner {
                history: HistoryBuffer::new(config.history_capacity),
                subscribers: BTreeMap::new(),
                next_id: 0,
                closed: false,
            }),
        }
    }

    /// The owning session.
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Create a new subscriber channel, replay history into it, and add it
    /// to the fan-out set.
    ///
    /// # Errors
    ///
    /// Returns [`SendFailure::Closed`] if the session has been torn down.
    pub async fn subscribe(&self) -> std::result::Result<Subscription, SendFailure> {
        let (tx, receiver) = mpsc::channel(self.subscriber_buffer);
        let id = self.attach(tx).await?;
        Ok(Subscription {
            id,
            session_id: self.session_id,
            receiver,
        })
    }

    /// Add an externally created subscriber handle.
    ///
    /// The full history is queued on `sender` as one
    /// [`StreamMessage::History`] before the handle joins the fan-out set.
    ///
    /// # Errors
    ///
    /// Returns [`SendFailure::Closed`] after teardown, or the failure that
    /// prevented queuing the replay (the handle is then not added).
    pub async fn attach(
        &self,
        sender: mpsc::Sender<StreamMessage>,
    ) -> std::result::Result<SubscriberId, SendFailure> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SendFailure::Closed);
        }

        sender.try_send(StreamMessage::History(inner.history.to_vec()))?;

        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.subscribers.insert(id, sender);
        debug!(
            session_id = %self.session_id,
            subscriber_id = id,
            replayed = inner.history.len(),
            subscribers = inner.subscribers.len(),
            "Subscriber attached"
        );
        Ok(id)
    }

    /// Remove a subscriber. Returns whether it was present.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.subscribers.remove(&id).is_some();
        if removed {
            debug!(
                session_id = %self.session_id,
                subscriber_id = id,
                subscribers = inner.subscribers.len(),
                "Subscriber detached"
            );
        }
        removed
    }

    /// Append a reading to history, then queue it for every subscriber.
    ///
    /// Subscribers whose send fails are evicted; the rest still receive the
    /// reading. Publishing after teardown is a no-op.
    pub async fn publish(&self, reading: TelemetryReading) -> PublishReport {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return PublishReport::default();
        }

        let _ = inner.history.push(reading.clone());

        let mut report = PublishReport::default();
        let mut failed = Vec::new();
        for (&id, sender) in &inner.subscribers {
            match sender.try_send(StreamMessage::Update(reading.clone())) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(err) => failed.push((id, SendFailure::from(err))),
            }
        }

        for (id, failure) in failed {
            inner.subscribers.remove(&id);
            report.evicted = report.evicted.saturating_add(1);
            match failure {
                SendFailure::Lagged => warn!(
                    session_id = %self.session_id,
                    subscriber_id = id,
                    "Evicting lagging subscriber"
                ),
                SendFailure::Disconnected | SendFailure::Closed => debug!(
                    session_id = %self.session_id,
                    subscriber_id = id,
                    "Evicting disconnected subscriber"
                ),
            }
        }

        report
    }

    /// Copy of the retained readings, oldest first.
    pub async fn history(&self) -> Vec<TelemetryReading> {
        self.inner.lock().await.history.to_vec()
    }

    /// Number of attached subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }

    /// Detach every subscriber and refuse further subscriptions.
    ///
    /// Dropping the senders ends each subscriber's stream once it has
    /// drained what was already queued. Returns how many were detached.
    pub async fn close(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        inner.history.clear();
        let detached = inner.subscribers.len();
        inner.subscribers.clear();
        detached
    }
}

/// Session-keyed store of broadcasters.
#[derive(Debug)]
pub struct BroadcastHub {
    config: BroadcastConfig,
    sessions: RwLock<BTreeMap<SessionId, Arc<SessionBroadcaster>>>,
}

impl BroadcastHub {
    /// Create an empty hub whose broadcasters use `config`.
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create (or replace) the broadcaster for a session.
    pub async fn open(&self, session_id: SessionId) -> Arc<SessionBroadcaster> {
        let broadcaster = Arc::new(SessionBroadcaster::new(session_id, &self.config));
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::clone(&broadcaster));
        broadcaster
    }

    /// Look up a session's broadcaster.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session has none.
    pub async fn get(&self, session_id: SessionId) -> Result<Arc<SessionBroadcaster>> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(FleetError::SessionNotFound(session_id))
    }

    /// Remove and close a session's broadcaster. Returns the number of
    /// subscribers detached, or `None` if the session had no broadcaster.
    pub async fn remove(&self, session_id: SessionId) -> Option<usize> {
        let broadcaster = self.sessions.write().await.remove(&session_id)?;
        Some(broadcaster.close().await)
    }

    /// Subscribe to a session's telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist
    /// or is being torn down.
    pub async fn subscribe(&self, session_id: SessionId) -> Result<Subscription> {
        self.get(session_id)
            .await?
            .subscribe()
            .await
            .map_err(|_closed| FleetError::SessionNotFound(session_id))
    }

    /// Remove a subscriber from a session. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn unsubscribe(&self, session_id: SessionId, id: SubscriberId) -> Result<bool> {
        Ok(self.get(session_id).await?.unsubscribe(id).await)
    }

    /// Publish a reading to a session.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::SessionNotFound`] if the session does not exist.
    pub async fn publish(
        &self,
        session_id: SessionId,
        reading: TelemetryReading,
    ) -> Result<PublishReport> {
        Ok(self.get(session_id).await?.publish(reading).await)
    }

    /// Number of sessions with a broadcaster.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session has a broadcaster.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
