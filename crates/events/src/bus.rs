//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`PlatformEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Request handlers
//! publish after their writes commit; background consumers such as the
//! notification fan-out subscribe at startup.

use chrono::{DateTime, Utc};
use screener_core::comment::CommentSource;
use screener_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A comment was stored on a media item.
pub const COMMENT_CREATED: &str = "comment.created";

/// A project invitation was accepted.
pub const INVITATION_ACCEPTED: &str = "invitation.accepted";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the platform.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor), and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"comment.created"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"comment"`, `"invitation"`).
    pub source_entity_type: Option<String>,

    /// Optional source entity database id.
    pub source_entity_id: Option<DbId>,

    /// Optional id of the user that triggered the event. Guests have none.
    pub actor_user_id: Option<DbId>,

    /// Event-specific JSON payload.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach a source entity to the event.
    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Decode the payload as `T` when the event type matches.
    pub fn payload_as<T: DeserializeOwned>(&self, event_type: &str) -> Option<T> {
        if self.event_type != event_type {
            return None;
        }
        match serde_json::from_value(self.payload.clone()) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    event_type = %self.event_type,
                    error = %e,
                    "Malformed event payload",
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// Payload of [`COMMENT_CREATED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCreated {
    pub comment_id: DbId,
    pub media_id: DbId,
    pub project_id: DbId,
    pub source: CommentSource,
    /// Token of the review link the comment came through, if any.
    #[serde(default)]
    pub review_token: Option<String>,
}

impl CommentCreated {
    pub fn into_event(self, actor_user_id: Option<DbId>) -> PlatformEvent {
        let mut event = PlatformEvent::new(COMMENT_CREATED).with_source("comment", self.comment_id);
        if let Some(user_id) = actor_user_id {
            event = event.with_actor(user_id);
        }
        event.with_payload(serde_json::to_value(&self).unwrap_or_default())
    }
}

/// Payload of [`INVITATION_ACCEPTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationAccepted {
    pub invitation_id: DbId,
    pub project_id: DbId,
    pub member_user_id: DbId,
}

impl InvitationAccepted {
    pub fn into_event(self) -> PlatformEvent {
        PlatformEvent::new(INVITATION_ACCEPTED)
            .with_source("invitation", self.invitation_id)
            .with_actor(self.member_user_id)
            .with_payload(serde_json::to_value(&self).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// ```rust
/// use screener_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("comment.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
