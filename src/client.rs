//! Trait abstraction over the remote RTM service.
//!
//! The wire protocol is not implemented here: the host supplies an
//! [`RtmConnector`] that builds clients for a credential, and the
//! adapter drives the resulting [`RtmClient`]/[`RtmSession`] pair. The
//! data model types derive serde so wire-level implementations can
//! decode service payloads into them directly.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport-level errors produced by client implementations.
#[derive(Debug, thiserror::Error)]
pub enum RtmError {
    /// The service rejected the presented credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The session is closed and can no longer be used.
    #[error("session closed")]
    SessionClosed,
}

/// The adapter's own identity as confirmed by the service at
/// authentication. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Service-assigned user identifier.
    pub user_id: String,
    /// Plain display handle.
    pub handle: String,
}

/// A user known to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Service-assigned user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Classification tag for an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An ordinary chat message.
    Message,
    /// The service invalidated our credentials mid-session.
    InvalidAuth,
    /// Connection chatter the adapter does not act on.
    Other,
}

/// One event notification from the remote service.
///
/// Non-message events may leave `sender`, `conversation`, and `text`
/// empty; the classifier ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Identifier for log correlation, stamped at normalization time.
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    /// Arrival timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Event classification.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Sender's user identifier.
    #[serde(default)]
    pub sender: String,
    /// Conversation (channel) identifier.
    #[serde(default)]
    pub conversation: String,
    /// Raw message text.
    #[serde(default)]
    pub text: String,
}

impl InboundEvent {
    /// Build a message event, stamping a fresh id and arrival timestamp.
    pub fn message(
        sender: impl Into<String>,
        conversation: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: EventKind::Message,
            sender: sender.into(),
            conversation: conversation.into(),
            text: text.into(),
        }
    }
}

/// Builds wire clients from a credential.
///
/// Mirrors the service SDK's constructor: `debug` asks the client for
/// protocol-level verbose logging.
pub trait RtmConnector: Send + Sync + 'static {
    /// Build a client authenticating with `token`.
    fn connect(&self, token: &str, debug: bool) -> Arc<dyn RtmClient>;
}

/// A client for the remote service, able to authenticate and open
/// real-time sessions.
#[async_trait]
pub trait RtmClient: Send + Sync + 'static {
    /// Confirm the credential with the service and return our identity.
    ///
    /// # Errors
    ///
    /// Returns [`RtmError::Auth`] when the service rejects the
    /// credential, [`RtmError::Transport`] on connection failure.
    async fn authenticate(&self) -> Result<AuthIdentity, RtmError>;

    /// Open a real-time session.
    ///
    /// # Errors
    ///
    /// Returns [`RtmError::Transport`] when the session cannot be
    /// established.
    async fn open_session(&self) -> Result<Box<dyn RtmSession>, RtmError>;

    /// Fetch the full user list.
    ///
    /// # Errors
    ///
    /// Returns [`RtmError::Transport`] on lookup failure; callers
    /// treat this as transient and keep previously cached names.
    async fn list_users(&self) -> Result<Vec<User>, RtmError>;
}

/// A live real-time session: an event stream plus a send primitive.
#[async_trait]
pub trait RtmSession: Send + Sync {
    /// Wait for the next inbound event; `None` when the stream ends.
    ///
    /// Must be cancel-safe (no event may be lost when the returned
    /// future is dropped before completion), as the run loop races it
    /// against its shutdown signal and refresh timer.
    async fn next_event(&mut self) -> Option<InboundEvent>;

    /// Send `text` to the given conversation.
    ///
    /// # Errors
    ///
    /// Returns [`RtmError::SessionClosed`] once the session is closed,
    /// [`RtmError::Transport`] on delivery failure.
    async fn send(&self, text: &str, conversation: &str) -> Result<(), RtmError>;

    /// Tear the session down. Implementations must tolerate repeated
    /// calls.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructor_stamps_identity() {
        let a = InboundEvent::message("U1", "C1", "hello");
        let b = InboundEvent::message("U1", "C1", "hello");
        assert_eq!(a.kind, EventKind::Message);
        assert_eq!(a.sender, "U1");
        assert_eq!(a.conversation, "C1");
        assert_eq!(a.text, "hello");
        assert_ne!(a.event_id, b.event_id, "each event gets its own id");
    }

    #[test]
    fn inbound_event_decodes_from_wire_json() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"type":"message","sender":"U123","conversation":"C999","text":"hi"}"#,
        )
        .expect("wire message should decode");
        assert_eq!(event.kind, EventKind::Message);
        assert_eq!(event.sender, "U123");
        assert_eq!(event.conversation, "C999");
        assert_eq!(event.text, "hi");
    }

    #[test]
    fn sparse_wire_event_decodes_with_defaults() {
        // Connection chatter carries no sender or text.
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"other"}"#).expect("sparse event should decode");
        assert_eq!(event.kind, EventKind::Other);
        assert!(event.sender.is_empty());
        assert!(event.text.is_empty());
    }

    #[test]
    fn invalid_auth_kind_decodes() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"type":"invalid_auth"}"#).expect("should decode");
        assert_eq!(event.kind, EventKind::InvalidAuth);
    }
}
