//! Per-connection push session handle.

use axum::extract::ws::Message;
use campus_common::id::{prefix, prefixed_ulid};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Sender half of a connection's outbound queue. The connection task owns
/// the receiver and writes whatever arrives to the socket.
pub type OutboundSender = mpsc::UnboundedSender<Message>;

/// The registry's view of one live WebSocket connection.
///
/// Two handles refer to the same connection iff their `connection_id`s
/// match.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Unique connection identifier (`gw_` prefixed ULID).
    pub connection_id: String,
    /// Authenticated user ID.
    pub user_id: String,
    /// Display name cached at handshake time (used for typing indicators).
    pub user_name: String,
    pub connected_at: DateTime<Utc>,
    sender: OutboundSender,
}

impl SessionHandle {
    pub fn new(user_id: String, user_name: String, sender: OutboundSender) -> Self {
        Self {
            connection_id: prefixed_ulid(prefix::CONNECTION),
            user_id,
            user_name,
            connected_at: Utc::now(),
            sender,
        }
    }

    /// Whether the connection task is still draining this handle's queue.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Best-effort enqueue. Returns `false` if the connection is gone.
    pub fn send(&self, message: Message) -> bool {
        self.is_open() && self.sender.send(message).is_ok()
    }
}
