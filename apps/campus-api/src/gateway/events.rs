//! Push-channel event types and wire-format frames.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Server → Client frame
// ---------------------------------------------------------------------------

/// Event names pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Notifications,
    Notification,
    AnnouncementCreated,
    EventCreated,
    EventRegistrationUpdate,
    GroupCreated,
    GroupDeleted,
    MemberJoined,
    MemberLeft,
    MemberRoleChanged,
    GroupPostCreated,
    GroupPostDeleted,
    GroupPostLiked,
    MessageCreated,
    MessageEdited,
    MessageDeleted,
    MessageLiked,
    MessageReacted,
    MessagePinned,
    MessageUnpinned,
    TypingUpdate,
}

/// A frame sent from the server to the client: `{ "type": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerFrame {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub data: Value,
}

impl ServerFrame {
    pub fn new(kind: EventType, data: Value) -> Self {
        Self { kind, data }
    }

    /// Serialize once into a WebSocket text message that can be cloned to
    /// every recipient.
    pub fn to_message(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Message::Text(json.into())),
            Err(e) => {
                tracing::error!(?e, kind = ?self.kind, "failed to serialize server frame");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server frame
// ---------------------------------------------------------------------------

/// A frame received from the client. Anything with an unrecognized `type`
/// lands in `Unknown`.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    TypingStart {
        #[serde(rename = "groupId")]
        group_id: String,
    },
    TypingStop {
        #[serde(rename = "groupId")]
        group_id: String,
    },
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// TYPING_UPDATE payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUser {
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdate {
    pub group_id: String,
    pub typing_users: Vec<TypingUser>,
}
