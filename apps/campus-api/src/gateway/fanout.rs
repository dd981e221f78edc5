//! Fan-out router for dispatching push events to connected sessions.
//!
//! Each call serializes the frame once and enqueues it on every target
//! connection's outbound queue before returning, so a recipient sees events
//! in the order they were submitted. Recipients are not ordered relative to
//! one another. Offline users are skipped.

use std::sync::Arc;

use serde_json::Value;

use super::events::{EventType, ServerFrame};
use super::registry::SessionRegistry;

/// Cloneable handle to the router; store in AppState.
#[derive(Clone)]
pub struct FanoutRouter {
    registry: Arc<SessionRegistry>,
}

impl FanoutRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Push an event to one user. Returns whether it was delivered.
    pub fn to_user(&self, user_id: &str, kind: EventType, data: Value) -> bool {
        match ServerFrame::new(kind, data).to_message() {
            Some(message) => self.registry.send_to_user(user_id, message),
            None => false,
        }
    }

    /// Push an event to the given members of a group. Membership is resolved
    /// by the caller. Returns the number of sessions reached.
    pub fn to_group(&self, group_id: &str, kind: EventType, data: Value, members: &[String]) -> usize {
        let Some(message) = ServerFrame::new(kind, data).to_message() else {
            return 0;
        };
        let delivered = members
            .iter()
            .filter(|user_id| self.registry.send_to_user(user_id, message.clone()))
            .count();
        tracing::debug!(%group_id, ?kind, recipients = members.len(), delivered, "group fan-out");
        delivered
    }

    /// Push an event to every connected session.
    pub fn to_all(&self, kind: EventType, data: Value) -> usize {
        match ServerFrame::new(kind, data).to_message() {
            Some(message) => self.registry.send_to_all(&message),
            None => 0,
        }
    }
}
