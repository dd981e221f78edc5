//! Domain services. Each mutating operation validates, mutates the store,
//! then pushes the resulting event through the fan-out router.

pub mod accounts;
pub mod announcements;
pub mod events;
pub mod groups;
pub mod messaging;
pub mod notifications;
pub mod reminders;

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-record async locks serializing read-modify-write sequences on one
/// group (and its messages and posts) or one event.
#[derive(Clone, Default)]
pub struct RecordLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(id.to_string()).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the lock for a record that no longer exists.
    pub fn forget(&self, id: &str) {
        self.locks.remove(id);
    }
}

/// Serialize a payload for a push frame.
pub(crate) fn to_data<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(?e, "failed to serialize push payload");
        Value::Null
    })
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub(crate) fn snippet(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
