//! Per-group typing indicators with automatic expiry.
//!
//! Each (group, user) pair is either idle (no entry) or typing (entry with a
//! running expiry timer). The timer is a spawned task whose handle lives in
//! the entry so it can be aborted on refresh, stop, disconnect or group
//! deletion. A generation number guards against a timer that already fired
//! removing an entry that was refreshed in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::db::store::DataStore;

use super::events::{EventType, TypingUpdate, TypingUser};
use super::fanout::FanoutRouter;

/// How long a `typing_start` stays live without being refreshed.
pub const TYPING_EXPIRY: Duration = Duration::from_secs(3);

type TypingKey = (String, String);

struct TypingEntry {
    user_name: String,
    generation: u64,
    timer: JoinHandle<()>,
}

struct TrackerInner {
    entries: DashMap<TypingKey, TypingEntry>,
    next_generation: AtomicU64,
    expiry: Duration,
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
}

/// Cloneable handle to the typing tracker.
#[derive(Clone)]
pub struct TypingTracker {
    inner: Arc<TrackerInner>,
}

impl TypingTracker {
    pub fn new(store: Arc<dyn DataStore>, fanout: FanoutRouter) -> Self {
        Self::with_expiry(store, fanout, TYPING_EXPIRY)
    }

    pub fn with_expiry(store: Arc<dyn DataStore>, fanout: FanoutRouter, expiry: Duration) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                entries: DashMap::new(),
                next_generation: AtomicU64::new(1),
                expiry,
                store,
                fanout,
            }),
        }
    }

    /// Handle `typing_start`. A repeated start only restarts the timer; the
    /// first one also tells the other members.
    pub async fn typing_start(&self, group_id: &str, user_id: &str, user_name: &str) {
        match self.inner.store.get_group(group_id).await {
            Ok(Some(group)) if group.is_member(user_id) => {}
            Ok(_) => {
                tracing::debug!(%group_id, %user_id, "ignoring typing_start from non-member");
                return;
            }
            Err(e) => {
                tracing::warn!(%group_id, %user_id, ?e, "group lookup failed for typing_start");
                return;
            }
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let timer = self.spawn_expiry(group_id, user_id, generation);
        let key = (group_id.to_string(), user_id.to_string());

        let started = match self.inner.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.timer.abort();
                entry.timer = timer;
                entry.generation = generation;
                entry.user_name = user_name.to_string();
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(TypingEntry {
                    user_name: user_name.to_string(),
                    generation,
                    timer,
                });
                true
            }
        };

        if started {
            self.broadcast(group_id, user_id).await;
        }
    }

    /// Handle `typing_stop`. No-op if the user was not typing.
    pub async fn typing_stop(&self, group_id: &str, user_id: &str) {
        let key = (group_id.to_string(), user_id.to_string());
        if let Some((_, entry)) = self.inner.entries.remove(&key) {
            entry.timer.abort();
            self.broadcast(group_id, user_id).await;
        }
    }

    /// Drop every entry for a user that disconnected, telling each affected
    /// group.
    pub async fn clear_user(&self, user_id: &str) {
        let keys: Vec<TypingKey> = self
            .inner
            .entries
            .iter()
            .filter(|e| e.key().1 == user_id)
            .map(|e| e.key().clone())
            .collect();

        for key in keys {
            if let Some(((group_id, _), entry)) = self.inner.entries.remove(&key) {
                entry.timer.abort();
                self.broadcast(&group_id, user_id).await;
            }
        }
    }

    /// Drop every entry for a deleted group without broadcasting.
    pub fn clear_group(&self, group_id: &str) {
        self.inner.entries.retain(|(g, _), entry| {
            if g == group_id {
                entry.timer.abort();
                false
            } else {
                true
            }
        });
    }

    /// Users currently typing in a group, ordered by user ID.
    pub fn typing_users(&self, group_id: &str) -> Vec<TypingUser> {
        let mut users: Vec<TypingUser> = self
            .inner
            .entries
            .iter()
            .filter(|e| e.key().0 == group_id)
            .map(|e| TypingUser {
                user_id: e.key().1.clone(),
                user_name: e.value().user_name.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }

    pub fn is_typing(&self, group_id: &str, user_id: &str) -> bool {
        self.inner
            .entries
            .contains_key(&(group_id.to_string(), user_id.to_string()))
    }

    fn spawn_expiry(&self, group_id: &str, user_id: &str, generation: u64) -> JoinHandle<()> {
        let weak: Weak<TrackerInner> = Arc::downgrade(&self.inner);
        let expiry = self.inner.expiry;
        let group_id = group_id.to_string();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(expiry).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let tracker = TypingTracker { inner };
            tracker.expire(&group_id, &user_id, generation).await;
        })
    }

    async fn expire(&self, group_id: &str, user_id: &str, generation: u64) {
        let key = (group_id.to_string(), user_id.to_string());
        let removed = self
            .inner
            .entries
            .remove_if(&key, |_, entry| entry.generation == generation)
            .is_some();
        if removed {
            tracing::debug!(%group_id, %user_id, "typing indicator expired");
            self.broadcast(group_id, user_id).await;
        }
    }

    /// Send the group's current typing list to every member except the user
    /// whose state changed. A group that no longer resolves is skipped.
    async fn broadcast(&self, group_id: &str, changed_user: &str) {
        let group = match self.inner.store.get_group(group_id).await {
            Ok(Some(group)) => group,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(%group_id, ?e, "group lookup failed for typing broadcast");
                return;
            }
        };

        let recipients: Vec<String> = group
            .members
            .iter()
            .filter(|m| m.as_str() != changed_user)
            .cloned()
            .collect();

        let update = TypingUpdate {
            group_id: group_id.to_string(),
            typing_users: self.typing_users(group_id),
        };
        let data = match serde_json::to_value(&update) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(?e, "failed to serialize typing update");
                return;
            }
        };

        self.inner
            .fanout
            .to_group(group_id, EventType::TypingUpdate, data, &recipients);
    }
}
