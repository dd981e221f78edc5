//! Session registry: at most one live push connection per user.

use axum::extract::ws::Message;
use dashmap::DashMap;

use super::session::SessionHandle;

/// Shared registry of live push sessions, keyed by user ID.
///
/// Uses `DashMap` for shard-level concurrency; no guard is held while a
/// caller awaits.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Store the handle for its user, last writer wins. Returns the handle it
    /// replaced, if any. The replaced connection is not closed here.
    pub fn register(&self, handle: SessionHandle) -> Option<SessionHandle> {
        self.sessions.insert(handle.user_id.clone(), handle)
    }

    /// Remove the user's entry only if it still belongs to `connection_id`.
    /// Returns whether an entry was removed.
    pub fn unregister(&self, user_id: &str, connection_id: &str) -> bool {
        self.sessions
            .remove_if(user_id, |_, handle| handle.connection_id == connection_id)
            .is_some()
    }

    /// Deliver to the user's connection if it is registered and open;
    /// otherwise drop the message.
    pub fn send_to_user(&self, user_id: &str, message: Message) -> bool {
        let Some(handle) = self.sessions.get(user_id).map(|h| h.clone()) else {
            return false;
        };
        let delivered = handle.send(message);
        if !delivered {
            tracing::debug!(%user_id, connection_id = %handle.connection_id, "dropping push for closed session");
        }
        delivered
    }

    /// Deliver to every registered connection. Returns the number reached.
    pub fn send_to_all(&self, message: &Message) -> usize {
        let handles: Vec<SessionHandle> = self.sessions.iter().map(|h| h.value().clone()).collect();
        handles.iter().filter(|h| h.send(message.clone())).count()
    }

    pub fn get(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions.get(user_id).map(|h| h.clone())
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.sessions.get(user_id).is_some_and(|h| h.is_open())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(user_id: &str) -> (SessionHandle, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            SessionHandle::new(user_id.to_string(), user_id.to_uppercase(), tx),
            rx,
        )
    }

    fn text(s: &str) -> Message {
        Message::Text(s.to_string().into())
    }

    #[test]
    fn register_and_send() {
        let registry = SessionRegistry::new();
        let (h, mut rx) = handle("u1");
        registry.register(h);

        assert!(registry.send_to_user("u1", text("hello")));
        assert_eq!(rx.try_recv().unwrap(), text("hello"));
        assert!(registry.is_connected("u1"));
    }

    #[test]
    fn send_to_unknown_user_is_dropped() {
        let registry = SessionRegistry::new();
        assert!(!registry.send_to_user("ghost", text("hello")));
    }

    #[test]
    fn send_to_closed_transport_is_dropped() {
        let registry = SessionRegistry::new();
        let (h, rx) = handle("u1");
        registry.register(h);
        drop(rx);

        assert!(!registry.send_to_user("u1", text("hello")));
        assert!(!registry.is_connected("u1"));
    }

    #[test]
    fn newer_registration_replaces_older() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = handle("u1");
        let (b, mut rx_b) = handle("u1");
        let a_id = a.connection_id.clone();

        registry.register(a);
        let replaced = registry.register(b).unwrap();
        assert_eq!(replaced.connection_id, a_id);
        assert_eq!(registry.len(), 1);

        registry.send_to_user("u1", text("to b"));
        assert_eq!(rx_b.try_recv().unwrap(), text("to b"));
    }

    #[test]
    fn closing_replaced_connection_keeps_newer_entry() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = handle("u1");
        let (b, _rx_b) = handle("u1");
        let a_id = a.connection_id.clone();
        let b_id = b.connection_id.clone();

        registry.register(a);
        registry.register(b);

        // A's close event arrives after B took over.
        assert!(!registry.unregister("u1", &a_id));
        assert_eq!(registry.get("u1").unwrap().connection_id, b_id);

        assert!(registry.unregister("u1", &b_id));
        assert!(registry.get("u1").is_none());
    }

    #[test]
    fn send_to_all_counts_open_sessions() {
        let registry = SessionRegistry::new();
        let (a, mut rx_a) = handle("u1");
        let (b, rx_b) = handle("u2");
        registry.register(a);
        registry.register(b);
        drop(rx_b);

        assert_eq!(registry.send_to_all(&text("all")), 1);
        assert_eq!(rx_a.try_recv().unwrap(), text("all"));
    }
}
