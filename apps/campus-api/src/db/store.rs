//! Keyed record store consumed by the services.
//!
//! Every lookup returns `Ok(None)` for an absent record; errors are reserved
//! for store faults. Callers that read-modify-write a group or its content
//! hold that record's lock (see `services::RecordLocks`).

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::ApiError;
use crate::models::announcement::Announcement;
use crate::models::event::Event;
use crate::models::group::Group;
use crate::models::message::Message;
use crate::models::notification::Notification;
use crate::models::post::GroupPost;
use crate::models::user::User;

/// In-place edit applied to a stored user while no other write can interleave.
pub type UserUpdate = Box<dyn FnOnce(&mut User) + Send>;

#[async_trait]
pub trait DataStore: Send + Sync {
    // Users
    async fn get_user(&self, id: &str) -> Result<Option<User>, ApiError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    /// Insert a new user, failing with `CONFLICT` if another account already
    /// holds the (lowercased) email. Check and insert are one atomic step.
    async fn insert_user(&self, user: User) -> Result<(), ApiError>;
    /// Apply `update` to the stored user atomically and return the result.
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>, ApiError>;

    // Groups
    async fn get_group(&self, id: &str) -> Result<Option<Group>, ApiError>;
    async fn list_groups(&self) -> Result<Vec<Group>, ApiError>;
    async fn put_group(&self, group: Group) -> Result<(), ApiError>;
    /// Removes the group along with its messages and posts.
    async fn delete_group(&self, id: &str) -> Result<Option<Group>, ApiError>;

    // Messages
    async fn get_message(&self, id: &str) -> Result<Option<Message>, ApiError>;
    /// Messages of a group in creation order.
    async fn list_messages(&self, group_id: &str) -> Result<Vec<Message>, ApiError>;
    async fn put_message(&self, message: Message) -> Result<(), ApiError>;
    async fn delete_message(&self, id: &str) -> Result<Option<Message>, ApiError>;

    // Posts
    async fn get_post(&self, id: &str) -> Result<Option<GroupPost>, ApiError>;
    /// Posts of a group, newest first.
    async fn list_posts(&self, group_id: &str) -> Result<Vec<GroupPost>, ApiError>;
    async fn put_post(&self, post: GroupPost) -> Result<(), ApiError>;
    async fn delete_post(&self, id: &str) -> Result<Option<GroupPost>, ApiError>;

    // Events
    async fn get_event(&self, id: &str) -> Result<Option<Event>, ApiError>;
    /// Events ordered by start time.
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;
    async fn put_event(&self, event: Event) -> Result<(), ApiError>;

    // Announcements
    /// Announcements, newest first.
    async fn list_announcements(&self) -> Result<Vec<Announcement>, ApiError>;
    async fn put_announcement(&self, announcement: Announcement) -> Result<(), ApiError>;

    // Notifications
    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, ApiError>;
    /// A user's notifications, newest first.
    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, ApiError>;
    async fn put_notification(&self, notification: Notification) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Process-lifetime store. Each collection is a `DashMap`; no shard guard
/// is held across an `.await`.
#[derive(Default)]
pub struct MemoryDataStore {
    users: DashMap<String, User>,
    /// Lowercased email to user id.
    emails: DashMap<String, String>,
    groups: DashMap<String, Group>,
    messages: DashMap<String, Message>,
    posts: DashMap<String, GroupPost>,
    events: DashMap<String, Event>,
    announcements: DashMap<String, Announcement>,
    notifications: DashMap<String, Notification>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn values<T: Clone>(map: &DashMap<String, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    map.iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| entry.value().clone())
        .collect()
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, ApiError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let mut users = values(&self.users, |_| true);
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert_user(&self, user: User) -> Result<(), ApiError> {
        // The email entry guard is held until the user row exists, so a
        // concurrent insert for the same email sees it occupied.
        match self.emails.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => Err(ApiError::conflict("An account with this email already exists")),
            Entry::Vacant(vacant) => {
                vacant.insert(user.id.clone());
                self.users.insert(user.id.clone(), user);
                Ok(())
            }
        }
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>, ApiError> {
        Ok(self.users.get_mut(id).map(|mut user| {
            update(user.value_mut());
            user.value().clone()
        }))
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, ApiError> {
        Ok(self.groups.get(id).map(|g| g.clone()))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        let mut groups = values(&self.groups, |_| true);
        groups.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(groups)
    }

    async fn put_group(&self, group: Group) -> Result<(), ApiError> {
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<Option<Group>, ApiError> {
        let removed = self.groups.remove(id).map(|(_, g)| g);
        if removed.is_some() {
            self.messages.retain(|_, m| m.group_id != id);
            self.posts.retain(|_, p| p.group_id != id);
        }
        Ok(removed)
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, ApiError> {
        Ok(self.messages.get(id).map(|m| m.clone()))
    }

    async fn list_messages(&self, group_id: &str) -> Result<Vec<Message>, ApiError> {
        let mut messages = values(&self.messages, |m| m.group_id == group_id);
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn put_message(&self, message: Message) -> Result<(), ApiError> {
        self.messages.insert(message.id.clone(), message);
        Ok(())
    }

    async fn delete_message(&self, id: &str) -> Result<Option<Message>, ApiError> {
        Ok(self.messages.remove(id).map(|(_, m)| m))
    }

    async fn get_post(&self, id: &str) -> Result<Option<GroupPost>, ApiError> {
        Ok(self.posts.get(id).map(|p| p.clone()))
    }

    async fn list_posts(&self, group_id: &str) -> Result<Vec<GroupPost>, ApiError> {
        let mut posts = values(&self.posts, |p| p.group_id == group_id);
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn put_post(&self, post: GroupPost) -> Result<(), ApiError> {
        self.posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn delete_post(&self, id: &str) -> Result<Option<GroupPost>, ApiError> {
        Ok(self.posts.remove(id).map(|(_, p)| p))
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, ApiError> {
        Ok(self.events.get(id).map(|e| e.clone()))
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let mut events = values(&self.events, |_| true);
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(events)
    }

    async fn put_event(&self, event: Event) -> Result<(), ApiError> {
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn list_announcements(&self) -> Result<Vec<Announcement>, ApiError> {
        let mut announcements = values(&self.announcements, |_| true);
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(announcements)
    }

    async fn put_announcement(&self, announcement: Announcement) -> Result<(), ApiError> {
        self.announcements.insert(announcement.id.clone(), announcement);
        Ok(())
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, ApiError> {
        Ok(self.notifications.get(id).map(|n| n.clone()))
    }

    async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, ApiError> {
        let mut notifications = values(&self.notifications, |n| n.user_id == user_id);
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn put_notification(&self, notification: Notification) -> Result<(), ApiError> {
        self.notifications.insert(notification.id.clone(), notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::Group;
    use chrono::Utc;
    use std::collections::{BTreeMap, BTreeSet};

    fn message(id: &str, group_id: &str) -> Message {
        Message {
            id: id.to_string(),
            group_id: group_id.to_string(),
            author_id: "u1".to_string(),
            author_name: "Ada".to_string(),
            author_avatar: None,
            content: "hi".to_string(),
            created_at: Utc::now(),
            edited_at: None,
            likes: 0,
            liked_by: BTreeSet::new(),
            reactions: BTreeMap::new(),
            is_pinned: false,
        }
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            name: "Ada".to_string(),
            avatar: None,
            role: crate::models::user::PlatformRole::Student,
            password_hash: String::new(),
            notification_preferences: Default::default(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn email_index_rejects_duplicates_case_insensitively() {
        let store = MemoryDataStore::new();
        store.insert_user(user("u1", "ada@campus.edu")).await.unwrap();
        let err = store.insert_user(user("u2", "ADA@campus.edu")).await.unwrap_err();
        assert_eq!(err.code, "CONFLICT");
        assert!(store.get_user("u2").await.unwrap().is_none());
        assert_eq!(store.find_user_by_email("Ada@Campus.edu").await.unwrap().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn update_user_applies_in_place() {
        let store = MemoryDataStore::new();
        store.insert_user(user("u1", "ada@campus.edu")).await.unwrap();
        let updated = store
            .update_user("u1", Box::new(|u: &mut User| u.name = "Ada L".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Ada L");
        assert!(store
            .update_user("nope", Box::new(|_: &mut User| {}))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn absent_records_are_none() {
        let store = MemoryDataStore::new();
        assert!(store.get_group("nope").await.unwrap().is_none());
        assert!(store.get_message("nope").await.unwrap().is_none());
        assert!(store.delete_post("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_group_removes_its_content() {
        let store = MemoryDataStore::new();
        let group = Group::new("g1".into(), "G".into(), String::new(), None, "u1");
        store.put_group(group).await.unwrap();
        store.put_message(message("m1", "g1")).await.unwrap();
        store.put_message(message("m2", "g2")).await.unwrap();

        assert!(store.delete_group("g1").await.unwrap().is_some());
        assert!(store.get_message("m1").await.unwrap().is_none());
        assert!(store.get_message("m2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn messages_list_in_creation_order() {
        let store = MemoryDataStore::new();
        let mut first = message("m_b", "g1");
        first.created_at = Utc::now() - chrono::Duration::seconds(10);
        store.put_message(message("m_a", "g1")).await.unwrap();
        store.put_message(first).await.unwrap();

        let ids: Vec<String> = store
            .list_messages("g1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m_b".to_string(), "m_a".to_string()]);
    }
}
