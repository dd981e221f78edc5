//! Group messaging: chat messages, pins, reactions and the group post feed.
//!
//! Every mutation runs under the group's lock: load, check, mutate, persist,
//! then fan out to the group's members. Members therefore observe mutations
//! of one group in the order they were applied.

use std::sync::Arc;

use campus_common::id::{prefix, prefixed_ulid};
use chrono::Utc;
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::db::store::DataStore;
use crate::error::{field_error, ApiError};
use crate::gateway::events::EventType;
use crate::gateway::fanout::FanoutRouter;
use crate::models::group::Group;
use crate::models::message::Message;
use crate::models::notification::{NewNotification, NotificationType};
use crate::models::post::GroupPost;
use crate::permissions::{self, DELETE_MESSAGES, DELETE_POSTS, EDIT_MESSAGES, MANAGE_PINS};

use super::notifications::NotificationDispatcher;
use super::{snippet, to_data, RecordLocks};

pub const MAX_CONTENT_LEN: usize = 4000;
pub const MAX_EMOJI_LEN: usize = 32;
const POST_PREVIEW_LEN: usize = 100;

/// Trimmed, non-empty, bounded message or post body.
fn validate_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(field_error("content", "Content must not be empty"));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(field_error(
            "content",
            format!("Content must be at most {MAX_CONTENT_LEN} characters"),
        ));
    }
    Ok(content.to_string())
}

fn validate_emoji(emoji: &str) -> Result<String, ApiError> {
    let emoji = emoji.trim();
    if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LEN {
        return Err(field_error(
            "emoji",
            format!("Emoji must be 1-{MAX_EMOJI_LEN} characters"),
        ));
    }
    Ok(emoji.to_string())
}

#[derive(Clone)]
pub struct GroupMessaging {
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
    notifications: NotificationDispatcher,
    locks: RecordLocks,
}

impl GroupMessaging {
    pub fn new(
        store: Arc<dyn DataStore>,
        fanout: FanoutRouter,
        notifications: NotificationDispatcher,
        locks: RecordLocks,
    ) -> Self {
        Self {
            store,
            fanout,
            notifications,
            locks,
        }
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, ApiError> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Group not found"))
    }

    async fn load_message(&self, group_id: &str, message_id: &str) -> Result<Message, ApiError> {
        self.store
            .get_message(message_id)
            .await?
            .filter(|m| m.group_id == group_id)
            .ok_or_else(|| ApiError::not_found("Message not found"))
    }

    async fn load_post(&self, group_id: &str, post_id: &str) -> Result<GroupPost, ApiError> {
        self.store
            .get_post(post_id)
            .await?
            .filter(|p| p.group_id == group_id)
            .ok_or_else(|| ApiError::not_found("Post not found"))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list_messages(&self, user: &AuthUser, group_id: &str) -> Result<Vec<Message>, ApiError> {
        let group = self.load_group(group_id).await?;
        if !user.is_admin() {
            permissions::check_member(&group, user)?;
        }
        self.store.list_messages(group_id).await
    }

    /// Pinned messages in pin order.
    pub async fn list_pins(&self, user: &AuthUser, group_id: &str) -> Result<Vec<Message>, ApiError> {
        let group = self.load_group(group_id).await?;
        if !user.is_admin() {
            permissions::check_member(&group, user)?;
        }
        let mut pinned = Vec::with_capacity(group.pinned_messages.len());
        for id in &group.pinned_messages {
            if let Some(message) = self.store.get_message(id).await? {
                pinned.push(message);
            }
        }
        Ok(pinned)
    }

    pub async fn list_posts(&self, group_id: &str) -> Result<Vec<GroupPost>, ApiError> {
        self.load_group(group_id).await?;
        self.store.list_posts(group_id).await
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    pub async fn create_message(&self, user: &AuthUser, group_id: &str, content: &str) -> Result<Message, ApiError> {
        let content = validate_content(content)?;
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        permissions::check_member(&group, user)?;

        let now = Utc::now();
        let message = Message {
            id: prefixed_ulid(prefix::MESSAGE),
            group_id: group_id.to_string(),
            author_id: user.user_id.clone(),
            author_name: user.name.clone(),
            author_avatar: user.avatar.clone(),
            content,
            created_at: now,
            edited_at: None,
            likes: 0,
            liked_by: Default::default(),
            reactions: Default::default(),
            is_pinned: false,
        };
        self.store.put_message(message.clone()).await?;

        group.record_message(now);
        let members = group.member_list();
        self.store.put_group(group).await?;

        self.fanout
            .to_group(group_id, EventType::MessageCreated, to_data(&message), &members);
        Ok(message)
    }

    pub async fn edit_message(
        &self,
        user: &AuthUser,
        group_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let content = validate_content(content)?;
        let _guard = self.locks.lock(group_id).await;

        let group = self.load_group(group_id).await?;
        let mut message = self.load_message(group_id, message_id).await?;
        permissions::check_author_or_role(&group, user, &message.author_id, EDIT_MESSAGES)?;

        message.content = content;
        message.edited_at = Some(Utc::now());
        self.store.put_message(message.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::MessageEdited,
            to_data(&message),
            &group.member_list(),
        );
        Ok(message)
    }

    /// Deleting a pinned message also drops it from the group's pin list.
    pub async fn delete_message(&self, user: &AuthUser, group_id: &str, message_id: &str) -> Result<(), ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        let message = self.load_message(group_id, message_id).await?;
        permissions::check_author_or_role(&group, user, &message.author_id, DELETE_MESSAGES)?;

        self.store.delete_message(message_id).await?;
        group.forget_message(message_id);
        let members = group.member_list();
        self.store.put_group(group).await?;

        self.fanout.to_group(
            group_id,
            EventType::MessageDeleted,
            json!({ "messageId": message_id, "groupId": group_id }),
            &members,
        );
        Ok(())
    }

    /// Toggle the caller's like.
    pub async fn like_message(&self, user: &AuthUser, group_id: &str, message_id: &str) -> Result<Message, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let group = self.load_group(group_id).await?;
        permissions::check_member(&group, user)?;
        let mut message = self.load_message(group_id, message_id).await?;

        message.toggle_like(&user.user_id);
        self.store.put_message(message.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::MessageLiked,
            to_data(&message),
            &group.member_list(),
        );
        Ok(message)
    }

    /// Toggle the caller's reaction with `emoji`.
    pub async fn react_to_message(
        &self,
        user: &AuthUser,
        group_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Message, ApiError> {
        let emoji = validate_emoji(emoji)?;
        let _guard = self.locks.lock(group_id).await;

        let group = self.load_group(group_id).await?;
        permissions::check_member(&group, user)?;
        let mut message = self.load_message(group_id, message_id).await?;

        message.toggle_reaction(&emoji, &user.user_id);
        self.store.put_message(message.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::MessageReacted,
            to_data(&message),
            &group.member_list(),
        );
        Ok(message)
    }

    /// Idempotent. Nothing is broadcast when the message was already pinned.
    pub async fn pin_message(&self, user: &AuthUser, group_id: &str, message_id: &str) -> Result<Message, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        permissions::check_group_role(&group, user, MANAGE_PINS)?;
        let mut message = self.load_message(group_id, message_id).await?;

        let listed = group.pinned_messages.iter().any(|id| id == message_id);
        if message.is_pinned && listed {
            return Ok(message);
        }

        message.is_pinned = true;
        group.pin(message_id);
        self.store.put_message(message.clone()).await?;
        self.persist_pins(group, EventType::MessagePinned, &message).await?;
        Ok(message)
    }

    /// Idempotent. Nothing is broadcast when the message was not pinned.
    pub async fn unpin_message(&self, user: &AuthUser, group_id: &str, message_id: &str) -> Result<Message, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        permissions::check_group_role(&group, user, MANAGE_PINS)?;
        let mut message = self.load_message(group_id, message_id).await?;

        let listed = group.pinned_messages.iter().any(|id| id == message_id);
        if !message.is_pinned && !listed {
            return Ok(message);
        }

        message.is_pinned = false;
        group.unpin(message_id);
        self.store.put_message(message.clone()).await?;
        self.persist_pins(group, EventType::MessageUnpinned, &message).await?;
        Ok(message)
    }

    async fn persist_pins(&self, group: Group, kind: EventType, message: &Message) -> Result<(), ApiError> {
        let members = group.member_list();
        let data = json!({
            "groupId": group.id,
            "message": to_data(message),
            "pinnedMessages": group.pinned_messages,
        });
        let group_id = group.id.clone();
        self.store.put_group(group).await?;
        self.fanout.to_group(&group_id, kind, data, &members);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Publish a post and notify every other member.
    pub async fn create_post(&self, user: &AuthUser, group_id: &str, content: &str) -> Result<GroupPost, ApiError> {
        let content = validate_content(content)?;
        let guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        permissions::check_member(&group, user)?;

        let now = Utc::now();
        let post = GroupPost {
            id: prefixed_ulid(prefix::POST),
            group_id: group_id.to_string(),
            author_id: user.user_id.clone(),
            author_name: user.name.clone(),
            author_avatar: user.avatar.clone(),
            content,
            created_at: now,
            likes: 0,
            liked_by: Default::default(),
        };
        self.store.put_post(post.clone()).await?;

        group.record_post(now);
        let members = group.member_list();
        let group_name = group.name.clone();
        self.store.put_group(group).await?;

        self.fanout
            .to_group(group_id, EventType::GroupPostCreated, to_data(&post), &members);
        drop(guard);

        let title = format!("New post in {group_name}");
        let body = format!("{}: {}", user.name, snippet(&post.content, POST_PREVIEW_LEN));
        let link = format!("/groups/{group_id}");
        let notifications = members
            .into_iter()
            .filter(|member| *member != user.user_id)
            .map(|member| {
                NewNotification::new(member, NotificationType::Group, title.clone(), body.clone())
                    .with_link(link.clone())
            })
            .collect();
        self.notifications.create_many(notifications).await;

        Ok(post)
    }

    pub async fn delete_post(&self, user: &AuthUser, group_id: &str, post_id: &str) -> Result<(), ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load_group(group_id).await?;
        let post = self.load_post(group_id, post_id).await?;
        permissions::check_author_or_role(&group, user, &post.author_id, DELETE_POSTS)?;

        self.store.delete_post(post_id).await?;
        group.forget_post();
        let members = group.member_list();
        self.store.put_group(group).await?;

        self.fanout.to_group(
            group_id,
            EventType::GroupPostDeleted,
            json!({ "postId": post_id, "groupId": group_id }),
            &members,
        );
        Ok(())
    }

    pub async fn like_post(&self, user: &AuthUser, group_id: &str, post_id: &str) -> Result<GroupPost, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let group = self.load_group(group_id).await?;
        permissions::check_member(&group, user)?;
        let mut post = self.load_post(group_id, post_id).await?;

        post.toggle_like(&user.user_id);
        self.store.put_post(post.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::GroupPostLiked,
            to_data(&post),
            &group.member_list(),
        );
        Ok(post)
    }
}
