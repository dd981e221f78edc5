use std::sync::Arc;

use campus_common::id::{prefix, prefixed_ulid};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::db::store::DataStore;
use crate::error::{field_error, ApiError};
use crate::gateway::events::EventType;
use crate::gateway::fanout::FanoutRouter;
use crate::models::announcement::{Announcement, Priority};
use crate::models::notification::{NewNotification, NotificationType};
use crate::models::user::PlatformRole;
use crate::permissions;

use super::notifications::NotificationDispatcher;
use super::{snippet, to_data};

const PREVIEW_LEN: usize = 140;

#[derive(Clone)]
pub struct AnnouncementService {
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
    notifications: NotificationDispatcher,
}

impl AnnouncementService {
    pub fn new(store: Arc<dyn DataStore>, fanout: FanoutRouter, notifications: NotificationDispatcher) -> Self {
        Self {
            store,
            fanout,
            notifications,
        }
    }

    pub async fn list(&self) -> Result<Vec<Announcement>, ApiError> {
        self.store.list_announcements().await
    }

    /// Platform admins only. Urgent announcements also notify every student.
    pub async fn create(
        &self,
        user: &AuthUser,
        title: &str,
        content: &str,
        priority: Priority,
    ) -> Result<Announcement, ApiError> {
        permissions::check_platform_admin(user)?;

        let title = title.trim();
        if title.is_empty() {
            return Err(field_error("title", "Title is required"));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(field_error("content", "Content is required"));
        }

        let announcement = Announcement {
            id: prefixed_ulid(prefix::ANNOUNCEMENT),
            title: title.to_string(),
            content: content.to_string(),
            priority,
            author_id: user.user_id.clone(),
            author_name: user.name.clone(),
            created_at: Utc::now(),
        };
        self.store.put_announcement(announcement.clone()).await?;
        self.fanout
            .to_all(EventType::AnnouncementCreated, to_data(&announcement));

        if priority == Priority::Urgent {
            let students = self.store.list_users().await?;
            let notifications = students
                .into_iter()
                .filter(|u| u.role == PlatformRole::Student)
                .map(|u| {
                    NewNotification::new(
                        u.id,
                        NotificationType::Announcement,
                        format!("Urgent: {}", announcement.title),
                        snippet(&announcement.content, PREVIEW_LEN),
                    )
                    .with_link("/announcements")
                })
                .collect();
            let notified = self.notifications.create_many(notifications).await;
            tracing::info!(announcement_id = %announcement.id, notified, "urgent announcement sent");
        }

        Ok(announcement)
    }
}
