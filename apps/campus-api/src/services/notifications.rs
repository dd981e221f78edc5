//! Durable notifications with immediate best-effort push.

use std::sync::Arc;

use campus_common::id::{prefix, prefixed_ulid};
use chrono::Utc;

use crate::db::store::DataStore;
use crate::error::ApiError;
use crate::gateway::events::EventType;
use crate::gateway::fanout::FanoutRouter;
use crate::models::notification::{NewNotification, Notification};

use super::to_data;

#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DataStore>, fanout: FanoutRouter) -> Self {
        Self { store, fanout }
    }

    /// Persist a notification and push it to the user if connected.
    ///
    /// A notification carrying a preference category is always stored, but
    /// only pushed live when the user has that category switched on. Returns
    /// `Ok(None)` when a categorized notification targets a user that no
    /// longer exists.
    pub async fn create(&self, new: NewNotification) -> Result<Option<Notification>, ApiError> {
        let push = match new.category {
            None => true,
            Some(category) => match self.store.get_user(&new.user_id).await? {
                Some(user) => user.notification_preferences.allows(category),
                None => {
                    tracing::debug!(user_id = %new.user_id, "notification target no longer exists");
                    return Ok(None);
                }
            },
        };

        let notification = Notification {
            id: prefixed_ulid(prefix::NOTIFICATION),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            link: new.link,
            event_id: new.event_id,
            reminder_type: new.reminder_type,
            read: false,
            created_at: Utc::now(),
        };
        self.store.put_notification(notification.clone()).await?;

        if push {
            self.fanout.to_user(
                &notification.user_id,
                EventType::Notification,
                to_data(&notification),
            );
        } else {
            tracing::debug!(user_id = %notification.user_id, "live push suppressed by preference");
        }
        Ok(Some(notification))
    }

    /// Create the same kind of notification for many users. Individual
    /// failures are logged and skipped. Returns how many were created.
    pub async fn create_many(&self, notifications: Vec<NewNotification>) -> usize {
        let mut created = 0;
        for new in notifications {
            let user_id = new.user_id.clone();
            match self.create(new).await {
                Ok(Some(_)) => created += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!(%user_id, %e, "failed to create notification"),
            }
        }
        created
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, ApiError> {
        self.store.list_notifications(user_id).await
    }

    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<Notification, ApiError> {
        let mut notification = self
            .store
            .get_notification(notification_id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("Notification not found"))?;

        if !notification.read {
            notification.read = true;
            self.store.put_notification(notification.clone()).await?;
        }
        Ok(notification)
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<usize, ApiError> {
        let mut changed = 0;
        for mut notification in self.store.list_notifications(user_id).await? {
            if !notification.read {
                notification.read = true;
                self.store.put_notification(notification).await?;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
