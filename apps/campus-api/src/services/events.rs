//! Campus events and registrations.

use std::sync::Arc;

use campus_common::id::{prefix, prefixed_ulid};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::db::store::DataStore;
use crate::error::{field_error, ApiError};
use crate::gateway::events::EventType;
use crate::gateway::fanout::FanoutRouter;
use crate::models::event::Event;
use crate::models::notification::{NewNotification, NotificationType};
use crate::models::user::PreferenceCategory;
use crate::permissions;

use super::notifications::NotificationDispatcher;
use super::{to_data, RecordLocks};

/// Input for a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<usize>,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
    notifications: NotificationDispatcher,
    locks: RecordLocks,
}

impl EventService {
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

    async fn load(&self, event_id: &str) -> Result<Event, ApiError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Event not found"))
    }

    pub async fn list(&self) -> Result<Vec<Event>, ApiError> {
        self.store.list_events().await
    }

    /// Platform admins only.
    pub async fn create(&self, user: &AuthUser, input: NewEvent) -> Result<Event, ApiError> {
        permissions::check_platform_admin(user)?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(field_error("title", "Title is required"));
        }
        let location = input.location.trim();
        if location.is_empty() {
            return Err(field_error("location", "Location is required"));
        }
        if input.end_time.is_some_and(|end| end < input.start_time) {
            return Err(field_error("endTime", "End time must not precede start time"));
        }
        if input.capacity == Some(0) {
            return Err(field_error("capacity", "Capacity must be positive"));
        }

        let event = Event {
            id: prefixed_ulid(prefix::EVENT),
            title: title.to_string(),
            description: input.description.trim().to_string(),
            location: location.to_string(),
            start_time: input.start_time,
            end_time: input.end_time,
            capacity: input.capacity,
            registered_users: Vec::new(),
            is_cancelled: false,
            created_by: user.user_id.clone(),
            created_at: Utc::now(),
        };
        self.store.put_event(event.clone()).await?;

        tracing::info!(event_id = %event.id, "event created");
        self.fanout.to_all(EventType::EventCreated, to_data(&event));
        Ok(event)
    }

    /// Register the caller and store a confirmation. The confirmation is only
    /// pushed live when their registration preference is on.
    pub async fn register(&self, user: &AuthUser, event_id: &str) -> Result<Event, ApiError> {
        let guard = self.locks.lock(event_id).await;

        let mut event = self.load(event_id).await?;
        if event.is_cancelled {
            return Err(ApiError::bad_request("This event has been cancelled"));
        }
        if event.is_registered(&user.user_id) {
            return Err(ApiError::conflict("Already registered for this event"));
        }
        if event.is_full() {
            return Err(ApiError::conflict("This event is full"));
        }

        event.registered_users.push(user.user_id.clone());
        self.store.put_event(event.clone()).await?;
        self.broadcast_registration(&event);
        drop(guard);

        let confirmation = NewNotification::new(
            user.user_id.clone(),
            NotificationType::Event,
            "Registration confirmed",
            format!("You are registered for \"{}\" at {}", event.title, event.location),
        )
        .with_link(format!("/events/{}", event.id))
        .gated_by(PreferenceCategory::EventRegistration);
        let confirmation = NewNotification {
            event_id: Some(event.id.clone()),
            ..confirmation
        };
        if let Err(e) = self.notifications.create(confirmation).await {
            tracing::warn!(%event_id, user_id = %user.user_id, %e, "failed to send registration confirmation");
        }

        Ok(event)
    }

    pub async fn unregister(&self, user: &AuthUser, event_id: &str) -> Result<Event, ApiError> {
        let _guard = self.locks.lock(event_id).await;

        let mut event = self.load(event_id).await?;
        if !event.is_registered(&user.user_id) {
            return Err(ApiError::not_found("You are not registered for this event"));
        }
        event.registered_users.retain(|id| *id != user.user_id);
        self.store.put_event(event.clone()).await?;
        self.broadcast_registration(&event);
        Ok(event)
    }

    /// Platform admins only. Cancelled events get no further reminders.
    pub async fn cancel(&self, user: &AuthUser, event_id: &str) -> Result<Event, ApiError> {
        permissions::check_platform_admin(user)?;
        let _guard = self.locks.lock(event_id).await;

        let mut event = self.load(event_id).await?;
        if event.is_cancelled {
            return Ok(event);
        }
        event.is_cancelled = true;
        self.store.put_event(event.clone()).await?;

        tracing::info!(%event_id, "event cancelled");
        self.broadcast_registration(&event);
        Ok(event)
    }

    fn broadcast_registration(&self, event: &Event) {
        self.fanout.to_all(
            EventType::EventRegistrationUpdate,
            json!({
                "eventId": event.id,
                "registeredUsers": event.registered_users,
                "registeredCount": event.registered_users.len(),
                "isCancelled": event.is_cancelled,
            }),
        );
    }
}
