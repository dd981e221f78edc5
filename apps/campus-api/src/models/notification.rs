use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::PreferenceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Announcement,
    Event,
    Group,
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ReminderType {
    #[serde(rename = "24h")]
    DayBefore,
    #[serde(rename = "1h")]
    HourBefore,
}

impl ReminderType {
    pub fn category(self) -> PreferenceCategory {
        match self {
            Self::DayBefore => PreferenceCategory::EventReminders24h,
            Self::HourBefore => PreferenceCategory::EventReminders1h,
        }
    }

    pub fn lead_time(self) -> &'static str {
        match self {
            Self::DayBefore => "24 hours",
            Self::HourBefore => "1 hour",
        }
    }
}

/// A durable notification. Only `read` changes after creation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<ReminderType>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input to the notification dispatcher.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub event_id: Option<String>,
    pub reminder_type: Option<ReminderType>,
    /// Set for event-related notifications the user may switch off.
    pub category: Option<PreferenceCategory>,
}

impl NewNotification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
            event_id: None,
            reminder_type: None,
            category: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn gated_by(mut self, category: PreferenceCategory) -> Self {
        self.category = Some(category);
        self
    }
}
