use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Platform-wide role, distinct from the per-group role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    Student,
    Admin,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: PlatformRole,
    #[serde(skip)]
    pub password_hash: String,
    pub notification_preferences: NotificationPreferences,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == PlatformRole::Admin
    }
}

/// Per-user switches for event-related notifications.
///
/// Announcement, group and message notifications are not covered and are
/// always delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub event_registration: bool,
    #[serde(rename = "eventReminders24h")]
    pub event_reminders_24h: bool,
    #[serde(rename = "eventReminders1h")]
    pub event_reminders_1h: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            event_registration: true,
            event_reminders_24h: true,
            event_reminders_1h: true,
        }
    }
}

/// The notification categories a user can switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceCategory {
    EventRegistration,
    EventReminders24h,
    EventReminders1h,
}

impl NotificationPreferences {
    pub fn allows(&self, category: PreferenceCategory) -> bool {
        match category {
            PreferenceCategory::EventRegistration => self.event_registration,
            PreferenceCategory::EventReminders24h => self.event_reminders_24h,
            PreferenceCategory::EventReminders1h => self.event_reminders_1h,
        }
    }
}
