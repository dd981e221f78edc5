use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<usize>,
    pub registered_users: Vec<String>,
    pub is_cancelled: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_registered(&self, user_id: &str) -> bool {
        self.registered_users.iter().any(|u| u == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|cap| self.registered_users.len() >= cap)
    }

    /// Fractional hours from `now` until the event starts (negative once
    /// it has started).
    pub fn hours_until_start(&self, now: DateTime<Utc>) -> f64 {
        (self.start_time - now).num_seconds() as f64 / 3600.0
    }
}
