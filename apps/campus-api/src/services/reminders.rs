//! Periodic event-reminder sweep.
//!
//! Each pass looks at every non-cancelled event and, for events whose start
//! falls inside a reminder window, notifies each registered user once per
//! (event, user, window). Sent markers live in memory and reset on restart.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::db::store::DataStore;
use crate::error::ApiError;
use crate::models::event::Event;
use crate::models::notification::{NewNotification, NotificationType, ReminderType};

use super::notifications::NotificationDispatcher;

/// Open interval of hours-until-start for the day-before reminder.
const DAY_BEFORE_WINDOW: (f64, f64) = (23.9, 24.1);
/// Open interval of hours-until-start for the hour-before reminder.
const HOUR_BEFORE_WINDOW: (f64, f64) = (0.9, 1.1);

/// Which reminder, if any, is due for an event starting in `hours`.
pub fn reminder_due(hours: f64) -> Option<ReminderType> {
    let within = |(lo, hi): (f64, f64)| hours > lo && hours < hi;
    if within(DAY_BEFORE_WINDOW) {
        Some(ReminderType::DayBefore)
    } else if within(HOUR_BEFORE_WINDOW) {
        Some(ReminderType::HourBefore)
    } else {
        None
    }
}

type ReminderKey = (String, String, ReminderType);

pub struct ReminderSweep {
    store: Arc<dyn DataStore>,
    notifications: NotificationDispatcher,
    sent: Mutex<HashSet<ReminderKey>>,
}

impl ReminderSweep {
    pub fn new(store: Arc<dyn DataStore>, notifications: NotificationDispatcher) -> Self {
        Self {
            store,
            notifications,
            sent: Mutex::new(HashSet::new()),
        }
    }

    /// Run one pass as of `now`. Returns the number of reminders created.
    pub async fn run_once(&self, now: DateTime<Utc>) -> usize {
        let events = match self.store.list_events().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(%e, "reminder sweep could not list events");
                return 0;
            }
        };

        let mut created = 0;
        for event in events.iter().filter(|e| !e.is_cancelled) {
            let Some(reminder_type) = reminder_due(event.hours_until_start(now)) else {
                continue;
            };
            for user_id in &event.registered_users {
                match self.remind(event, user_id, reminder_type).await {
                    Ok(true) => created += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(event_id = %event.id, %user_id, %e, "failed to send reminder");
                    }
                }
            }
        }

        if created > 0 {
            tracing::info!(created, "reminder sweep sent notifications");
        }
        created
    }

    async fn remind(&self, event: &Event, user_id: &str, reminder_type: ReminderType) -> Result<bool, ApiError> {
        let key = (event.id.clone(), user_id.to_string(), reminder_type);
        if self.sent.lock().contains(&key) {
            return Ok(false);
        }

        let Some(user) = self.store.get_user(user_id).await? else {
            tracing::warn!(event_id = %event.id, %user_id, "registered user no longer exists");
            return Ok(false);
        };
        if !user.notification_preferences.allows(reminder_type.category()) {
            return Ok(false);
        }

        let reminder = NewNotification {
            event_id: Some(event.id.clone()),
            reminder_type: Some(reminder_type),
            ..NewNotification::new(
                user_id,
                NotificationType::Reminder,
                format!("Reminder: {}", event.title),
                format!(
                    "\"{}\" starts in {} at {}",
                    event.title,
                    reminder_type.lead_time(),
                    event.location
                ),
            )
            .with_link(format!("/events/{}", event.id))
            .gated_by(reminder_type.category())
        };

        if self.notifications.create(reminder).await?.is_some() {
            self.sent.lock().insert(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Run the sweep every `interval` until the runtime shuts down.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.run_once(Utc::now()).await;
            }
        })
    }
}
