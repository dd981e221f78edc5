pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::kv::KeyValueStore;
use db::store::DataStore;
use gateway::fanout::FanoutRouter;
use gateway::registry::SessionRegistry;
use gateway::typing::TypingTracker;
use services::announcements::AnnouncementService;
use services::events::EventService;
use services::groups::GroupDirectory;
use services::messaging::GroupMessaging;
use services::notifications::NotificationDispatcher;
use services::reminders::ReminderSweep;
use services::RecordLocks;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub kv: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub fanout: FanoutRouter,
    pub typing: TypingTracker,
    pub notifications: NotificationDispatcher,
    pub messaging: GroupMessaging,
    pub groups: GroupDirectory,
    pub events: EventService,
    pub announcements: AnnouncementService,
    pub reminders: Arc<ReminderSweep>,
}

impl AppState {
    /// Wire every service over one store and one session registry.
    pub fn new(config: Config, store: Arc<dyn DataStore>, kv: Arc<dyn KeyValueStore>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let fanout = FanoutRouter::new(sessions.clone());
        let typing = TypingTracker::new(store.clone(), fanout.clone());
        let notifications = NotificationDispatcher::new(store.clone(), fanout.clone());
        let locks = RecordLocks::new();

        Self {
            messaging: GroupMessaging::new(store.clone(), fanout.clone(), notifications.clone(), locks.clone()),
            groups: GroupDirectory::new(store.clone(), fanout.clone(), typing.clone(), locks.clone()),
            events: EventService::new(store.clone(), fanout.clone(), notifications.clone(), locks),
            announcements: AnnouncementService::new(store.clone(), fanout.clone(), notifications.clone()),
            reminders: Arc::new(ReminderSweep::new(store.clone(), notifications.clone())),
            store,
            kv,
            config: Arc::new(config),
            sessions,
            fanout,
            typing,
            notifications,
        }
    }
}
