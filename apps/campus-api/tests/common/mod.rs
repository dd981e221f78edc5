#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use axum::Router;
use serde_json::Value;
use tokio::sync::mpsc;

use campus_api::auth::middleware::AuthUser;
use campus_api::auth::tokens;
use campus_api::config::Config;
use campus_api::db::kv::{KeyValueStore, MemoryStore};
use campus_api::db::store::{DataStore, MemoryDataStore};
use campus_api::gateway::session::SessionHandle;
use campus_api::models::group::Group;
use campus_api::models::user::{PlatformRole, User};
use campus_api::services::accounts;
use campus_api::AppState;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test AppState over fresh in-memory stores.
pub fn test_state() -> AppState {
    let store: Arc<dyn DataStore> = Arc::new(MemoryDataStore::new());
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    AppState::new(Config::default(), store, kv)
}

/// Build the full application router wired to the test state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = campus_api::routes::router().with_state(state.clone());
    (app, state)
}

/// A registered user with a live access token.
pub struct TestUser {
    pub user: User,
    pub auth: AuthUser,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub async fn create_user(state: &AppState, name: &str, role: PlatformRole) -> TestUser {
    let email = format!("{}@campus.test", name.to_lowercase());
    let user = accounts::register(state.store.as_ref(), &email, name, TEST_PASSWORD, role)
        .await
        .expect("register test user");
    let token = tokens::issue_access_token(state.kv.as_ref(), &user.id)
        .await
        .expect("issue token");
    TestUser {
        auth: AuthUser::from(&user),
        user,
        token,
    }
}

pub async fn student(state: &AppState, name: &str) -> TestUser {
    create_user(state, name, PlatformRole::Student).await
}

pub async fn admin(state: &AppState, name: &str) -> TestUser {
    create_user(state, name, PlatformRole::Admin).await
}

/// Create a group owned by `owner` and add every user in `members`.
pub async fn group_with(state: &AppState, owner: &TestUser, members: &[&TestUser]) -> Group {
    let group = state
        .groups
        .create(&owner.auth, "Robotics Club", Some("Build things"), Some("clubs"))
        .await
        .expect("create group");
    for member in members {
        state
            .groups
            .join(&member.auth, &group.id)
            .await
            .expect("join group");
    }
    state.groups.get(&group.id).await.expect("reload group")
}

/// Register an in-process push session for the user; returns its queue.
pub fn connect(state: &AppState, user: &TestUser) -> mpsc::UnboundedReceiver<Message> {
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .sessions
        .register(SessionHandle::new(user.user.id.clone(), user.user.name.clone(), tx));
    rx
}

/// Every frame currently queued, parsed.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let Message::Text(text) = message {
            frames.push(serde_json::from_str(text.as_str()).expect("frame is JSON"));
        }
    }
    frames
}

/// Frame types in arrival order.
pub fn types(frames: &[Value]) -> Vec<String> {
    frames
        .iter()
        .map(|f| f["type"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Let spawned tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
