mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Health and auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "dana@campus.test", "name": "Dana", "password": "hunter2hunter2" }))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("passwordHash").is_none());

    let resp = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "DANA@campus.test", "password": "hunter2hunter2" }))
        .await;
    resp.assert_status_ok();
    let token = resp.json::<Value>()["accessToken"].as_str().unwrap().to_string();

    let resp = server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["email"], "dana@campus.test");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let alice = common::student(&state, "Alice").await;

    server
        .post("/api/v1/auth/logout")
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/v1/users/@me")
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/v1/auth/logout")
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_login_is_unauthorized() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    common::student(&state, "Eve").await;

    let resp = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "eve@campus.test", "password": "not-the-password" }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    server.get("/api/v1/groups").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/v1/notifications")
        .add_header(AUTHORIZATION, "Bearer cat_bogus")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn validation_errors_carry_field_details() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/auth/register")
        .json(&json!({ "email": "bad", "name": "X", "password": "short" }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preferences_round_trip() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let alice = common::student(&state, "Alice").await;

    let resp = server
        .get("/api/v1/users/@me/preferences")
        .add_header(AUTHORIZATION, alice.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(
        resp.json::<Value>(),
        json!({ "eventRegistration": true, "eventReminders24h": true, "eventReminders1h": true })
    );

    let resp = server
        .put("/api/v1/users/@me/preferences")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({ "eventRegistration": true, "eventReminders24h": false, "eventReminders1h": true }))
        .await;
    resp.assert_status_ok();

    let stored = state.store.get_user(alice.id()).await.unwrap().unwrap();
    assert!(!stored.notification_preferences.event_reminders_24h);
}

// ---------------------------------------------------------------------------
// Groups and messaging over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn group_chat_flow() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let alice = common::student(&state, "Alice").await;
    let bob = common::student(&state, "Bob").await;

    let resp = server
        .post("/api/v1/groups")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({ "name": "Hiking", "description": "Weekend trails" }))
        .await;
    resp.assert_status_ok();
    let group_id = resp.json::<Value>()["id"].as_str().unwrap().to_string();

    // Bob is not a member yet.
    server
        .post(&format!("/api/v1/groups/{group_id}/messages"))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "content": "hi" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let resp = server
        .post(&format!("/api/v1/groups/{group_id}/join"))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["memberCount"], 2);

    let resp = server
        .post(&format!("/api/v1/groups/{group_id}/messages"))
        .add_header(AUTHORIZATION, bob.bearer())
        .json(&json!({ "content": "Saturday?" }))
        .await;
    resp.assert_status_ok();
    let message_id = resp.json::<Value>()["id"].as_str().unwrap().to_string();

    let resp = server
        .post(&format!("/api/v1/groups/{group_id}/messages/{message_id}/reactions"))
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({ "emoji": "👍" }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["reactions"]["👍"][0], alice.id());

    server
        .put(&format!("/api/v1/groups/{group_id}/pins/{message_id}"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status_ok();

    let resp = server
        .get(&format!("/api/v1/groups/{group_id}/pins"))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>().as_array().unwrap().len(), 1);

    let resp = server
        .get(&format!("/api/v1/groups/{group_id}/messages"))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    let messages: Value = resp.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["isPinned"], true);

    server
        .delete(&format!("/api/v1/groups/{group_id}/messages/{message_id}"))
        .add_header(AUTHORIZATION, bob.bearer())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let resp = server
        .get(&format!("/api/v1/groups/{group_id}"))
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    let group: Value = resp.json();
    assert_eq!(group["pinnedMessages"].as_array().unwrap().len(), 0);
    assert_eq!(group["messagesCount"], 0);

    server
        .post(&format!("/api/v1/groups/{group_id}/leave"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn posts_and_notifications_over_http() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let alice = common::student(&state, "Alice").await;
    let bob = common::student(&state, "Bob").await;
    let group = common::group_with(&state, &alice, &[&bob]).await;

    let resp = server
        .post(&format!("/api/v1/groups/{}/posts", group.id))
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&json!({ "content": "Dues are due" }))
        .await;
    resp.assert_status_ok();

    let resp = server
        .get("/api/v1/notifications")
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    let list: Value = resp.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["type"], "group");
    let notification_id = list[0]["id"].as_str().unwrap().to_string();

    // Alice cannot mark Bob's notification.
    server
        .post(&format!("/api/v1/notifications/{notification_id}/read"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let resp = server
        .post("/api/v1/notifications/read-all")
        .add_header(AUTHORIZATION, bob.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["updated"], 1);
}

// ---------------------------------------------------------------------------
// Events and announcements
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_admins_create_events_and_students_register() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let admin = common::admin(&state, "Admin").await;
    let alice = common::student(&state, "Alice").await;

    let payload = json!({
        "title": "Hackathon",
        "location": "Engineering Atrium",
        "startTime": "2030-03-01T09:00:00Z",
        "capacity": 50
    });

    server
        .post("/api/v1/events")
        .add_header(AUTHORIZATION, alice.bearer())
        .json(&payload)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let resp = server
        .post("/api/v1/events")
        .add_header(AUTHORIZATION, admin.bearer())
        .json(&payload)
        .await;
    resp.assert_status_ok();
    let event_id = resp.json::<Value>()["id"].as_str().unwrap().to_string();

    let resp = server
        .post(&format!("/api/v1/events/{event_id}/registration"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["registeredUsers"][0], alice.id());

    server
        .post(&format!("/api/v1/events/{event_id}/registration"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .post(&format!("/api/v1/events/{event_id}/cancel"))
        .add_header(AUTHORIZATION, admin.bearer())
        .await
        .assert_status_ok();

    server
        .delete(&format!("/api/v1/events/{event_id}/registration"))
        .add_header(AUTHORIZATION, alice.bearer())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn announcement_priority_defaults_to_normal() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let admin = common::admin(&state, "Admin").await;

    let resp = server
        .post("/api/v1/announcements")
        .add_header(AUTHORIZATION, admin.bearer())
        .json(&json!({ "title": "Welcome", "content": "Semester starts Monday" }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>()["priority"], "normal");

    let resp = server
        .get("/api/v1/announcements")
        .add_header(AUTHORIZATION, admin.bearer())
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<Value>().as_array().unwrap().len(), 1);
}
