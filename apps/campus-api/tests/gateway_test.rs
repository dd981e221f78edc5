mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use campus_api::models::notification::{NewNotification, NotificationType};
use campus_api::AppState;

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper: start an actual TCP server for WebSocket testing.
async fn start_ws_server() -> (SocketAddr, AppState) {
    let (app, state) = common::test_app();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr, token: &str) -> Ws {
    let url = format!("ws://{addr}/ws?token={token}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Next text frame, parsed. Control frames are skipped.
async fn next_json(ws: &mut Ws) -> Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");
        match msg {
            tungstenite::Message::Text(text) => return serde_json::from_str(&text).expect("parse frame"),
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Wait for a close frame and return its code.
async fn expect_close(ws: &mut Ws) -> u16 {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for close")
            .expect("stream ended")
            .expect("ws read error");
        match msg {
            tungstenite::Message::Close(Some(frame)) => return u16::from(frame.code),
            tungstenite::Message::Close(None) => panic!("close frame without code"),
            _ => continue,
        }
    }
}

/// Next text frame if one arrives within `wait`.
async fn try_next_json(ws: &mut Ws, wait: Duration) -> Option<Value> {
    loop {
        match time::timeout(wait, ws.next()).await {
            Ok(Some(Ok(tungstenite::Message::Text(text)))) => {
                return Some(serde_json::from_str(&text).expect("parse frame"))
            }
            Ok(Some(Ok(tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(tungstenite::Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

/// Connect and consume the handshake `notifications` frame.
async fn connect_ready(addr: SocketAddr, token: &str) -> Ws {
    let mut ws = connect(addr, token).await;
    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "notifications");
    ws
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_rejected_with_policy_violation() {
    let (addr, state) = start_ws_server().await;

    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.expect("ws connect");
    assert_eq!(expect_close(&mut ws).await, 1008);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn invalid_token_is_rejected_before_registration() {
    let (addr, state) = start_ws_server().await;

    let mut ws = connect(addr, "cat_not_a_real_token").await;
    assert_eq!(expect_close(&mut ws).await, 1008);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn handshake_sends_existing_notifications_first() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;
    state
        .notifications
        .create(NewNotification::new(
            alice.id(),
            NotificationType::Group,
            "Welcome",
            "Glad you're here",
        ))
        .await
        .unwrap();

    let mut ws = connect(addr, &alice.token).await;
    let first = next_json(&mut ws).await;
    assert_eq!(first["type"], "notifications");
    let list = first["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Welcome");
    assert!(state.sessions.is_connected(alice.id()));
}

#[tokio::test]
async fn group_mutations_are_pushed_to_connected_members() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;
    let bob = common::student(&state, "Bob").await;
    let group = common::group_with(&state, &alice, &[&bob]).await;

    let mut ws_bob = connect_ready(addr, &bob.token).await;

    let message = state
        .messaging
        .create_message(&alice.auth, &group.id, "see you at 6")
        .await
        .unwrap();
    state
        .messaging
        .like_message(&bob.auth, &group.id, &message.id)
        .await
        .unwrap();

    let created = next_json(&mut ws_bob).await;
    assert_eq!(created["type"], "message_created");
    assert_eq!(created["data"]["content"], "see you at 6");
    let liked = next_json(&mut ws_bob).await;
    assert_eq!(liked["type"], "message_liked");
    assert_eq!(liked["data"]["likes"], 1);
}

#[tokio::test]
async fn typing_is_relayed_to_other_members() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;
    let bob = common::student(&state, "Bob").await;
    let group = common::group_with(&state, &alice, &[&bob]).await;

    let mut ws_alice = connect_ready(addr, &alice.token).await;
    let mut ws_bob = connect_ready(addr, &bob.token).await;

    // Garbage must not take the connection down.
    ws_alice
        .send(tungstenite::Message::Text("not json".into()))
        .await
        .unwrap();
    send_json(&mut ws_alice, json!({ "type": "presence", "status": "away" })).await;
    send_json(&mut ws_alice, json!({ "type": "typing_start", "groupId": group.id })).await;

    let update = next_json(&mut ws_bob).await;
    assert_eq!(update["type"], "typing_update");
    assert_eq!(update["data"]["groupId"], group.id.as_str());
    assert_eq!(update["data"]["typingUsers"][0]["userId"], alice.id());
    assert_eq!(update["data"]["typingUsers"][0]["userName"], "Alice");

    send_json(&mut ws_alice, json!({ "type": "typing_stop", "groupId": group.id })).await;
    let update = next_json(&mut ws_bob).await;
    assert_eq!(update["data"]["typingUsers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn disconnect_clears_typing_state() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;
    let bob = common::student(&state, "Bob").await;
    let group = common::group_with(&state, &alice, &[&bob]).await;

    let mut ws_alice = connect_ready(addr, &alice.token).await;
    let mut ws_bob = connect_ready(addr, &bob.token).await;

    send_json(&mut ws_alice, json!({ "type": "typing_start", "groupId": group.id })).await;
    assert_eq!(next_json(&mut ws_bob).await["type"], "typing_update");

    ws_alice.close(None).await.unwrap();
    let update = next_json(&mut ws_bob).await;
    assert_eq!(update["type"], "typing_update");
    assert_eq!(update["data"]["typingUsers"].as_array().unwrap().len(), 0);

    common::settle().await;
    assert!(!state.sessions.is_connected(alice.id()));
    assert!(!state.typing.is_typing(&group.id, alice.id()));
}

#[tokio::test]
async fn newer_connection_supersedes_older() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;

    let mut first = connect_ready(addr, &alice.token).await;
    let mut second = connect_ready(addr, &alice.token).await;

    assert_eq!(expect_close(&mut first).await, 4005);
    common::settle().await;

    // The replaced connection's teardown left the newer one registered.
    assert_eq!(state.sessions.len(), 1);
    assert!(state.sessions.is_connected(alice.id()));

    state
        .notifications
        .create(NewNotification::new(
            alice.id(),
            NotificationType::Group,
            "Ping",
            "Still here?",
        ))
        .await
        .unwrap();
    let pushed = next_json(&mut second).await;
    assert_eq!(pushed["type"], "notification");
    assert_eq!(pushed["data"]["title"], "Ping");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn catch_up_frame_precedes_live_pushes_under_concurrent_creates() {
    let (addr, state) = start_ws_server().await;
    let alice = common::student(&state, "Alice").await;

    let producer = {
        let state = state.clone();
        let user_id = alice.id().to_string();
        tokio::spawn(async move {
            for i in 0u64.. {
                state
                    .notifications
                    .create(NewNotification::new(
                        user_id.clone(),
                        NotificationType::Group,
                        format!("n{i}"),
                        "body",
                    ))
                    .await
                    .unwrap();
                time::sleep(Duration::from_micros(200)).await;
            }
        })
    };

    for _ in 0..20 {
        let mut ws = connect(addr, &alice.token).await;
        let first = next_json(&mut ws).await;
        assert_eq!(first["type"], "notifications");
        let caught_up: Vec<Value> = first["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].clone())
            .collect();

        // Nothing pushed live may repeat an entry of the catch-up list.
        for _ in 0..3 {
            let Some(frame) = try_next_json(&mut ws, Duration::from_millis(50)).await else {
                break;
            };
            assert_eq!(frame["type"], "notification");
            assert!(!caught_up.contains(&frame["data"]["id"]));
        }
        let _ = ws.close(None).await;
    }

    producer.abort();
}
