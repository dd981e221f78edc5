//! WebSocket upgrade handler and per-connection event loop.
//!
//! Clients connect to `GET /ws?token=<access token>`. After the token is
//! resolved the user's notification list is queued as a `notifications`
//! frame, the connection is registered, and the loop below runs until either
//! side closes or a newer connection for the same user supersedes this one.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time;

use crate::auth::middleware::resolve_token;
use crate::services::to_data;
use crate::AppState;

use super::events::{EventType, ServerFrame};
use super::handler::handle_client_text;
use super::session::SessionHandle;

/// Standard close code for a rejected handshake.
const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// A newer connection for the same user took over.
const CLOSE_SESSION_REPLACED: u16 = 4005;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state, params.token))
}

async fn handle_connection(socket: WebSocket, state: AppState, token: Option<String>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        let _ = send_close(&mut ws_tx, CLOSE_POLICY_VIOLATION, "Missing token").await;
        return;
    };
    let user = match resolve_token(&state, &token).await {
        Ok(user) => user,
        Err(reason) => {
            tracing::debug!(%reason, "push handshake rejected");
            let _ = send_close(&mut ws_tx, CLOSE_POLICY_VIOLATION, reason).await;
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let handle = SessionHandle::new(user.id.clone(), user.name.clone(), tx);
    let connection_id = handle.connection_id.clone();
    let user_id = user.id;
    let user_name = user.name;

    // Catch-up list is queued before the session becomes reachable, so it is
    // the first frame out. Anything created after the load stays durable.
    match state.notifications.list_for_user(&user_id).await {
        Ok(list) => {
            if let Some(message) =
                ServerFrame::new(EventType::Notifications, to_data(&list)).to_message()
            {
                handle.send(message);
            }
        }
        Err(e) => tracing::warn!(%user_id, %e, "failed to load notifications for handshake"),
    }

    // The registry holds the only sender from here on; when it is replaced
    // or removed the queue closes and the loop below ends.
    if state.sessions.register(handle).is_some() {
        tracing::info!(%user_id, %connection_id, "push connection superseded an older one");
    } else {
        tracing::info!(%user_id, %connection_id, "push connection established");
    }

    let mut ping = time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_text(&state.typing, &user_id, &user_name, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, %connection_id, "ws read error");
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }

            outbound = rx.recv() => {
                match outbound {
                    Some(message) => {
                        if ws_tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = send_close(&mut ws_tx, CLOSE_SESSION_REPLACED, "Session replaced").await;
                        break;
                    }
                }
            }

            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }

    // A superseded connection must not disturb its replacement.
    if state.sessions.unregister(&user_id, &connection_id) {
        state.typing.clear_user(&user_id).await;
    }
    tracing::info!(%user_id, %connection_id, "push connection closed");
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
