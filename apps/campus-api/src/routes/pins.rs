//! Pin/unpin message endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::message::Message;
use crate::AppState;

use super::messages::MessagePath;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/pins", get(list_pins))
        .route(
            "/groups/{group_id}/pins/{message_id}",
            put(pin_message).delete(unpin_message),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/pins",
    tag = "Pins",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Pinned messages in pin order", body = Vec<Message>),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn list_pins(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.messaging.list_pins(&user, &group_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}/pins/{message_id}",
    tag = "Pins",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    responses(
        (status = 200, description = "Message pinned", body = Message),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn pin_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .pin_message(&user, &path.group_id, &path.message_id)
        .await?;
    Ok(Json(message))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/pins/{message_id}",
    tag = "Pins",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    responses(
        (status = 200, description = "Message unpinned", body = Message),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn unpin_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .unpin_message(&user, &path.group_id, &path.message_id)
        .await?;
    Ok(Json(message))
}
