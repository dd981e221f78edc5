//! Group chat message endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::message::Message;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/groups/{group_id}/messages",
            get(list_messages).post(send_message),
        )
        .route(
            "/groups/{group_id}/messages/{message_id}",
            patch(edit_message).delete(delete_message),
        )
        .route(
            "/groups/{group_id}/messages/{message_id}/like",
            post(like_message),
        )
        .route(
            "/groups/{group_id}/messages/{message_id}/reactions",
            post(react_to_message),
        )
}

#[derive(Debug, Deserialize)]
pub struct MessagePath {
    pub group_id: String,
    pub message_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReactionRequest {
    pub emoji: String,
}

// ---------------------------------------------------------------------------
// GET/POST /api/v1/groups/:group_id/messages
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/messages",
    tag = "Messages",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Messages in creation order", body = Vec<Message>),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn list_messages(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.messaging.list_messages(&user, &group_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/messages",
    tag = "Messages",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = Message),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn send_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .create_message(&user, &group_id, &body.content)
        .await?;
    Ok(Json(message))
}

// ---------------------------------------------------------------------------
// PATCH/DELETE /api/v1/groups/:group_id/messages/:message_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/v1/groups/{group_id}/messages/{message_id}",
    tag = "Messages",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    request_body = EditMessageRequest,
    responses(
        (status = 200, description = "Message edited", body = Message),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn edit_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
    Json(body): Json<EditMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .edit_message(&user, &path.group_id, &path.message_id, &body.content)
        .await?;
    Ok(Json(message))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/messages/{message_id}",
    tag = "Messages",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
) -> Result<StatusCode, ApiError> {
    state
        .messaging
        .delete_message(&user, &path.group_id, &path.message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Likes and reactions
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/messages/{message_id}/like",
    tag = "Messages",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    responses(
        (status = 200, description = "Like toggled", body = Message),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn like_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .like_message(&user, &path.group_id, &path.message_id)
        .await?;
    Ok(Json(message))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/messages/{message_id}/reactions",
    tag = "Messages",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("message_id" = String, Path, description = "Message ID"),
    ),
    request_body = ReactionRequest,
    responses(
        (status = 200, description = "Reaction toggled", body = Message),
        (status = 400, description = "Invalid emoji", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Message not found", body = ApiErrorBody),
    ),
)]
pub async fn react_to_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MessagePath>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .messaging
        .react_to_message(&user, &path.group_id, &path.message_id, &body.emoji)
        .await?;
    Ok(Json(message))
}
