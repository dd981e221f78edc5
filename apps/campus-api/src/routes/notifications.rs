//! The caller's notification inbox.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::notification::Notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{notification_id}/read", post(mark_read))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_notifications(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.notifications.list_for_user(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{notification_id}/read",
    tag = "Notifications",
    security(("bearer" = [])),
    params(("notification_id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = Notification),
        (status = 404, description = "Notification not found", body = ApiErrorBody),
    ),
)]
pub async fn mark_read(
    user: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .notifications
        .mark_read(&user.user_id, &notification_id)
        .await?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Every notification marked read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state.notifications.mark_all_read(&user.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
