use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::announcement::{Announcement, Priority};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/announcements",
        get(list_announcements).post(create_announcement),
    )
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements",
    tag = "Announcements",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Announcements, newest first", body = Vec<Announcement>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_announcements(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    Ok(Json(state.announcements.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/announcements",
    tag = "Announcements",
    security(("bearer" = [])),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 200, description = "Announcement published", body = Announcement),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Administrator access required", body = ApiErrorBody),
    ),
)]
pub async fn create_announcement(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateAnnouncementRequest>,
) -> Result<Json<Announcement>, ApiError> {
    let announcement = state
        .announcements
        .create(&user, &body.title, &body.content, body.priority)
        .await?;
    Ok(Json(announcement))
}
