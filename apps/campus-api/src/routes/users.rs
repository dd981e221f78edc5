//! The caller's own profile and notification preferences.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::user::{NotificationPreferences, User};
use crate::services::accounts;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/@me", get(get_me).patch(update_me))
        .route(
            "/users/@me/preferences",
            get(get_preferences).put(update_preferences),
        )
}

async fn load_me(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/@me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> Result<Json<User>, ApiError> {
    Ok(Json(load_me(&state, &user.user_id).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    /// Empty string clears the avatar.
    pub avatar: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/@me",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<User>, ApiError> {
    let updated = accounts::update_profile(
        state.store.as_ref(),
        &user.user_id,
        body.name.as_deref(),
        body.avatar.as_deref(),
    )
    .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/@me/preferences",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notification preferences", body = NotificationPreferences),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn get_preferences(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let me = load_me(&state, &user.user_id).await?;
    Ok(Json(me.notification_preferences))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/@me/preferences",
    tag = "Users",
    security(("bearer" = [])),
    request_body = NotificationPreferences,
    responses(
        (status = 200, description = "Preferences replaced", body = NotificationPreferences),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn update_preferences(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<NotificationPreferences>,
) -> Result<Json<NotificationPreferences>, ApiError> {
    let updated = accounts::update_preferences(state.store.as_ref(), &user.user_id, body).await?;
    Ok(Json(updated.notification_preferences))
}
