//! Group post feed endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::post::GroupPost;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/{group_id}/posts", get(list_posts).post(create_post))
        .route("/groups/{group_id}/posts/{post_id}", delete(delete_post))
        .route("/groups/{group_id}/posts/{post_id}/like", post(like_post))
}

#[derive(Debug, Deserialize)]
pub struct PostPath {
    pub group_id: String,
    pub post_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub content: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}/posts",
    tag = "Posts",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Posts, newest first", body = Vec<GroupPost>),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn list_posts(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupPost>>, ApiError> {
    Ok(Json(state.messaging.list_posts(&group_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/posts",
    tag = "Posts",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = GroupPost),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(body): Json<CreatePostRequest>,
) -> Result<Json<GroupPost>, ApiError> {
    let post = state
        .messaging
        .create_post(&user, &group_id, &body.content)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}/posts/{post_id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<StatusCode, ApiError> {
    state
        .messaging
        .delete_post(&user, &path.group_id, &path.post_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/posts/{post_id}/like",
    tag = "Posts",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Like toggled", body = GroupPost),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn like_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<Json<GroupPost>, ApiError> {
    let post = state
        .messaging
        .like_post(&user, &path.group_id, &path.post_id)
        .await?;
    Ok(Json(post))
}
