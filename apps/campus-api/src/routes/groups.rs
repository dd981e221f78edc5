//! Group directory endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::group::{Group, GroupRole};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{group_id}", get(get_group).delete(delete_group))
        .route("/groups/{group_id}/join", post(join_group))
        .route("/groups/{group_id}/leave", post(leave_group))
        .route(
            "/groups/{group_id}/members/{user_id}/role",
            put(change_member_role),
        )
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "Groups",
    security(("bearer" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 200, description = "Group created", body = Group),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn create_group(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .groups
        .create(
            &user,
            &body.name,
            body.description.as_deref(),
            body.category.as_deref(),
        )
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "Groups",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All groups", body = Vec<Group>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_groups(_user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(state.groups.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group", body = Group),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn get_group(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.groups.get(&group_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{group_id}",
    tag = "Groups",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 403, description = "Not the creator", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_group(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.groups.delete(&user, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/join",
    tag = "Groups",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Joined", body = Group),
        (status = 404, description = "Group not found", body = ApiErrorBody),
        (status = 409, description = "Already a member", body = ApiErrorBody),
    ),
)]
pub async fn join_group(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.groups.join(&user, &group_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups/{group_id}/leave",
    tag = "Groups",
    security(("bearer" = [])),
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Left the group", body = Group),
        (status = 403, description = "Creator or non-member", body = ApiErrorBody),
        (status = 404, description = "Group not found", body = ApiErrorBody),
    ),
)]
pub async fn leave_group(
    user: AuthUser,
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.groups.leave(&user, &group_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct MemberPath {
    pub group_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: GroupRole,
}

#[utoipa::path(
    put,
    path = "/api/v1/groups/{group_id}/members/{user_id}/role",
    tag = "Groups",
    security(("bearer" = [])),
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("user_id" = String, Path, description = "Member user ID"),
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = Group),
        (status = 400, description = "Invalid role", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Group or member not found", body = ApiErrorBody),
    ),
)]
pub async fn change_member_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .groups
        .change_member_role(&user, &path.group_id, &path.user_id, body.role)
        .await?;
    Ok(Json(group))
}
