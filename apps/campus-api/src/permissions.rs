//! Group-scoped permission checks.
//!
//! The group role is consulted first; a platform admin passes every
//! role-gated check regardless of group role.

use crate::auth::middleware::AuthUser;
use crate::error::ApiError;
use crate::models::group::{Group, GroupRole};

/// May edit messages written by others.
pub const EDIT_MESSAGES: &[GroupRole] = &[GroupRole::Creator, GroupRole::Admin];
/// May delete messages written by others.
pub const DELETE_MESSAGES: &[GroupRole] = &[GroupRole::Creator, GroupRole::Admin, GroupRole::Moderator];
/// May pin and unpin messages.
pub const MANAGE_PINS: &[GroupRole] = &[GroupRole::Creator, GroupRole::Admin];
/// May delete posts written by others.
pub const DELETE_POSTS: &[GroupRole] = &[GroupRole::Creator, GroupRole::Admin];
/// May change member roles.
pub const MANAGE_ROLES: &[GroupRole] = &[GroupRole::Creator, GroupRole::Admin];

/// The caller must belong to the group.
pub fn check_member(group: &Group, user: &AuthUser) -> Result<(), ApiError> {
    if group.is_member(&user.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("You are not a member of this group"))
    }
}

/// The caller must hold one of `allowed` in the group, or be a platform admin.
pub fn check_group_role(group: &Group, user: &AuthUser, allowed: &[GroupRole]) -> Result<(), ApiError> {
    if user.is_admin() || group.has_role(&user.user_id, allowed) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ))
    }
}

/// The caller must be the author, hold one of `allowed`, or be a platform
/// admin.
pub fn check_author_or_role(
    group: &Group,
    user: &AuthUser,
    author_id: &str,
    allowed: &[GroupRole],
) -> Result<(), ApiError> {
    if author_id == user.user_id {
        return Ok(());
    }
    check_group_role(group, user, allowed)
}

/// Platform-wide admin gate for announcements and events.
pub fn check_platform_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Administrator access required"))
    }
}
