//! Group directory: lifecycle and membership.

use std::sync::Arc;

use campus_common::id::{prefix, prefixed_ulid};
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::db::store::DataStore;
use crate::error::{field_error, ApiError};
use crate::gateway::events::EventType;
use crate::gateway::fanout::FanoutRouter;
use crate::gateway::typing::TypingTracker;
use crate::models::group::{Group, GroupRole};
use crate::permissions::{self, MANAGE_ROLES};

use super::{to_data, RecordLocks};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Clone)]
pub struct GroupDirectory {
    store: Arc<dyn DataStore>,
    fanout: FanoutRouter,
    typing: TypingTracker,
    locks: RecordLocks,
}

impl GroupDirectory {
    pub fn new(store: Arc<dyn DataStore>, fanout: FanoutRouter, typing: TypingTracker, locks: RecordLocks) -> Self {
        Self {
            store,
            fanout,
            typing,
            locks,
        }
    }

    async fn load(&self, group_id: &str) -> Result<Group, ApiError> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Group not found"))
    }

    pub async fn get(&self, group_id: &str) -> Result<Group, ApiError> {
        self.load(group_id).await
    }

    pub async fn list(&self) -> Result<Vec<Group>, ApiError> {
        self.store.list_groups().await
    }

    pub async fn create(
        &self,
        user: &AuthUser,
        name: &str,
        description: Option<&str>,
        category: Option<&str>,
    ) -> Result<Group, ApiError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(field_error(
                "name",
                format!("Name must be 1-{MAX_NAME_LEN} characters"),
            ));
        }
        let description = description.unwrap_or_default().trim();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(field_error(
                "description",
                format!("Description must be at most {MAX_DESCRIPTION_LEN} characters"),
            ));
        }
        let category = category.map(str::trim).filter(|c| !c.is_empty()).map(String::from);

        let group = Group::new(
            prefixed_ulid(prefix::GROUP),
            name.to_string(),
            description.to_string(),
            category,
            &user.user_id,
        );
        self.store.put_group(group.clone()).await?;

        tracing::info!(group_id = %group.id, creator = %user.user_id, "group created");
        self.fanout.to_all(EventType::GroupCreated, to_data(&group));
        Ok(group)
    }

    /// Creator or platform admin only. Removes messages and posts with the
    /// group and drops its typing entries without a final typing broadcast.
    pub async fn delete(&self, user: &AuthUser, group_id: &str) -> Result<(), ApiError> {
        let guard = self.locks.lock(group_id).await;

        let group = self.load(group_id).await?;
        if group.creator_id != user.user_id && !user.is_admin() {
            return Err(ApiError::forbidden(
                "Only the group creator can delete this group",
            ));
        }

        self.store.delete_group(group_id).await?;
        self.typing.clear_group(group_id);
        drop(guard);
        self.locks.forget(group_id);

        tracing::info!(%group_id, deleted_by = %user.user_id, "group deleted");
        self.fanout
            .to_all(EventType::GroupDeleted, json!({ "groupId": group_id }));
        Ok(())
    }

    pub async fn join(&self, user: &AuthUser, group_id: &str) -> Result<Group, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load(group_id).await?;
        if !group.add_member(&user.user_id, GroupRole::Member) {
            return Err(ApiError::conflict("Already a member of this group"));
        }
        self.store.put_group(group.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::MemberJoined,
            json!({
                "groupId": group_id,
                "userId": user.user_id,
                "userName": user.name,
                "role": GroupRole::Member,
                "memberCount": group.member_count,
            }),
            &group.member_list(),
        );
        Ok(group)
    }

    /// The creator cannot leave. The leaver's typing entry is withdrawn.
    pub async fn leave(&self, user: &AuthUser, group_id: &str) -> Result<Group, ApiError> {
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load(group_id).await?;
        if group.creator_id == user.user_id {
            return Err(ApiError::forbidden("The group creator cannot leave the group"));
        }
        if !group.remove_member(&user.user_id) {
            return Err(ApiError::forbidden("You are not a member of this group"));
        }
        self.store.put_group(group.clone()).await?;
        self.typing.typing_stop(group_id, &user.user_id).await;

        let mut recipients = group.member_list();
        recipients.push(user.user_id.clone());
        self.fanout.to_group(
            group_id,
            EventType::MemberLeft,
            json!({
                "groupId": group_id,
                "userId": user.user_id,
                "memberCount": group.member_count,
            }),
            &recipients,
        );
        Ok(group)
    }

    /// Creators and platform admins may assign admin, moderator or member.
    /// Group admins may only move non-admin members between moderator and
    /// member. The creator role is never assigned or taken away.
    pub async fn change_member_role(
        &self,
        user: &AuthUser,
        group_id: &str,
        target_user_id: &str,
        role: GroupRole,
    ) -> Result<Group, ApiError> {
        if role == GroupRole::Creator {
            return Err(field_error("role", "The creator role cannot be assigned"));
        }
        let _guard = self.locks.lock(group_id).await;

        let mut group = self.load(group_id).await?;
        permissions::check_group_role(&group, user, MANAGE_ROLES)?;

        let current = group
            .role_of(target_user_id)
            .ok_or_else(|| ApiError::not_found("Member not found"))?;
        if current == GroupRole::Creator {
            return Err(ApiError::forbidden("The creator's role cannot be changed"));
        }

        let full_authority = user.is_admin() || group.role_of(&user.user_id) == Some(GroupRole::Creator);
        if !full_authority && (role == GroupRole::Admin || current == GroupRole::Admin) {
            return Err(ApiError::forbidden(
                "Only the group creator can manage group admins",
            ));
        }

        if current == role {
            return Ok(group);
        }
        group.member_roles.insert(target_user_id.to_string(), role);
        self.store.put_group(group.clone()).await?;

        self.fanout.to_group(
            group_id,
            EventType::MemberRoleChanged,
            json!({
                "groupId": group_id,
                "userId": target_user_id,
                "role": role,
            }),
            &group.member_list(),
        );
        Ok(group)
    }
}
