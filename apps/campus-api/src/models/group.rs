use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-group permission tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Creator,
    Admin,
    Moderator,
    Member,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub creator_id: String,
    pub members: BTreeSet<String>,
    pub member_roles: HashMap<String, GroupRole>,
    pub member_count: usize,
    pub pinned_messages: Vec<String>,
    pub posts_count: u64,
    pub messages_count: u64,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// A new group whose only member is its creator.
    pub fn new(
        id: String,
        name: String,
        description: String,
        category: Option<String>,
        creator_id: &str,
    ) -> Self {
        let now = Utc::now();
        let mut group = Self {
            id,
            name,
            description,
            category,
            creator_id: creator_id.to_string(),
            members: BTreeSet::new(),
            member_roles: HashMap::new(),
            member_count: 0,
            pinned_messages: Vec::new(),
            posts_count: 0,
            messages_count: 0,
            last_activity_at: now,
            created_at: now,
        };
        group.add_member(creator_id, GroupRole::Creator);
        group
    }

    /// Member IDs as an owned list, for fan-out.
    pub fn member_list(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.contains(user_id)
    }

    /// Group-scoped role, if the user is a member.
    pub fn role_of(&self, user_id: &str) -> Option<GroupRole> {
        self.member_roles.get(user_id).copied()
    }

    pub fn has_role(&self, user_id: &str, allowed: &[GroupRole]) -> bool {
        self.role_of(user_id).is_some_and(|r| allowed.contains(&r))
    }

    /// Adds the member with the given role. Returns `false` if already present.
    pub fn add_member(&mut self, user_id: &str, role: GroupRole) -> bool {
        if !self.members.insert(user_id.to_string()) {
            return false;
        }
        self.member_roles.insert(user_id.to_string(), role);
        self.member_count = self.members.len();
        true
    }

    /// Removes the member and their role entry together. The creator is
    /// never removed.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        if user_id == self.creator_id || !self.members.remove(user_id) {
            return false;
        }
        self.member_roles.remove(user_id);
        self.member_count = self.members.len();
        true
    }

    /// Idempotent: a message id is listed at most once.
    pub fn pin(&mut self, message_id: &str) {
        if !self.pinned_messages.iter().any(|id| id == message_id) {
            self.pinned_messages.push(message_id.to_string());
        }
    }

    pub fn unpin(&mut self, message_id: &str) {
        self.pinned_messages.retain(|id| id != message_id);
    }

    pub fn record_message(&mut self, at: DateTime<Utc>) {
        self.messages_count += 1;
        self.last_activity_at = at;
    }

    pub fn record_post(&mut self, at: DateTime<Utc>) {
        self.posts_count += 1;
        self.last_activity_at = at;
    }

    pub fn forget_message(&mut self, message_id: &str) {
        self.unpin(message_id);
        self.messages_count = self.messages_count.saturating_sub(1);
    }

    pub fn forget_post(&mut self) {
        self.posts_count = self.posts_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group::new(
            "grp_1".to_string(),
            "Chess Club".to_string(),
            String::new(),
            None,
            "creator",
        )
    }

    fn roles_subset_of_members(g: &Group) -> bool {
        g.member_roles.keys().all(|k| g.members.contains(k))
    }

    #[test]
    fn creator_is_first_member() {
        let g = group();
        assert!(g.is_member("creator"));
        assert_eq!(g.role_of("creator"), Some(GroupRole::Creator));
        assert_eq!(g.member_count, 1);
    }

    #[test]
    fn creator_cannot_be_removed() {
        let mut g = group();
        assert!(!g.remove_member("creator"));
        assert!(g.is_member("creator"));
    }

    #[test]
    fn member_roles_track_members() {
        let mut g = group();
        assert!(g.add_member("a", GroupRole::Member));
        assert!(g.add_member("b", GroupRole::Moderator));
        assert!(!g.add_member("a", GroupRole::Admin));
        assert_eq!(g.role_of("a"), Some(GroupRole::Member));
        assert!(g.remove_member("a"));
        assert!(!g.remove_member("a"));
        assert!(roles_subset_of_members(&g));
        assert_eq!(g.member_count, 2);
    }

    #[test]
    fn pin_is_idempotent() {
        let mut g = group();
        g.pin("m1");
        g.pin("m1");
        assert_eq!(g.pinned_messages, vec!["m1".to_string()]);
        g.unpin("m1");
        assert!(g.pinned_messages.is_empty());
    }

    #[test]
    fn counters_floor_at_zero() {
        let mut g = group();
        g.forget_message("m1");
        g.forget_post();
        assert_eq!(g.messages_count, 0);
        assert_eq!(g.posts_count, 0);
    }

    #[test]
    fn forgetting_a_pinned_message_unpins_it() {
        let mut g = group();
        g.record_message(Utc::now());
        g.pin("m1");
        g.forget_message("m1");
        assert!(g.pinned_messages.is_empty());
        assert_eq!(g.messages_count, 0);
    }
}
