use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A group chat message. Author fields are captured at creation and never
/// re-resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub group_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub likes: usize,
    pub liked_by: BTreeSet<String>,
    pub reactions: BTreeMap<String, BTreeSet<String>>,
    pub is_pinned: bool,
}

impl Message {
    /// Toggles the user's like. Returns whether the message is now liked by
    /// that user.
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        let liked = toggle(&mut self.liked_by, user_id);
        self.likes = self.liked_by.len();
        liked
    }

    /// Toggles the user's reaction under `emoji`, dropping the emoji key once
    /// nobody reacts with it. Returns whether the reaction is now present.
    pub fn toggle_reaction(&mut self, emoji: &str, user_id: &str) -> bool {
        let users = self.reactions.entry(emoji.to_string()).or_default();
        let reacted = toggle(users, user_id);
        if users.is_empty() {
            self.reactions.remove(emoji);
        }
        reacted
    }
}

pub(crate) fn toggle(set: &mut BTreeSet<String>, user_id: &str) -> bool {
    if set.remove(user_id) {
        false
    } else {
        set.insert(user_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message {
            id: "msg_1".to_string(),
            group_id: "grp_1".to_string(),
            author_id: "u1".to_string(),
            author_name: "Ada".to_string(),
            author_avatar: None,
            content: "hello".to_string(),
            created_at: Utc::now(),
            edited_at: None,
            likes: 0,
            liked_by: BTreeSet::new(),
            reactions: BTreeMap::new(),
            is_pinned: false,
        }
    }

    #[test]
    fn like_alternates_and_count_matches_set() {
        let mut m = message();
        for i in 0..6 {
            let liked = m.toggle_like("u2");
            assert_eq!(liked, i % 2 == 0);
            assert_eq!(m.likes, m.liked_by.len());
        }
        assert_eq!(m.likes, 0);
    }

    #[test]
    fn likes_from_different_users_accumulate() {
        let mut m = message();
        m.toggle_like("u2");
        m.toggle_like("u3");
        assert_eq!(m.likes, 2);
        m.toggle_like("u2");
        assert_eq!(m.likes, 1);
        assert!(m.liked_by.contains("u3"));
    }

    #[test]
    fn reaction_round_trip_removes_emoji_key() {
        let mut m = message();
        assert!(m.toggle_reaction("🔥", "u2"));
        assert!(m.reactions["🔥"].contains("u2"));
        assert!(!m.toggle_reaction("🔥", "u2"));
        assert!(!m.reactions.contains_key("🔥"));
    }

    #[test]
    fn reaction_key_survives_while_others_react() {
        let mut m = message();
        m.toggle_reaction("👍", "u2");
        m.toggle_reaction("👍", "u3");
        m.toggle_reaction("👍", "u2");
        assert_eq!(m.reactions["👍"].len(), 1);
    }
}
