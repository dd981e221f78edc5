use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::message::toggle;

/// A group post: like a message but only supports likes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupPost {
    pub id: String,
    pub group_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: usize,
    pub liked_by: BTreeSet<String>,
}

impl GroupPost {
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        let liked = toggle(&mut self.liked_by, user_id);
        self.likes = self.liked_by.len();
        liked
    }
}
