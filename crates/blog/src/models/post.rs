//! Post model: a top-level content item that owns comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorId, PostId};

/// A post
///
/// `id` and `created_at` may be left at their defaults (nil / Unix epoch);
/// the storage backend assigns them on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub author_id: AuthorId,
    pub content: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Whether new comments may be attached to this post
    #[serde(default = "default_comments_allowed")]
    pub comments_allowed: bool,
}

fn default_comments_allowed() -> bool {
    true
}

impl Post {
    /// Create an unsaved post with comments enabled
    pub fn new(title: impl Into<String>, author_id: AuthorId, content: impl Into<String>) -> Self {
        Self {
            id: PostId::nil(),
            title: title.into(),
            author_id,
            content: content.into(),
            created_at: DateTime::<Utc>::default(),
            comments_allowed: true,
        }
    }

    pub fn with_id(mut self, id: PostId) -> Self {
        self.id = id;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn comments_allowed(mut self, allowed: bool) -> Self {
        self.comments_allowed = allowed;
        self
    }

    /// Fill in the identifier and creation time if they were left unset
    pub(crate) fn assign_defaults(&mut self) {
        if self.id.is_nil() {
            self.id = PostId::new();
        }
        if super::is_unset(&self.created_at) {
            self.created_at = Utc::now();
        }
    }

    /// Copy the mutable fields of `update` onto this post
    pub(crate) fn apply_update(&mut self, update: Post) {
        self.title = update.title;
        self.content = update.content;
        self.comments_allowed = update.comments_allowed;
    }
}
