//! Comment model: a reply to a post, optionally nested under another comment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorId, CommentId, PostId};

/// Maximum comment length, in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// A comment on a post
///
/// `post_id`, `parent_id`, `author_id` and `created_at` are fixed once the
/// comment is stored; updates only ever change `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: AuthorId,
    /// Comment this one replies to; must belong to the same post
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    pub content: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create an unsaved top-level comment on a post
    pub fn new(post_id: PostId, author_id: AuthorId, content: impl Into<String>) -> Self {
        Self {
            id: CommentId::nil(),
            post_id,
            author_id,
            parent_id: None,
            content: content.into(),
            created_at: DateTime::<Utc>::default(),
        }
    }

    pub fn with_id(mut self, id: CommentId) -> Self {
        self.id = id;
        self
    }

    pub fn reply_to(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Content length in characters (Unicode scalar values)
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_too_long(&self) -> bool {
        self.content_len() > MAX_COMMENT_LENGTH
    }

    /// Fill in the identifier and creation time if they were left unset
    pub(crate) fn assign_defaults(&mut self) {
        if self.id.is_nil() {
            self.id = CommentId::new();
        }
        if super::is_unset(&self.created_at) {
            self.created_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_counts_characters() {
        let post_id = PostId::new();
        let comment = Comment::new(post_id, AuthorId::new(), "é".repeat(MAX_COMMENT_LENGTH));
        assert_eq!(comment.content_len(), MAX_COMMENT_LENGTH);
        assert!(!comment.is_too_long());

        let comment = Comment::new(post_id, AuthorId::new(), "a".repeat(MAX_COMMENT_LENGTH + 1));
        assert!(comment.is_too_long());
    }

    #[test]
    fn test_assign_defaults_keeps_supplied_values() {
        let id = CommentId::new();
        let created_at = Utc::now() - chrono::Duration::hours(1);
        let mut comment = Comment::new(PostId::new(), AuthorId::new(), "hi")
            .with_id(id)
            .created_at(created_at);

        comment.assign_defaults();

        assert_eq!(comment.id, id);
        assert_eq!(comment.created_at, created_at);
    }

    #[test]
    fn test_assign_defaults_fills_unset_values() {
        let mut comment = Comment::new(PostId::new(), AuthorId::new(), "hi");
        comment.assign_defaults();

        assert!(!comment.id.is_nil());
        assert!(comment.created_at.timestamp() > 0);
    }
}
