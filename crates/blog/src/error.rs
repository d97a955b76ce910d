//! Storage error taxonomy
//!
//! Domain errors carry the same meaning in every backend. Infrastructure
//! failures (SQLite errors, poisoned locks, corrupt rows) are collected in
//! [`StorageError::Unavailable`] and surfaced as-is.

use crate::models::MAX_COMMENT_LENGTH;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("post not found")]
    PostNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("comment content is {len} characters, maximum is {max}")]
    CommentTooLong { len: usize, max: usize },

    #[error("comments are disabled for this post")]
    CommentsDisabled,

    #[error("parent comment not found")]
    ParentCommentNotFound,

    #[error("parent comment belongs to another post")]
    ParentCommentWrongPost,

    #[error("storage unavailable: {0:#}")]
    Unavailable(#[from] anyhow::Error),
}

impl StorageError {
    pub(crate) fn too_long(len: usize) -> Self {
        Self::CommentTooLong {
            len,
            max: MAX_COMMENT_LENGTH,
        }
    }

    /// True for validation and not-found errors, false for infrastructure failures
    pub fn is_domain(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PostNotFound | Self::CommentNotFound)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.into())
    }
}
