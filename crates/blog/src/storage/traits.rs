//! Storage trait definitions

use crate::error::StorageResult;
use crate::models::{Comment, CommentId, Post, PostId};

/// Trait for post and comment storage
///
/// Every backend enforces the same invariants and reports the same
/// [`StorageError`](crate::StorageError) kinds, so callers can swap backends
/// without observing a difference.
///
/// Listing methods take signed `limit`/`offset`: a negative offset reads from
/// the start, a non-positive limit returns an empty list. Results are ordered
/// by `created_at` ascending, ties broken by identifier.
pub trait Storage: Send + Sync {
    /// Store a new post, assigning its id and creation time if unset
    fn create_post(&self, post: Post) -> StorageResult<Post>;

    fn get_post(&self, id: PostId) -> StorageResult<Post>;

    fn list_posts(&self, limit: i64, offset: i64) -> StorageResult<Vec<Post>>;

    /// Replace the title, content and comments flag of an existing post
    fn update_post(&self, post: Post) -> StorageResult<()>;

    /// Delete a post together with all of its comments
    fn delete_post(&self, id: PostId) -> StorageResult<()>;

    /// Store a new comment
    ///
    /// Checks, in order: the post exists, it accepts comments, the content
    /// fits, the parent (if any) exists and belongs to the same post.
    fn create_comment(&self, comment: Comment) -> StorageResult<Comment>;

    fn get_comment(&self, id: CommentId) -> StorageResult<Comment>;

    /// List comments of one post. An unknown post yields an empty list.
    fn get_comments(&self, post_id: PostId, limit: i64, offset: i64)
    -> StorageResult<Vec<Comment>>;

    /// Replace the content of an existing comment
    ///
    /// `post_id`, `parent_id`, `author_id` and `created_at` supplied by the
    /// caller are ignored in favor of the stored values.
    fn update_comment(&self, comment: Comment) -> StorageResult<()>;

    /// Delete a comment and every reply beneath it
    fn delete_comment(&self, id: CommentId) -> StorageResult<()>;
}
