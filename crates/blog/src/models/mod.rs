//! Domain models for posts and comments

mod comment;
mod ids;
mod post;

use chrono::{DateTime, Utc};

pub use comment::{Comment, MAX_COMMENT_LENGTH};
pub use ids::{AuthorId, CommentId, PostId};
pub use post::Post;

/// The Unix epoch stands in for "no timestamp supplied"
fn is_unset(ts: &DateTime<Utc>) -> bool {
    *ts == DateTime::<Utc>::default()
}
