//! Query API for read-side consumers
//!
//! Provides high-level query functions that shape storage results for
//! display: post summaries and posts with their threaded comments.

mod posts;

pub use posts::{CommentNode, PostDetail, PostSummary, build_comment_tree, get_post_detail, list_posts};
