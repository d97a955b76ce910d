//! Post query functions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::StorageResult;
use crate::models::{AuthorId, Comment, CommentId, Post, PostId};
use crate::storage::Storage;

/// Number of characters kept in a summary excerpt
const EXCERPT_CHARS: usize = 140;

/// Summary information for displaying a post in a list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub author_id: AuthorId,
    /// Leading part of the content
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub comments_allowed: bool,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            excerpt: post.content.chars().take(EXCERPT_CHARS).collect(),
            id: post.id,
            title: post.title,
            author_id: post.author_id,
            created_at: post.created_at,
            comments_allowed: post.comments_allowed,
        }
    }
}

/// A comment together with the replies beneath it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// A post with one page of its comments arranged as a reply tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<CommentNode>,
}

/// List posts with pagination
///
/// Returns posts oldest first, same ordering as [`Storage::list_posts`].
pub fn list_posts(store: &dyn Storage, limit: i64, offset: i64) -> StorageResult<Vec<PostSummary>> {
    let posts = store.list_posts(limit, offset)?;
    Ok(posts.into_iter().map(PostSummary::from).collect())
}

/// Get a post and a page of its comments as a reply tree
///
/// Pagination applies to the flat, chronological comment list; the page is
/// then nested. Fails with `PostNotFound` if the post does not exist.
pub fn get_post_detail(
    store: &dyn Storage,
    post_id: PostId,
    limit: i64,
    offset: i64,
) -> StorageResult<PostDetail> {
    let post = store.get_post(post_id)?;
    let comments = store.get_comments(post_id, limit, offset)?;

    Ok(PostDetail {
        post,
        comments: build_comment_tree(comments),
    })
}

/// Nest a chronologically ordered comment list by `parent_id`
///
/// Comments whose parent is not in the list become roots, so a page cut in
/// the middle of a conversation still shows every comment once.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let present: HashSet<CommentId> = comments.iter().map(|c| c.id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<CommentId, Vec<Comment>> = HashMap::new();
    for comment in comments {
        let parent_id = comment.parent_id;
        match parent_id {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|comment| attach_replies(comment, &mut children))
        .collect()
}

fn attach_replies(comment: Comment, children: &mut HashMap<CommentId, Vec<Comment>>) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach_replies(reply, children))
        .collect();

    CommentNode { comment, replies }
}
