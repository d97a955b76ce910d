//! In-memory storage implementation
//!
//! All tables live behind one `RwLock`, so a cascading delete can never
//! interleave with a concurrent insert on the same post. Reads share the
//! lock, writes hold it exclusively for the whole operation.

use anyhow::anyhow;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Page, Storage};
use crate::error::{StorageError, StorageResult};
use crate::models::{Comment, CommentId, Post, PostId};

#[derive(Default)]
struct Tables {
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
    /// Secondary index: post -> comment ids in insertion order
    post_comments: HashMap<PostId, Vec<CommentId>>,
}

/// In-memory implementation of [`Storage`]
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::Unavailable(anyhow!("in-memory store lock poisoned")))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::Unavailable(anyhow!("in-memory store lock poisoned")))
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStorage {
    fn create_post(&self, mut post: Post) -> StorageResult<Post> {
        post.assign_defaults();

        let mut tables = self.write()?;
        if tables.posts.contains_key(&post.id) {
            return Err(anyhow!("post {} already exists", post.id).into());
        }
        tables.posts.insert(post.id, post.clone());

        debug!("[MEMORY] Created post {}", post.id);
        Ok(post)
    }

    fn get_post(&self, id: PostId) -> StorageResult<Post> {
        let tables = self.read()?;
        tables.posts.get(&id).cloned().ok_or(StorageError::PostNotFound)
    }

    fn list_posts(&self, limit: i64, offset: i64) -> StorageResult<Vec<Post>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let tables = self.read()?;
        let mut posts: Vec<&Post> = tables.posts.values().collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(page.slice(posts.into_iter().cloned()))
    }

    fn update_post(&self, post: Post) -> StorageResult<()> {
        let mut tables = self.write()?;
        let stored = tables
            .posts
            .get_mut(&post.id)
            .ok_or(StorageError::PostNotFound)?;

        let id = stored.id;
        stored.apply_update(post);

        debug!("[MEMORY] Updated post {}", id);
        Ok(())
    }

    fn delete_post(&self, id: PostId) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.posts.remove(&id).is_none() {
            return Err(StorageError::PostNotFound);
        }

        let comment_ids = tables.post_comments.remove(&id).unwrap_or_default();
        for comment_id in &comment_ids {
            tables.comments.remove(comment_id);
        }

        debug!("[MEMORY] Deleted post {} and {} comments", id, comment_ids.len());
        Ok(())
    }

    fn create_comment(&self, mut comment: Comment) -> StorageResult<Comment> {
        let mut tables = self.write()?;

        let post = tables
            .posts
            .get(&comment.post_id)
            .ok_or(StorageError::PostNotFound)?;
        if !post.comments_allowed {
            return Err(StorageError::CommentsDisabled);
        }
        if comment.is_too_long() {
            return Err(StorageError::too_long(comment.content_len()));
        }
        if let Some(parent_id) = comment.parent_id {
            let parent = tables
                .comments
                .get(&parent_id)
                .ok_or(StorageError::ParentCommentNotFound)?;
            if parent.post_id != comment.post_id {
                return Err(StorageError::ParentCommentWrongPost);
            }
        }

        comment.assign_defaults();
        if tables.comments.contains_key(&comment.id) {
            return Err(anyhow!("comment {} already exists", comment.id).into());
        }

        tables
            .post_comments
            .entry(comment.post_id)
            .or_default()
            .push(comment.id);
        tables.comments.insert(comment.id, comment.clone());

        debug!("[MEMORY] Created comment {} on post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    fn get_comment(&self, id: CommentId) -> StorageResult<Comment> {
        let tables = self.read()?;
        tables
            .comments
            .get(&id)
            .cloned()
            .ok_or(StorageError::CommentNotFound)
    }

    fn get_comments(
        &self,
        post_id: PostId,
        limit: i64,
        offset: i64,
    ) -> StorageResult<Vec<Comment>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };

        let tables = self.read()?;
        let Some(ids) = tables.post_comments.get(&post_id) else {
            return Ok(Vec::new());
        };

        let mut comments: Vec<&Comment> =
            ids.iter().filter_map(|id| tables.comments.get(id)).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(page.slice(comments.into_iter().cloned()))
    }

    fn update_comment(&self, comment: Comment) -> StorageResult<()> {
        let mut tables = self.write()?;
        let stored = tables
            .comments
            .get_mut(&comment.id)
            .ok_or(StorageError::CommentNotFound)?;

        if comment.is_too_long() {
            return Err(StorageError::too_long(comment.content_len()));
        }
        stored.content = comment.content;

        debug!("[MEMORY] Updated comment {}", comment.id);
        Ok(())
    }

    fn delete_comment(&self, id: CommentId) -> StorageResult<()> {
        let mut tables = self.write()?;
        let post_id = tables
            .comments
            .get(&id)
            .map(|c| c.post_id)
            .ok_or(StorageError::CommentNotFound)?;

        // A reply is always inserted after its parent, so one pass over the
        // post's index in insertion order collects the whole subtree.
        let mut doomed = HashSet::from([id]);
        if let Some(ids) = tables.post_comments.get(&post_id) {
            for comment_id in ids {
                let is_reply = tables
                    .comments
                    .get(comment_id)
                    .and_then(|c| c.parent_id)
                    .is_some_and(|parent| doomed.contains(&parent));
                if is_reply {
                    doomed.insert(*comment_id);
                }
            }
        }

        for comment_id in &doomed {
            tables.comments.remove(comment_id);
        }
        let now_empty = match tables.post_comments.get_mut(&post_id) {
            Some(ids) => {
                ids.retain(|c| !doomed.contains(c));
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            tables.post_comments.remove(&post_id);
        }

        debug!("[MEMORY] Deleted comment {} ({} removed)", id, doomed.len());
        Ok(())
    }
}
