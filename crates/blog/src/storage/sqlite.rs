//! SQLite-based post and comment storage
//!
//! Referential integrity is declared in the schema (foreign keys with
//! `ON DELETE CASCADE`), but comment validation runs as explicit lookups
//! first so the reported error matches the in-memory backend instead of a
//! generic constraint failure.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rusqlite_migration::{M, Migrations};

use super::{Page, Storage};
use crate::error::{StorageError, StorageResult};
use crate::models::{AuthorId, Comment, CommentId, Post, PostId};

/// Default bound on how long an operation waits for a database lock
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            CREATE TABLE posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL,
                comments_allowed INTEGER NOT NULL DEFAULT 1,
                created_secs INTEGER NOT NULL,
                created_nanos INTEGER NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_secs, created_nanos, id);

            CREATE TABLE comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                parent_id TEXT,
                author_id TEXT NOT NULL,
                content TEXT NOT NULL CHECK (length(content) <= 2000),
                created_secs INTEGER NOT NULL,
                created_nanos INTEGER NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_comments_post_created
                ON comments(post_id, created_secs, created_nanos, id);
            CREATE INDEX idx_comments_parent_id ON comments(parent_id);
            "#,
        ),
    ])
}

macro_rules! sql_uuid_id {
    ($name:ty) => {
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_uuid_id!(PostId);
sql_uuid_id!(CommentId);
sql_uuid_id!(AuthorId);

/// Split a timestamp into (seconds since the epoch, nanoseconds)
///
/// Integer pairs cover every year chrono can represent and sort the same
/// way `DateTime` does, including leap seconds (nanos >= 1e9).
fn timestamp_parts(ts: &DateTime<Utc>) -> (i64, u32) {
    (ts.timestamp(), ts.timestamp_subsec_nanos())
}

/// Read the two timestamp columns starting at `idx`
fn timestamp_columns(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    let nanos: u32 = row.get(idx + 1)?;
    DateTime::from_timestamp(secs, nanos)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        comments_allowed: row.get(4)?,
        created_at: timestamp_columns(row, 5)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        author_id: row.get(3)?,
        content: row.get(4)?,
        created_at: timestamp_columns(row, 5)?,
    })
}

/// SQLite implementation of [`Storage`]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file and bring its schema up to date
    ///
    /// `timeout` bounds how long any single operation waits on a lock held
    /// by another connection before failing.
    pub fn open(db_path: impl AsRef<Path>, timeout: Duration) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;

        info!("[STORE] Opened SQLite database at {:?}", db_path.as_ref());
        Self::init(conn, timeout)
    }

    /// Open a private database that lives only as long as this store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn, DEFAULT_TIMEOUT)
    }

    fn init(mut conn: Connection, timeout: Duration) -> Result<Self> {
        conn.busy_timeout(timeout)
            .context("Failed to set busy timeout")?;

        // WAL lets readers proceed while a writer holds the lock.
        // foreign_keys must be enabled per connection for the cascades to fire.
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .context("Failed to configure database")?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("Database connection check failed")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable(anyhow!("database connection lock poisoned")))
    }
}

impl Storage for SqliteStorage {
    fn create_post(&self, mut post: Post) -> StorageResult<Post> {
        post.assign_defaults();
        let (created_secs, created_nanos) = timestamp_parts(&post.created_at);

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO posts
                 (id, title, author_id, content, comments_allowed, created_secs, created_nanos)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                post.id,
                post.title,
                post.author_id,
                post.content,
                post.comments_allowed,
                created_secs,
                created_nanos,
            ],
        )
        .with_context(|| format!("Failed to insert post {}", post.id))?;

        debug!("[STORE] Created post {}", post.id);
        Ok(post)
    }

    fn get_post(&self, id: PostId) -> StorageResult<Post> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, title, author_id, content, comments_allowed, created_secs, created_nanos
             FROM posts WHERE id = ?1",
            [id],
            post_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to load post {}", id))?
        .ok_or(StorageError::PostNotFound)
    }

    fn list_posts(&self, limit: i64, offset: i64) -> StorageResult<Vec<Post>> {
        let Some(page) = Page::new(limit, offset) else {
            return Ok(Vec::new());
        };
        let (limit, offset) = page.sql_params();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, author_id, content, comments_allowed, created_secs, created_nanos
             FROM posts
             ORDER BY created_secs, created_nanos, id
             LIMIT ?1 OFFSET ?2",
        )?;

        let posts = stmt
            .query_map(params![limit, offset], post_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list posts")?;

        Ok(posts)
    }

    fn update_post(&self, post: Post) -> StorageResult<()> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE posts SET title = ?2, content = ?3, comments_allowed = ?4
                 WHERE id = ?1",
                params![post.id, post.title, post.content, post.comments_allowed],
            )
            .with_context(|| format!("Failed to update post {}", post.id))?;

        if updated == 0 {
            return Err(StorageError::PostNotFound);
        }

        debug!("[STORE] Updated post {}", post.id);
        Ok(())
    }

    fn delete_post(&self, id: PostId) -> StorageResult<()> {
        let conn = self.conn()?;
        // Comments go with it through ON DELETE CASCADE
        let deleted = conn
            .execute("DELETE FROM posts WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete post {}", id))?;

        if deleted == 0 {
            return Err(StorageError::PostNotFound);
        }

        debug!("[STORE] Deleted post {}", id);
        Ok(())
    }

    fn create_comment(&self, mut comment: Comment) -> StorageResult<Comment> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let allowed: Option<bool> = tx
            .query_row(
                "SELECT comments_allowed FROM posts WHERE id = ?1",
                [comment.post_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to check post for comment")?;

        match allowed {
            None => return Err(StorageError::PostNotFound),
            Some(false) => return Err(StorageError::CommentsDisabled),
            Some(true) => {}
        }

        if comment.is_too_long() {
            return Err(StorageError::too_long(comment.content_len()));
        }

        if let Some(parent_id) = comment.parent_id {
            let parent_post: Option<PostId> = tx
                .query_row(
                    "SELECT post_id FROM comments WHERE id = ?1",
                    [parent_id],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to check parent comment")?;

            match parent_post {
                None => return Err(StorageError::ParentCommentNotFound),
                Some(post_id) if post_id != comment.post_id => {
                    return Err(StorageError::ParentCommentWrongPost);
                }
                Some(_) => {}
            }
        }

        comment.assign_defaults();
        let (created_secs, created_nanos) = timestamp_parts(&comment.created_at);
        tx.execute(
            "INSERT INTO comments
                 (id, post_id, parent_id, author_id, content, created_secs, created_nanos)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                comment.id,
                comment.post_id,
                comment.parent_id,
                comment.author_id,
                comment.content,
                created_secs,
                created_nanos,
            ],
        )
        .with_context(|| format!("Failed to insert comment {}", comment.id))?;
        tx.commit().context("Failed to commit comment")?;

        debug!("[STORE] Created comment {} on post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    fn get_comment(&self, id: CommentId) -> StorageResult<Comment> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, post_id, parent_id, author_id, content, created_secs, created_nanos
             FROM comments WHERE id = ?1",
            [id],
            comment_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to load comment {}", id))?
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
        let (limit, offset) = page.sql_params();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, parent_id, author_id, content, created_secs, created_nanos
             FROM comments
             WHERE post_id = ?1
             ORDER BY created_secs, created_nanos, id
             LIMIT ?2 OFFSET ?3",
        )?;

        let comments = stmt
            .query_map(params![post_id, limit, offset], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list comments for post {}", post_id))?;

        Ok(comments)
    }

    fn update_comment(&self, comment: Comment) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let exists = tx
            .query_row("SELECT 1 FROM comments WHERE id = ?1", [comment.id], |_| Ok(()))
            .optional()
            .with_context(|| format!("Failed to load comment {}", comment.id))?
            .is_some();
        if !exists {
            return Err(StorageError::CommentNotFound);
        }

        if comment.is_too_long() {
            return Err(StorageError::too_long(comment.content_len()));
        }

        // Only content is written; post, parent, author and creation time stay as stored
        tx.execute(
            "UPDATE comments SET content = ?2 WHERE id = ?1",
            params![comment.id, comment.content],
        )
        .with_context(|| format!("Failed to update comment {}", comment.id))?;
        tx.commit().context("Failed to commit comment update")?;

        debug!("[STORE] Updated comment {}", comment.id);
        Ok(())
    }

    fn delete_comment(&self, id: CommentId) -> StorageResult<()> {
        let conn = self.conn()?;
        // Replies go with it through ON DELETE CASCADE on parent_id
        let deleted = conn
            .execute("DELETE FROM comments WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete comment {}", id))?;

        if deleted == 0 {
            return Err(StorageError::CommentNotFound);
        }

        debug!("[STORE] Deleted comment {}", id);
        Ok(())
    }
}
