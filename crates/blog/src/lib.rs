//! Blog crate - storage layer for posts and threaded comments
//!
//! This crate provides:
//! - Domain models (Post, Comment and their identifiers)
//! - The `Storage` trait with in-memory and SQLite backends
//! - Storage configuration and a backend factory
//! - Query helpers for read-side consumers
//!
//! Both backends enforce the same referential-integrity rules and report the
//! same [`StorageError`] kinds, so they can be swapped at startup.

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod storage;

pub use config::{BackendKind, SqliteConfig, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AuthorId, Comment, CommentId, MAX_COMMENT_LENGTH, Post, PostId};
pub use query::{CommentNode, PostDetail, PostSummary, build_comment_tree, get_post_detail, list_posts};
pub use storage::{InMemoryStorage, Page, SqliteStorage, Storage, open_storage};
