//! Storage traits and implementations
//!
//! This module defines the storage abstraction layer for posts and comments.
//! The trait-based design allows swapping between in-memory and persistent
//! storage implementations; callers hold an `Arc<dyn Storage>`.

mod memory;
mod page;
mod sqlite;
mod traits;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::{BackendKind, StorageConfig};

pub use memory::InMemoryStorage;
pub use page::Page;
pub use sqlite::{DEFAULT_TIMEOUT, SqliteStorage};
pub use traits::Storage;

/// Open the backend selected by `config`
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        BackendKind::Memory => {
            info!("Using in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        BackendKind::Sqlite => {
            if let Some(parent) = config.sqlite.path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            info!("Using SQLite storage at {}", config.sqlite.path.display());
            let store = SqliteStorage::open(&config.sqlite.path, config.sqlite.timeout())?;
            Ok(Arc::new(store))
        }
    }
}
