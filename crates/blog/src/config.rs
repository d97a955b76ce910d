//! Storage configuration
//!
//! Supports loading the backend selection from (in order of priority):
//! 1. JSON file (~/.config/blog/storage.json)
//! 2. Environment variables, each with a default when unset

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config filename in the blog config directory
const CONFIG_FILE: &str = "storage.json";

const ENV_STORAGE_TYPE: &str = "STORAGE_TYPE";
const ENV_DB_PATH: &str = "BLOG_DB_PATH";
const ENV_DB_TIMEOUT_MS: &str = "BLOG_DB_TIMEOUT_MS";

/// Connection settings for a Postgres deployment; the SQLite backend has no use for them
const IGNORED_POSTGRES_VARS: [&str; 5] = [
    "POSTGRES_HOST",
    "POSTGRES_PORT",
    "POSTGRES_USER",
    "POSTGRES_PASSWORD",
    "POSTGRES_DB",
];

const DEFAULT_DB_FILE: &str = "blog.sqlite";
const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Which storage backend to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    #[serde(alias = "in-memory", alias = "inmemory")]
    Memory,
    #[serde(alias = "persistent", alias = "postgres")]
    Sqlite,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown storage backend {0:?}, expected \"memory\" or \"sqlite\"")]
pub struct UnknownBackend(String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "sqlite" | "persistent" | "postgres" => Ok(Self::Sqlite),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Connection parameters for the persistent backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long one operation may wait on a locked database
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SqliteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn default_db_path() -> PathBuf {
    config::data_dir()
        .map(|dir| dir.join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Backend selection plus backend-specific settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

impl StorageConfig {
    /// Load configuration using the following priority:
    /// 1. JSON file (~/.config/blog/storage.json)
    /// 2. Environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(CONFIG_FILE) {
            return config::load_json(CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse storage config JSON")
    }

    /// Load configuration from environment variables
    ///
    /// - `STORAGE_TYPE`: `memory` (default) or `sqlite`
    /// - `BLOG_DB_PATH`: database file (default: `<data dir>/blog/blog.sqlite`)
    /// - `BLOG_DB_TIMEOUT_MS`: per-operation lock timeout (default: 3000)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(config::env_var)
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        for key in ignored_vars(&get) {
            warn!(
                "{} is set but has no effect; the persistent backend is SQLite at {}",
                key, ENV_DB_PATH
            );
        }

        let backend = match get(ENV_STORAGE_TYPE) {
            Some(raw) => raw.parse::<BackendKind>()?,
            None => BackendKind::default(),
        };

        let path = get(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let timeout_ms = match get(ENV_DB_TIMEOUT_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid value for {}: {:?}", ENV_DB_TIMEOUT_MS, raw))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            backend,
            sqlite: SqliteConfig { path, timeout_ms },
        })
    }

    /// Get the default config file path (~/.config/blog/storage.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }
}

/// Postgres connection variables present in the environment
fn ignored_vars(get: &impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
    IGNORED_POSTGRES_VARS
        .into_iter()
        .filter(|key| get(*key).is_some())
        .collect()
}
