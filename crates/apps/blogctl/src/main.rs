//! blogctl - print posts and comment threads from the configured store
//!
//! Usage: `blogctl [limit] [offset] [post-id]`
//!
//! The backend comes from `~/.config/blog/storage.json` (or the file named by
//! `BLOG_CONFIG`), falling back to `STORAGE_TYPE` and friends.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use blog::{PostId, Storage, StorageConfig};
use log::{error, info, warn};

const DEFAULT_LIMIT: i64 = 20;

struct Args {
    limit: i64,
    offset: i64,
    post_id: Option<PostId>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let limit = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid limit: {:?}", raw))?,
        None => DEFAULT_LIMIT,
    };
    let offset = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid offset: {:?}", raw))?,
        None => 0,
    };
    let post_id = match args.next() {
        Some(raw) => Some(
            raw.parse::<PostId>()
                .with_context(|| format!("Invalid post id: {:?}", raw))?,
        ),
        None => None,
    };
    if let Some(extra) = args.next() {
        bail!("Unexpected argument: {:?}", extra);
    }

    Ok(Args {
        limit,
        offset,
        post_id,
    })
}

fn load_config() -> Result<StorageConfig> {
    match config::env_var("BLOG_CONFIG") {
        Some(path) => StorageConfig::from_file(&PathBuf::from(path)),
        None => {
            if let Some(path) = StorageConfig::default_config_path()
                && !path.exists()
            {
                info!("No config file at {}, reading environment", path.display());
            }
            StorageConfig::load()
        }
    }
}

/// Render the requested page (or one post's detail) as pretty JSON
fn render(store: &dyn Storage, args: &Args) -> Result<String> {
    match args.post_id {
        Some(post_id) => {
            let result = blog::get_post_detail(store, post_id, args.limit, args.offset);
            let detail = match result {
                Err(e) if e.is_not_found() => bail!("No post with id {}", post_id),
                result => result?,
            };
            info!(
                "Loaded post {} with {} top-level comments",
                post_id,
                detail.comments.len()
            );
            Ok(serde_json::to_string_pretty(&detail)?)
        }
        None => {
            let posts = blog::list_posts(store, args.limit, args.offset)?;
            info!("Loaded {} posts", posts.len());
            Ok(serde_json::to_string_pretty(&posts)?)
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    let storage_config = load_config()?;
    let store = blog::open_storage(&storage_config)?;

    println!("{}", render(store.as_ref(), &args)?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
