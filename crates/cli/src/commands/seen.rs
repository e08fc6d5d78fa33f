//! Seen command - inspect the notified-listing record

use anyhow::{Context, Result};
use room_watch_adapters::state::{FileSeenStore, InMemorySeenStore, SqliteSeenStore};
use room_watch_domain::{SeenStore, StoreError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::{SeenArgs, SeenCommands};
use crate::config::{AppConfig, StateBackend};

pub async fn execute(args: SeenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let path = &config.general.state_path;
    let ids = read_seen_ids(&config)
        .await
        .with_context(|| format!("Failed to load seen-set {}", path.display()))?;

    match args.command {
        SeenCommands::List { json } => {
            let mut ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            ids.sort_unstable();
            if json {
                let output = serde_json::json!({
                    "count": ids.len(),
                    "ids": ids,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
        SeenCommands::Count => println!("{}", ids.len()),
    }

    Ok(())
}

/// Read the configured seen-set without creating, migrating or repairing it
pub(crate) async fn read_seen_ids(config: &AppConfig) -> Result<HashSet<String>, StoreError> {
    let path = &config.general.state_path;
    match config.general.state_backend {
        StateBackend::File => FileSeenStore::read_ids(path).await,
        StateBackend::Sqlite => SqliteSeenStore::read_ids(path).await,
    }
}

/// Open the configured seen-set store
pub(crate) async fn open_store(config: &AppConfig, ephemeral: bool) -> Result<Arc<dyn SeenStore>> {
    if ephemeral {
        tracing::info!("Using in-memory seen-set");
        return Ok(Arc::new(InMemorySeenStore::new()));
    }

    let path = &config.general.state_path;
    let store: Arc<dyn SeenStore> = match config.general.state_backend {
        StateBackend::File => Arc::new(
            FileSeenStore::open(path)
                .await
                .with_context(|| format!("Failed to open seen-set file {}", path.display()))?,
        ),
        StateBackend::Sqlite => Arc::new(
            SqliteSeenStore::new(path)
                .await
                .with_context(|| format!("Failed to open seen-set database {}", path.display()))?,
        ),
    };

    Ok(store)
}
