//! Initialization helpers for the application startup.

use crate::config::Config;
use crate::store::{FilterStore, MemoryStore, SqliteStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Builds the configured store flavor. Unknown backends fall back to the
/// durable default.
pub fn init_store(config: &Config) -> Result<Arc<dyn FilterStore>> {
    match config.storage.backend.as_str() {
        "memory" => {
            info!("Using in-memory store (state is not persisted)");
            Ok(Arc::new(MemoryStore::new()))
        }
        backend => {
            if backend != "sqlite" {
                info!("Unknown storage backend '{}', defaulting to sqlite", backend);
            }
            let store = SqliteStore::open(config.storage.sqlite_path.clone())?;
            store.initialize()?;
            Ok(Arc::new(store))
        }
    }
}
