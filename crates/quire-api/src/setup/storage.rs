//! Storage setup and initialization

use anyhow::{Context, Result};
use quire_core::Config;
use quire_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(
        backend = ?storage.backend_type(),
        public_base_url = %storage.public_base_url(),
        "Storage initialized successfully"
    );
    Ok(storage)
}
