#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use quire_core::Config;
use std::sync::Arc;

fn required(value: Option<&str>, name: &str) -> StorageResult<String> {
    value
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
}

/// Build the media store selected by `STORAGE_BACKEND`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        StorageBackend::S3 => s3_storage(config),
        StorageBackend::Local => local_storage(config).await,
    }
}

#[cfg(feature = "storage-s3")]
fn s3_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let bucket = required(config.s3_bucket(), "S3_BUCKET")?;
    let region = config.s3_region().unwrap_or("auto").to_string();
    let storage = S3Storage::new(
        bucket,
        region,
        config.s3_endpoint().map(String::from),
        config.s3_public_url().map(String::from),
    )?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "storage-s3"))]
fn s3_storage(_config: &Config) -> StorageResult<Arc<dyn Storage>> {
    Err(StorageError::ConfigError(
        "quire-storage was built without the storage-s3 feature".to_string(),
    ))
}

#[cfg(feature = "storage-local")]
async fn local_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let base_path = required(config.local_storage_path(), "LOCAL_STORAGE_PATH")?;
    let base_url = required(config.local_storage_base_url(), "LOCAL_STORAGE_BASE_URL")?;
    Ok(Arc::new(LocalStorage::new(base_path, base_url).await?))
}

#[cfg(not(feature = "storage-local"))]
async fn local_storage(_config: &Config) -> StorageResult<Arc<dyn Storage>> {
    Err(StorageError::ConfigError(
        "quire-storage was built without the storage-local feature".to_string(),
    ))
}
