//! Storage backend setup.

use std::sync::Arc;

use anyhow::{Context, Result};
use tablero_core::{Config, StorageBackendKind};
use tablero_storage::{LocalStorage, S3Storage, Storage};

/// Build the storage backend selected by configuration.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackendKind::Local => {
            let path = config
                .local_storage_path
                .clone()
                .context("LOCAL_STORAGE_PATH is required for local storage")?;
            let base_url = config
                .local_storage_base_url
                .clone()
                .context("LOCAL_STORAGE_BASE_URL is required for local storage")?;
            let storage = LocalStorage::new(path, base_url)
                .await
                .context("Failed to initialize local storage")?;
            tracing::info!(backend = "local", "Storage initialized");
            Ok(Arc::new(storage))
        }
        StorageBackendKind::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .context("S3_BUCKET is required for s3 storage")?;
            let region = config
                .s3_region
                .clone()
                .context("S3_REGION is required for s3 storage")?;
            let storage = S3Storage::new(bucket, region, config.s3_endpoint.clone())
                .await
                .context("Failed to initialize s3 storage")?;
            tracing::info!(backend = "s3", "Storage initialized");
            Ok(Arc::new(storage))
        }
    }
}
