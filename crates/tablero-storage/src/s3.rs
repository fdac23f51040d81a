use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible
    ///   providers (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn map_not_found(err: ObjectStoreError, key: &str) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::BackendError(other.to_string()),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let path = Path::from(storage_key);
        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        tracing::debug!(storage_key = %storage_key, bucket = %self.bucket, "Stored object in S3");
        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = Path::from(storage_key);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Self::map_not_found(e, storage_key))?;
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = Path::from(storage_key);
        self.store
            .delete(&path)
            .await
            .map_err(|e| Self::map_not_found(e, storage_key))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = Path::from(storage_key);
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    /// For AWS S3, the standard virtual-hosted URL; for S3-compatible
    /// providers, path-style from the configured endpoint.
    fn public_url(&self, storage_key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                storage_key
            )
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, storage_key
            )
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_public_url_virtual_hosted_style() {
        let storage = S3Storage::new("media".to_string(), "eu-west-1".to_string(), None)
            .await
            .expect("build store");
        assert_eq!(
            storage.public_url("a/b/c.png"),
            "https://media.s3.eu-west-1.amazonaws.com/a/b/c.png"
        );
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }

    #[tokio::test]
    async fn test_public_url_path_style_for_custom_endpoint() {
        let storage = S3Storage::new(
            "media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .await
        .expect("build store");
        assert_eq!(
            storage.public_url("a/b/c.png"),
            "http://localhost:9000/media/a/b/c.png"
        );
    }

    #[test]
    fn test_map_not_found_translates_missing_objects() {
        let missing = ObjectStoreError::NotFound {
            path: "a/b/c.png".to_string(),
            source: "gone".into(),
        };
        assert!(matches!(
            S3Storage::map_not_found(missing, "a/b/c.png"),
            StorageError::NotFound(_)
        ));

        let other = ObjectStoreError::Generic {
            store: "S3",
            source: "boom".into(),
        };
        assert!(matches!(
            S3Storage::map_not_found(other, "a/b/c.png"),
            StorageError::BackendError(_)
        ));
    }
}
