//! S3-compatible media storage using the MinIO client
//!
//! Works with AWS S3, MinIO, and any S3-compatible object storage that sits
//! behind the public media CDN.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use minio::s3::{
    client::Client,
    creds::StaticProvider,
    http::BaseUrl,
    segmented_bytes::SegmentedBytes,
    types::{S3Api, ToStream},
};
use std::str::FromStr;

use super::blob_storage::{BlobStorage, StorageError};

pub struct S3Storage {
    client: Client,
    bucket: String,
}

/// Credentials and location of the media bucket
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client for the configured endpoint
    pub fn connect(settings: &S3Settings) -> Result<Self, StorageError> {
        let base_url = BaseUrl::from_str(&settings.endpoint_url)
            .map_err(|e| StorageError::Backend(format!("Invalid MEDIA_ENDPOINT_URL: {}", e)))?;

        let creds_provider =
            StaticProvider::new(&settings.access_key_id, &settings.secret_access_key, None);

        let client = Client::new(base_url, Some(Box::new(creds_provider)), None, None)
            .map_err(|e| StorageError::Backend(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self::new(client, settings.bucket.clone()))
    }

    /// Create the bucket when it does not exist yet
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let response = self
            .client
            .bucket_exists(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("Failed to check bucket '{}': {}", self.bucket, e))
            })?;

        if response.exists {
            return Ok(());
        }

        self.client
            .create_bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("Failed to create bucket '{}': {}", self.bucket, e))
            })?;
        Ok(())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn validate_key(&self, key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.len() > 1024 {
            return Err(StorageError::InvalidKey(
                "Key must be between 1 and 1024 characters".into(),
            ));
        }

        if key.starts_with('/') || key.ends_with('/') {
            return Err(StorageError::InvalidKey(
                "Key cannot start or end with '/'".into(),
            ));
        }

        Ok(())
    }

    fn is_not_found(error: &impl std::fmt::Display) -> bool {
        let message = error.to_string();
        message.contains("NoSuchKey") || message.contains("404")
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.validate_key(key)?;

        let bytes = SegmentedBytes::from(Bytes::from(data));

        self.client
            .put_object(&self.bucket, key, bytes)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to upload '{}': {}", key, e)))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.validate_key(key)?;

        let response = self
            .client
            .get_object(&self.bucket, key)
            .send()
            .await
            .map_err(|e| {
                if Self::is_not_found(&e) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Backend(format!("Failed to fetch '{}': {}", key, e))
                }
            })?;

        let content = response.content.to_segmented_bytes().await.map_err(|e| {
            StorageError::Backend(format!("Failed to read '{}' content: {}", key, e))
        })?;

        Ok(content.to_bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.validate_key(key)?;

        match self.client.stat_object(&self.bucket, key).send().await {
            Ok(_) => Ok(true),
            Err(e) if Self::is_not_found(&e) => Ok(false),
            Err(e) => Err(StorageError::Backend(format!(
                "Failed to check existence of '{}': {}",
                key, e
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.validate_key(key)?;

        self.client
            .delete_object(&self.bucket, key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to delete '{}': {}", key, e)))?;

        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut stream = self
            .client
            .list_objects(&self.bucket)
            .prefix(Some(prefix.to_string()))
            .recursive(true)
            .to_stream()
            .await;

        while let Some(result) = stream.next().await {
            let response = result.map_err(|e| {
                StorageError::Backend(format!("Failed to list prefix '{}': {}", prefix, e))
            })?;
            keys.extend(response.contents.into_iter().map(|entry| entry.name));
        }

        Ok(keys)
    }
}
