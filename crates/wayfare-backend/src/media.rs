//! Media library: uploaded images and videos behind the public CDN

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

use crate::address::ContentAddress;
use crate::datastore::{Datastore, MEDIA_ASSETS};
use crate::error::{BackendError, Result};
use crate::storage::BlobStorage;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// An uploaded file as listed in the media library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub public_id: String,
    pub url: String,
    pub content_type: String,
    pub bytes: u64,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A file to add to the library
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaStatus {
    pub enabled: bool,
    pub assets: usize,
}

fn extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct MediaLibrary {
    blobs: Arc<dyn BlobStorage>,
    datastore: Datastore,
    public_base_url: String,
}

impl MediaLibrary {
    pub fn new(
        blobs: Arc<dyn BlobStorage>,
        datastore: Datastore,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            datastore,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, public_id: &str) -> String {
        format!("{}/{}", self.public_base_url, public_id)
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<MediaAsset>> {
        let mut assets: Vec<MediaAsset> = self.datastore.list_docs(MEDIA_ASSETS).await?;
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assets)
    }

    /// Store an image or video; uploading the same bytes twice returns the
    /// existing asset
    pub async fn upload(&self, upload: Upload) -> Result<MediaAsset> {
        let content_type = upload.content_type.trim().to_lowercase();
        let Some(ext) = extension(&content_type) else {
            return Err(BackendError::invalid(
                "content_type",
                "Only image and video uploads are supported",
            ));
        };
        if upload.data.is_empty() {
            return Err(BackendError::invalid("file", "File is empty"));
        }
        if upload.data.len() > MAX_UPLOAD_BYTES {
            return Err(BackendError::invalid("file", "File is larger than 10 MB"));
        }

        let hash = ContentAddress::hash(&upload.data);
        let public_id = ContentAddress::media_key(&hash, Some(ext));
        let doc_id = ContentAddress::extract_hash_value(&hash);

        if let Some(existing) = self
            .datastore
            .get_doc::<MediaAsset>(MEDIA_ASSETS, doc_id)
            .await?
        {
            return Ok(existing);
        }

        let bytes = upload.data.len() as u64;
        self.blobs.put(&public_id, upload.data).await?;

        let asset = MediaAsset {
            url: self.public_url(&public_id),
            public_id,
            content_type,
            bytes,
            filename: upload.filename,
            created_at: OffsetDateTime::now_utc(),
        };
        self.datastore.put_doc(MEDIA_ASSETS, doc_id, &asset).await?;

        info!("Uploaded {} ({} bytes)", asset.public_id, asset.bytes);
        Ok(asset)
    }

    pub async fn delete(&self, public_id: &str) -> Result<()> {
        let doc_id = public_id
            .strip_prefix("media/")
            .and_then(|name| name.split('.').next())
            .filter(|hash| ContentAddress::is_valid_hash(&format!("sha256:{}", hash)))
            .ok_or_else(|| BackendError::invalid("public_id", "Unknown media id"))?;

        if self
            .datastore
            .get_doc::<MediaAsset>(MEDIA_ASSETS, doc_id)
            .await?
            .is_none()
        {
            return Err(BackendError::NotFound(format!("Media {}", public_id)));
        }

        self.blobs.delete(public_id).await?;
        self.datastore.store().delete(MEDIA_ASSETS, doc_id).await?;

        info!("Deleted {}", public_id);
        Ok(())
    }

    pub async fn status(&self) -> Result<MediaStatus> {
        Ok(MediaStatus {
            enabled: true,
            assets: self.blobs.list_keys("media/").await?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, MemoryStore};

    fn library() -> (Arc<MemoryStorage>, MediaLibrary) {
        let blobs = Arc::new(MemoryStorage::new());
        let datastore = Datastore::new(Arc::new(MemoryStore::new()));
        let library = MediaLibrary::new(blobs.clone(), datastore, "https://cdn.example.com/");
        (blobs, library)
    }

    fn png(data: &[u8]) -> Upload {
        Upload {
            filename: Some("riad.png".to_string()),
            content_type: "image/png".to_string(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_is_content_addressed() {
        let (blobs, library) = library();
        let asset = library.upload(png(b"pixels")).await.unwrap();
        assert!(asset.public_id.starts_with("media/"));
        assert!(asset.public_id.ends_with(".png"));
        assert_eq!(asset.url, format!("https://cdn.example.com/{}", asset.public_id));

        let again = library.upload(png(b"pixels")).await.unwrap();
        assert_eq!(again, asset);
        assert_eq!(blobs.len(), 1);
        assert_eq!(library.status().await.unwrap().assets, 1);
    }

    #[tokio::test]
    async fn test_rejects_unsupported_uploads() {
        let (_, library) = library();
        let pdf = Upload {
            content_type: "application/pdf".to_string(),
            ..png(b"%PDF")
        };
        assert!(matches!(library.upload(pdf).await, Err(BackendError::Validation(_))));
        assert!(library.upload(png(b"")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_blob_and_listing() {
        let (blobs, library) = library();
        let asset = library.upload(png(b"pixels")).await.unwrap();
        library.delete(&asset.public_id).await.unwrap();

        assert!(blobs.is_empty());
        assert!(library.list().await.unwrap().is_empty());
        assert!(matches!(
            library.delete(&asset.public_id).await,
            Err(BackendError::NotFound(_))
        ));
        assert!(library.delete("media/nope.png").await.is_err());
    }
}
