//! Storage abstraction for documents and media blobs

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod blob_storage;
pub mod memory;

pub use blob_storage::{BlobStorage, MemoryStorage, StorageError};
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub mod sqlite_storage;

#[cfg(feature = "sqlite")]
pub use sqlite_storage::SqliteStore;

// S3 implementation
#[cfg(feature = "s3")]
pub mod s3_storage;

/// JSON document database organised in named collections
///
/// Collections keep insertion order: `list` returns documents in the order
/// they were first written, and overwriting a document keeps its place.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Create or overwrite a document
    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// Remove a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Every document of a collection
    async fn list(&self, collection: &str) -> Result<Vec<Value>>;

    /// Replace the whole collection in one write
    async fn replace_collection(&self, collection: &str, documents: Vec<(String, Value)>)
    -> Result<()>;
}
