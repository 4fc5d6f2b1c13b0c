//! In-memory document store for tests and development

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::DocumentStore;
use crate::error::{BackendError, Result};

type Collections = HashMap<String, Vec<(String, Value)>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    offline: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, to exercise error paths
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Keep reads working but make every write fail
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn lock_for_write(&self) -> Result<MutexGuard<'_, Collections>> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("Document store is read-only".into()));
        }
        self.lock()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("Document store is offline".into()));
        }
        self.collections
            .lock()
            .map_err(|_| BackendError::Storage("Lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let mut collections = self.lock_for_write()?;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(doc_id, _)| doc_id == id) {
            Some((_, existing)) => *existing = document,
            None => docs.push((id.to_string(), document)),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.lock_for_write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);
        Ok(docs.len() != before)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(self
            .lock()?
            .get(collection)
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn replace_collection(
        &self,
        collection: &str,
        documents: Vec<(String, Value)>,
    ) -> Result<()> {
        self.lock_for_write()?
            .insert(collection.to_string(), documents);
        Ok(())
    }
}
