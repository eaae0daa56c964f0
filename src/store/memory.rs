use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DocumentStore, ItemId, Result, StorageError};

/// In-memory store, for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<ItemId, String>>,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<ItemId>, text: impl Into<String>) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(id.into(), text.into());
        }
    }

    pub fn get(&self, id: &ItemId) -> Option<String> {
        self.docs.lock().ok()?.get(id).cloned()
    }

    /// Make every following write fail with `WriteRejected`
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn poisoned() -> StorageError {
    StorageError::Task("memory store lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, id: &ItemId) -> Result<String> {
        let docs = self.docs.lock().map_err(|_| poisoned())?;
        docs.get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }

    async fn write(&self, id: &ItemId, text: &str) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected(id.clone()));
        }
        let mut docs = self.docs.lock().map_err(|_| poisoned())?;
        docs.insert(id.clone(), text.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ItemId>> {
        let docs = self.docs.lock().map_err(|_| poisoned())?;
        Ok(docs.keys().cloned().collect())
    }
}
