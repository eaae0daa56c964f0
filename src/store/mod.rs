//! Document storage collaborators
//!
//! The core only ever reads a note's full text, writes it back whole, and
//! lists what exists. Everything else about storage lives behind
//! `DocumentStore`.

mod file_store;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Identifier of a stored note: its `/`-separated path relative to the
/// store root, e.g. `lectures/calculus/01-limits.md`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Invalid item id: {0}")]
    InvalidId(String),

    #[error("Write rejected for {0}")]
    WriteRejected(ItemId),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Where notes live.
///
/// Calls are awaited one at a time by the core; implementations need no
/// internal ordering guarantees beyond completing or failing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, id: &ItemId) -> Result<String>;

    async fn write(&self, id: &ItemId, text: &str) -> Result<()>;

    /// All notes in the store, sorted by id
    async fn list(&self) -> Result<Vec<ItemId>>;
}
