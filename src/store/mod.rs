//! Post store
//!
//! Owns the persisted post collection and the id counter. Every request
//! loads a fresh snapshot, mutates it, and persists the whole document back.

mod error;
mod file;
mod memory;
mod model;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use model::{Emotion, Post, StoreState};

use crate::config::{StorageBackend, StorageConfig};
use crate::logger;

/// Backing medium for the post collection
///
/// Both operations are complete (and, for durable backends, on disk)
/// before they return. Nothing is buffered across calls.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Current state, or the default empty state if none exists yet.
    ///
    /// Backends may degrade to the empty state when the medium cannot be
    /// read, so the result is only fit for read-only views.
    async fn load(&self) -> Result<StoreState>;

    /// Current state as the basis of a load, mutate, persist cycle.
    ///
    /// Never substitutes the empty state for an unreadable medium: a
    /// snapshot returned here may be written back over the stored one.
    async fn load_for_update(&self) -> Result<StoreState> {
        self.load().await
    }

    /// Replace the stored state with `state`
    async fn persist(&self, state: &StoreState) -> Result<()>;

    /// Short backend name for logs
    fn describe(&self) -> String;
}

pub type SharedStore = Arc<dyn PostStore>;

/// Construct the configured backend.
///
/// The file backend is initialized eagerly so an unusable medium is
/// reported here, at startup, instead of on the first request.
pub async fn open_store(config: &StorageConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        StorageBackend::File => Arc::new(JsonFileStore::open(&config.path).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    logger::log_store_opened(&store.describe());
    Ok(store)
}
