//! Document storage for the service layer
//!
//! `DocumentStore` is the seam to the document database. Two backends ship
//! with the crate: an in-memory store (tests, demos) and a JSON-file store
//! that keeps one file per collection via `JsonMapStore`.

pub mod json_map_store;
pub mod document_store;
pub mod memory;
pub mod file;

pub use document_store::{DocumentStore, WriteMode};
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

use std::sync::Arc;

use configs::{StoreBackend, StoreConfig};

use crate::errors::ServiceError;

/// Open the backend selected by configuration.
pub async fn open(cfg: &StoreConfig) -> Result<Arc<dyn DocumentStore>, ServiceError> {
    match cfg.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryDocumentStore::new())),
        StoreBackend::File => Ok(Arc::new(FileDocumentStore::open(&cfg.data_dir).await?)),
    }
}
