use std::path::PathBuf;
use std::sync::Arc;

use configs::AppConfig;
use service::storage::{DocumentStore, MemoryDocumentStore};
use service::RecordService;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub records: RecordService,
    /// Directory with the dashboard's static assets.
    pub static_dir: PathBuf,
}

impl ServerState {
    pub fn new(records: RecordService, static_dir: impl Into<PathBuf>) -> Self {
        Self { records, static_dir: static_dir.into() }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, cfg: &AppConfig) -> Self {
        Self::new(RecordService::from_config(store, cfg), &cfg.server.static_dir)
    }

    /// State over a fresh in-memory store with default settings.
    pub fn in_memory() -> Self {
        Self::from_config(Arc::new(MemoryDocumentStore::new()), &AppConfig::default())
    }
}
