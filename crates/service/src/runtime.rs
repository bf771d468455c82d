//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can run the startup
//! checks through `service::runtime::ensure_env` without depending directly
//! on `common`.

use configs::{AppConfig, StoreBackend};

/// Check the static dashboard directory and, for the file backend, create
/// the data directory.
pub async fn ensure_env(cfg: &AppConfig) -> anyhow::Result<()> {
    let data_dir = match cfg.store.backend {
        StoreBackend::File => Some(cfg.store.data_dir.as_str()),
        StoreBackend::Memory => None,
    };
    common::env::ensure_env(&cfg.server.static_dir, data_dir).await
}
