//! Client side of the catalog admin: a typed API client, a TTL response
//! cache over persistent key-value storage, and the controller that drives
//! the dashboard's lists, editors and notifications.

pub mod api;
pub mod cache;
pub mod confirm;
pub mod controller;
pub mod debounce;
pub mod errors;
pub mod modal;
pub mod state;
pub mod storage;

use serde::Deserialize;

pub use api::ApiClient;
pub use cache::{CacheConfig, CacheService, Namespace};
pub use controller::{DashboardController, LoadSource};
pub use errors::{ClientError, StorageError};
pub use state::{DashboardState, Toast, ToastLevel, View};
pub use storage::{FileStorage, KvStorage, MemoryStorage};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root of the REST API, e.g. `http://127.0.0.1:3000/`.
    pub base_url: String,
    /// Per-request timeout; unset means none.
    pub request_timeout_ms: Option<u64>,
    pub default_limit: u32,
    pub cache: CacheConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/".to_string(),
            request_timeout_ms: None,
            default_limit: state::DEFAULT_CLIENT_LIMIT,
            cache: CacheConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
