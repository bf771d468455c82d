//! Client-side response cache over a `KvStorage`.
//!
//! Entries live under `<namespace prefix>_<k=v&k=v>` with parameters sorted by
//! key, and hold `{timestamp, data, params}`. Storage failures never reach
//! the caller: they are logged and, for writes, trigger eviction of the
//! oldest half of all cache entries.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::storage::KvStorage;

/// Five minutes.
pub const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Query parameters identifying one cached response. Sorted by key, so
/// insertion order never changes the derived key.
pub type CacheParams = BTreeMap<String, String>;

pub fn params<I, K, V>(pairs: I) -> CacheParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.to_string())).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Services,
    Prices,
    /// Unpaginated services used to populate filter options.
    ServicesAll,
    PricesAll,
}

impl Namespace {
    pub const ALL: [Namespace; 4] =
        [Namespace::Services, Namespace::Prices, Namespace::ServicesAll, Namespace::PricesAll];

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Services => "catalog_services_cache",
            Namespace::Prices => "catalog_prices_cache",
            Namespace::ServicesAll => "catalog_services_all_cache",
            Namespace::PricesAll => "catalog_prices_all_cache",
        }
    }

    pub fn from_resource(name: &str) -> Option<Self> {
        match name {
            "services" => Some(Namespace::Services),
            "prices" => Some(Namespace::Prices),
            "servicesAll" => Some(Namespace::ServicesAll),
            "pricesAll" => Some(Namespace::PricesAll),
            _ => None,
        }
    }

    /// The "all records" namespace paired with a paginated one.
    pub fn all_records(&self) -> Option<Namespace> {
        match self {
            Namespace::Services => Some(Namespace::ServicesAll),
            Namespace::Prices => Some(Namespace::PricesAll),
            _ => None,
        }
    }
}

/// What gets stored under a cache key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: i64,
    pub data: Value,
    #[serde(default)]
    pub params: CacheParams,
}

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(AtomicI64::new(start_ms))
    }

    pub fn set(&self, ms: i64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), ttl_ms: default_ttl_ms() }
    }
}

fn default_enabled() -> bool { true }
fn default_ttl_ms() -> i64 { CACHE_TTL_MS }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub services: usize,
    pub prices: usize,
    /// Characters stored across every storage value.
    #[serde(rename = "totalSize")]
    pub total_size: usize,
    #[serde(rename = "totalSizeKB")]
    pub total_size_kb: usize,
}

pub struct CacheService {
    storage: Arc<dyn KvStorage>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl CacheService {
    pub fn new(storage: Arc<dyn KvStorage>, config: CacheConfig) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock), config)
    }

    pub fn with_clock(storage: Arc<dyn KvStorage>, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self { storage, clock, config }
    }

    pub fn storage(&self) -> &Arc<dyn KvStorage> {
        &self.storage
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// `prefix` alone when `params` is empty, else `prefix_k=v&k=v`.
    pub fn build_key(prefix: &str, params: &CacheParams) -> String {
        if params.is_empty() {
            return prefix.to_string();
        }
        let joined = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
        format!("{prefix}_{joined}")
    }

    pub fn set(&self, ns: Namespace, data: &Value, params: &CacheParams) {
        if !self.config.enabled {
            return;
        }
        let key = Self::build_key(ns.prefix(), params);
        let entry = CacheEntry { timestamp: self.clock.now_ms(), data: data.clone(), params: params.clone() };
        let encoded = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(%key, error = %e, "cache entry not serializable");
                return;
            }
        };
        match self.storage.set_item(&key, &encoded) {
            Ok(()) => debug!(%key, "cache saved"),
            Err(e) => {
                warn!(%key, error = %e, "cache write failed, evicting old entries");
                self.clear_old_caches();
            }
        }
    }

    /// Cached data for `params`, or `None` on miss, unreadable entry or
    /// expiry. Expired entries are removed.
    pub fn get(&self, ns: Namespace, params: &CacheParams) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }
        let key = Self::build_key(ns.prefix(), params);
        let raw = self.storage.get_item(&key)?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "unreadable cache entry");
                return None;
            }
        };
        let age = self.clock.now_ms() - entry.timestamp;
        if age > self.config.ttl_ms {
            debug!(%key, age_s = age / 1000, "cache expired");
            self.remove(&key);
            return None;
        }
        debug!(%key, age_s = age / 1000, "cache hit");
        Some(entry.data)
    }

    pub fn set_typed<T: Serialize>(&self, ns: Namespace, data: &T, params: &CacheParams) {
        match serde_json::to_value(data) {
            Ok(v) => self.set(ns, &v, params),
            Err(e) => warn!(error = %e, "cache value not serializable"),
        }
    }

    /// Like `get`, decoding into `T`; an entry of the wrong shape is a miss.
    pub fn get_typed<T: DeserializeOwned>(&self, ns: Namespace, params: &CacheParams) -> Option<T> {
        let value = self.get(ns, params)?;
        match serde_json::from_value(value) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(prefix = ns.prefix(), error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Drop every entry of a resource (`services`, `prices`, ...). For the
    /// paginated namespaces the matching "all records" namespace goes too.
    /// Unknown names are used as a raw key prefix.
    pub fn invalidate(&self, resource: &str) -> usize {
        let Some(ns) = Namespace::from_resource(resource) else {
            return self.invalidate_by_prefix(resource);
        };
        let mut removed = self.invalidate_by_prefix(ns.prefix());
        if let Some(all) = ns.all_records() {
            removed += self.invalidate_by_prefix(all.prefix());
        }
        debug!(resource, removed, "cache invalidated");
        removed
    }

    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self.storage.keys().into_iter().filter(|k| k.starts_with(prefix)).collect();
        for key in &keys {
            self.remove(key);
        }
        keys.len()
    }

    pub fn clear_all(&self) {
        let removed: usize = Namespace::ALL.iter().map(|ns| self.invalidate_by_prefix(ns.prefix())).sum();
        info!(removed, "all caches cleared");
    }

    /// Evict the oldest `ceil(n/2)` entries across every namespace; entries
    /// that fail to parse count as oldest. Returns how many were removed.
    pub fn clear_old_caches(&self) -> usize {
        let keys = self.storage.keys();
        let mut entries: Vec<(String, i64)> = Vec::new();
        for ns in Namespace::ALL {
            for key in keys.iter().filter(|k| k.starts_with(ns.prefix())) {
                let Some(raw) = self.storage.get_item(key) else { continue };
                let timestamp = serde_json::from_str::<Value>(&raw)
                    .ok()
                    .and_then(|v| v.get("timestamp").and_then(Value::as_i64))
                    .unwrap_or(0);
                entries.push((key.clone(), timestamp));
            }
        }
        entries.sort_by_key(|(_, ts)| *ts);
        let evict = entries.len().div_ceil(2);
        for (key, _) in entries.iter().take(evict) {
            self.remove(key);
        }
        info!(evicted = evict, "cleared old caches");
        evict
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for key in self.storage.keys() {
            let Some(value) = self.storage.get_item(&key) else { continue };
            stats.total_size += value.len();
            if key.starts_with(Namespace::Services.prefix()) {
                stats.services += 1;
            }
            if key.starts_with(Namespace::Prices.prefix()) {
                stats.prices += 1;
            }
        }
        stats.total_size_kb = (stats.total_size as f64 / 1024.0).round() as usize;
        stats
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            warn!(%key, error = %e, "cache removal failed");
        }
    }
}
