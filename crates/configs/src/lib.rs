use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            worker_threads: Some(4),
            static_dir: default_static_dir(),
        }
    }
}

fn default_static_dir() -> String { "public".into() }

/// Which document store backs the HTTP API.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Upper bound on documents loaded per collection scan.
    #[serde(default = "default_max_scan")]
    pub max_scan: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { backend: StoreBackend::Memory, data_dir: default_data_dir(), max_scan: default_max_scan() }
    }
}

fn default_data_dir() -> String { "data/store".into() }
fn default_max_scan() -> usize { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    /// Largest accepted `limit`; 0 disables the clamp.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: default_page_limit(), max_limit: default_max_limit() }
    }
}

fn default_page_limit() -> u32 { 20 }
fn default_max_limit() -> u32 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_log_format() -> String { "compact".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Load from `CONFIG_PATH`/`config.toml`, falling back to defaults plus
    /// environment overrides when the file is missing.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => AppConfig::default(),
        };
        cfg.apply_env_overrides();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "file" => self.store.backend = StoreBackend::File,
                "memory" => self.store.backend = StoreBackend::Memory,
                _ => {}
            }
        }
        if let Ok(dir) = std::env::var("STORE_DATA_DIR") {
            self.store.data_dir = dir;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        self.pagination.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        if self.static_dir.trim().is_empty() {
            self.static_dir = default_static_dir();
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::File && self.data_dir.trim().is_empty() {
            return Err(anyhow!("store.data_dir is required for the file backend"));
        }
        if self.max_scan == 0 {
            return Err(anyhow!("store.max_scan must be >= 1"));
        }
        Ok(())
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(anyhow!("pagination.default_limit must be >= 1"));
        }
        if self.max_limit != 0 && self.max_limit < self.default_limit {
            return Err(anyhow!("pagination.max_limit must be 0 or >= default_limit"));
        }
        Ok(())
    }

    pub fn max_limit(&self) -> Option<u32> {
        (self.max_limit > 0).then_some(self.max_limit)
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        match self.format.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be compact or json, got {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let mut cfg = parse("").expect("parse");
        cfg.normalize_and_validate().expect("valid");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.pagination.default_limit, 20);
        assert_eq!(cfg.pagination.max_limit(), Some(1000));
        assert_eq!(cfg.store.max_scan, 10_000);
    }

    #[test]
    fn parses_full_document() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8088
            static_dir = "dashboard"

            [store]
            backend = "file"
            data_dir = "/tmp/catalog"

            [pagination]
            default_limit = 15
            max_limit = 0

            [logging]
            format = "json"
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8088");
        assert_eq!(cfg.store.backend, StoreBackend::File);
        assert_eq!(cfg.pagination.max_limit(), None);
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn rejects_max_limit_below_default() {
        let mut cfg = parse("[pagination]\ndefault_limit = 50\nmax_limit = 10\n").expect("parse");
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut cfg = parse("[logging]\nformat = \"xml\"\n").expect("parse");
        assert!(cfg.normalize_and_validate().is_err());
    }
}
