//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Warn when the static dashboard directory is missing and create the data
/// directory used by the file-backed document store.
pub async fn ensure_env(static_dir: &str, data_dir: Option<&str>) -> anyhow::Result<()> {
    if tokio::fs::metadata(static_dir).await.is_err() {
        warn!(%static_dir, "static dashboard directory not found; assets will 404");
    }
    if let Some(data_dir) = data_dir {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_data_dir() -> anyhow::Result<()> {
        let base = std::env::temp_dir().join(format!("catalog_env_{}", std::process::id()));
        let data = base.join("store");
        let data_str = data.to_string_lossy().to_string();
        ensure_env("/nonexistent-static-dir", Some(&data_str)).await?;
        assert!(tokio::fs::metadata(&data).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&base).await;
        Ok(())
    }
}
