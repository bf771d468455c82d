use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::Document;
use serde_json::{Map, Value};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::document_store::{apply_write, DocumentStore, WriteMode};
use super::json_map_store::JsonMapStore;
use crate::errors::ServiceError;

type CollectionStore = JsonMapStore<String, Map<String, Value>>;

/// Document store persisted as `<data_dir>/<collection>.json`.
pub struct FileDocumentStore {
    data_dir: PathBuf,
    open: RwLock<HashMap<String, Arc<CollectionStore>>>,
}

impl FileDocumentStore {
    pub async fn open<P: Into<PathBuf>>(data_dir: P) -> Result<Self, ServiceError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await.map_err(ServiceError::store)?;
        Ok(Self { data_dir, open: RwLock::new(HashMap::new()) })
    }

    fn file_for(&self, collection: &str) -> Result<PathBuf, ServiceError> {
        let valid = !collection.is_empty()
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ServiceError::Validation(format!("invalid collection name: {collection}")));
        }
        Ok(self.data_dir.join(format!("{collection}.json")))
    }

    /// Open (and cache) a collection file. With `create = false` a missing
    /// file yields `None` instead of being created.
    async fn collection(&self, name: &str, create: bool) -> Result<Option<Arc<CollectionStore>>, ServiceError> {
        if let Some(store) = self.open.read().await.get(name) {
            return Ok(Some(Arc::clone(store)));
        }
        let path = self.file_for(name)?;
        if !create && fs::metadata(&path).await.is_err() {
            return Ok(None);
        }
        let mut open = self.open.write().await;
        if let Some(store) = open.get(name) {
            return Ok(Some(Arc::clone(store)));
        }
        debug!(collection = %name, path = %path.display(), "opening collection file");
        let store = JsonMapStore::new(path).await?;
        open.insert(name.to_string(), Arc::clone(&store));
        Ok(Some(store))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>, ServiceError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await.map_err(ServiceError::store)?;
        while let Some(entry) = entries.next_entry().await.map_err(ServiceError::store)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if self.file_for(&name).is_err() {
                continue;
            }
            if let Some(store) = self.collection(&name, false).await? {
                if !store.is_empty().await {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn scan(&self, collection: &str, max: usize) -> Result<Vec<Document>, ServiceError> {
        let Some(store) = self.collection(collection, false).await? else {
            return Ok(Vec::new());
        };
        let mut entries = store.list().await;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries.into_iter().take(max).map(|(id, fields)| Document::new(id, fields)).collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, ServiceError> {
        match self.collection(collection, false).await? {
            Some(store) => Ok(store.len().await as u64),
            None => Ok(0),
        }
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ServiceError> {
        let Some(store) = self.collection(collection, false).await? else {
            return Ok(None);
        };
        Ok(store.get(&id.to_string()).await.map(|fields| Document::new(id, fields)))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mode: WriteMode,
    ) -> Result<Document, ServiceError> {
        let Some(store) = self.collection(collection, true).await? else {
            return Err(ServiceError::store(format!("cannot open collection {collection}")));
        };
        let key = id.to_string();
        let stored = store
            .update_map(move |map| {
                if let Some(fresh) = apply_write(map.get_mut(&key), fields, mode) {
                    map.insert(key.clone(), fresh);
                }
                Ok(map.get(&key).cloned().unwrap_or_default())
            })
            .await?;
        Ok(Document::new(id, stored))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError> {
        if let Some(store) = self.collection(collection, false).await? {
            store.remove(&id.to_string()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tmp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("file_doc_store_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn documents_survive_reopen() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = FileDocumentStore::open(&dir).await?;
        let fields = json!({"tipo": "X", "prices": {"HML": {"SP": "1.00"}}}).as_object().cloned().unwrap_or_default();
        store.set("services", "svc1", fields, WriteMode::Replace).await?;
        drop(store);

        let reopened = FileDocumentStore::open(&dir).await?;
        let doc = reopened.get("services", "svc1").await?.expect("persisted");
        assert_eq!(doc.get("tipo"), Some(&json!("X")));
        assert_eq!(reopened.list_collections().await?, vec!["services".to_string()]);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn reads_do_not_create_collection_files() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = FileDocumentStore::open(&dir).await?;
        assert!(store.scan("ghost", 10).await?.is_empty());
        assert_eq!(store.count("ghost").await?, 0);
        assert!(tokio::fs::metadata(dir.join("ghost.json")).await.is_err());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_path_like_collection_names() -> Result<(), anyhow::Error> {
        let dir = tmp_dir();
        let store = FileDocumentStore::open(&dir).await?;
        let res = store.set("../escape", "x", Map::new(), WriteMode::Replace).await;
        assert!(matches!(res, Err(ServiceError::Validation(_))));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
