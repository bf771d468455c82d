use std::collections::BTreeMap;

use async_trait::async_trait;
use models::Document;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::document_store::{apply_write, DocumentStore, WriteMode};
use crate::errors::ServiceError;

type Collection = BTreeMap<String, Map<String, Value>>;

/// In-process document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>, ServiceError> {
        let cols = self.collections.read().await;
        Ok(cols.iter().filter(|(_, docs)| !docs.is_empty()).map(|(name, _)| name.clone()).collect())
    }

    async fn scan(&self, collection: &str, max: usize) -> Result<Vec<Document>, ServiceError> {
        let cols = self.collections.read().await;
        Ok(cols
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .take(max)
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> Result<u64, ServiceError> {
        let cols = self.collections.read().await;
        Ok(cols.get(collection).map(|d| d.len() as u64).unwrap_or(0))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ServiceError> {
        let cols = self.collections.read().await;
        Ok(cols
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mode: WriteMode,
    ) -> Result<Document, ServiceError> {
        let mut cols = self.collections.write().await;
        let docs = cols.entry(collection.to_string()).or_default();
        if let Some(fresh) = apply_write(docs.get_mut(id), fields, mode) {
            docs.insert(id.to_string(), fresh);
        }
        let stored = docs.get(id).cloned().unwrap_or_default();
        Ok(Document::new(id, stored))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError> {
        let mut cols = self.collections.write().await;
        if let Some(docs) = cols.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}
