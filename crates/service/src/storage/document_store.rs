use async_trait::async_trait;
use models::Document;
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// How `set` treats an existing document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite every field.
    Replace,
    /// Deep-merge the given fields into what is stored (upsert when absent).
    Merge,
}

/// Trait abstraction over the document database.
///
/// Collections are implicit: a collection exists while it holds at least one
/// document. Scans return documents ordered by ascending id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_collections(&self) -> Result<Vec<String>, ServiceError>;
    /// Load up to `max` documents of `collection`.
    async fn scan(&self, collection: &str, max: usize) -> Result<Vec<Document>, ServiceError>;
    async fn count(&self, collection: &str) -> Result<u64, ServiceError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, ServiceError>;
    /// Write `fields` under `id` and return the stored document.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        mode: WriteMode,
    ) -> Result<Document, ServiceError>;
    /// Delete a document; deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), ServiceError>;
}

/// Apply a write to an optional stored field map.
pub(crate) fn apply_write(
    existing: Option<&mut Map<String, Value>>,
    mut fields: Map<String, Value>,
    mode: WriteMode,
) -> Option<Map<String, Value>> {
    fields.remove("id");
    match (existing, mode) {
        (Some(current), WriteMode::Merge) => {
            models::document::merge_json(current, fields);
            None
        }
        (Some(current), WriteMode::Replace) => {
            *current = fields;
            None
        }
        (None, _) => Some(fields),
    }
}
