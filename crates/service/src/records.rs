//! Record operations shared by every resource endpoint
//!
//! A `ResourceSpec` names a collection and the wording used in its messages;
//! `RecordService` runs list/count/get/create/update/delete against the
//! configured `DocumentStore`. Filtering and pagination happen in memory over
//! a capped full scan.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use configs::AppConfig;
use models::{Document, Paginated};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::errors::ServiceError;
use crate::metrics;
use crate::pagination::{paginate, PagePolicy, Pagination};
use crate::query::RecordFilter;
use crate::storage::{DocumentStore, WriteMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Count,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Count => "count",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// A collection exposed as a REST resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceSpec {
    pub collection: &'static str,
    /// Lowercase noun used in validation and failure messages.
    pub singular: &'static str,
    /// Capitalized noun used in not-found and delete messages.
    pub title: &'static str,
    /// What a failed listing says it could not get.
    pub list_label: &'static str,
}

impl ResourceSpec {
    pub const SERVICES: ResourceSpec =
        ResourceSpec { collection: "services", singular: "service", title: "Service", list_label: "services" };
    pub const PRICES: ResourceSpec =
        ResourceSpec { collection: "prices", singular: "price", title: "Price", list_label: "prices" };
    pub const JACTO_USERS: ResourceSpec = ResourceSpec {
        collection: "jactoUsers",
        singular: "user",
        title: "User",
        list_label: "jactoUsers collection",
    };

    /// Client-facing message for an unexpected failure of `op`.
    pub fn failure_message(&self, op: Operation) -> String {
        match op {
            Operation::List => format!("Failed to get {}", self.list_label),
            Operation::Count => format!("Failed to get {} count", self.collection),
            Operation::Get => format!("Failed to get {}", self.singular),
            Operation::Create => format!("Failed to create {}", self.singular),
            Operation::Update => format!("Failed to update {}", self.singular),
            Operation::Delete => format!("Failed to delete {}", self.singular),
        }
    }

    pub fn not_found(&self) -> ServiceError {
        ServiceError::not_found(self.title)
    }

    pub fn deleted_message(&self) -> String {
        format!("{} deleted successfully", self.title)
    }
}

/// Server-assigned write timestamp.
pub fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Business operations over the document store.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn DocumentStore>,
    policy: PagePolicy,
    max_scan: usize,
}

impl RecordService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: PagePolicy, max_scan: usize) -> Self {
        Self { store, policy, max_scan: max_scan.max(1) }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, cfg: &AppConfig) -> Self {
        Self::new(store, PagePolicy::from(&cfg.pagination), cfg.store.max_scan)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn policy(&self) -> PagePolicy {
        self.policy
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Document>, ServiceError> {
        let docs = self.store.scan(collection, self.max_scan).await?;
        metrics::DOCUMENTS_SCANNED.observe(docs.len() as f64);
        if docs.len() >= self.max_scan {
            warn!(collection, max_scan = self.max_scan, "scan cap reached, results may be truncated");
        }
        Ok(docs)
    }

    /// Filter a full scan and return the requested page.
    #[instrument(skip(self, filter), fields(collection = spec.collection))]
    pub async fn list_page(
        &self,
        spec: &ResourceSpec,
        filter: &dyn RecordFilter,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Paginated<Document>, ServiceError> {
        let req = Pagination::from_query(page, limit, &self.policy);
        let result = self.scan(spec.collection).await.map(|docs| {
            let matched: Vec<Document> = docs.into_iter().filter(|d| filter.matches(d)).collect();
            paginate(matched, req)
        });
        self.track(spec, Operation::List, &result);
        if let Ok(out) = &result {
            debug!(page = req.page, limit = req.limit, total = out.pagination.total, "listed page");
        }
        result
    }

    /// Every document of the collection, unfiltered and unpaginated.
    pub async fn list_all(&self, spec: &ResourceSpec) -> Result<Vec<Document>, ServiceError> {
        let result = self.scan(spec.collection).await;
        self.track(spec, Operation::List, &result);
        result
    }

    /// Documents of `spec` matching `filter`, unpaginated.
    pub async fn list_filtered(
        &self,
        spec: &ResourceSpec,
        filter: &dyn RecordFilter,
    ) -> Result<Vec<Document>, ServiceError> {
        let docs = self.list_all(spec).await?;
        Ok(docs.into_iter().filter(|d| filter.matches(d)).collect())
    }

    pub async fn count(&self, spec: &ResourceSpec) -> Result<u64, ServiceError> {
        let result = self.store.count(spec.collection).await;
        self.track(spec, Operation::Count, &result);
        result
    }

    #[instrument(skip(self), fields(collection = spec.collection))]
    pub async fn get(&self, spec: &ResourceSpec, id: &str) -> Result<Document, ServiceError> {
        let result = self.fetch(spec, id).await;
        self.track(spec, Operation::Get, &result);
        result
    }

    /// Create (or overwrite) the document named by the body's `id`.
    #[instrument(skip(self, body), fields(collection = spec.collection))]
    pub async fn create(&self, spec: &ResourceSpec, body: Option<Value>) -> Result<Document, ServiceError> {
        let result = self.write_new(spec, body).await;
        self.track(spec, Operation::Create, &result);
        result
    }

    /// Deep-merge a partial body into the document (upsert when absent).
    #[instrument(skip(self, body), fields(collection = spec.collection))]
    pub async fn update(
        &self,
        spec: &ResourceSpec,
        id: &str,
        body: Option<Value>,
    ) -> Result<Document, ServiceError> {
        let result = self.write_merge(spec, id, body).await;
        self.track(spec, Operation::Update, &result);
        result
    }

    /// Delete by id; deleting a missing document still succeeds.
    #[instrument(skip(self), fields(collection = spec.collection))]
    pub async fn delete(&self, spec: &ResourceSpec, id: &str) -> Result<(), ServiceError> {
        let result = self.remove(spec, id).await;
        self.track(spec, Operation::Delete, &result);
        result
    }

    async fn fetch(&self, spec: &ResourceSpec, id: &str) -> Result<Document, ServiceError> {
        require_id(spec, id)?;
        self.store.get(spec.collection, id).await?.ok_or_else(|| spec.not_found())
    }

    async fn write_new(&self, spec: &ResourceSpec, body: Option<Value>) -> Result<Document, ServiceError> {
        let missing = || ServiceError::Validation(format!("Missing {} data or id", spec.singular));
        let Some(Value::Object(mut fields)) = body else {
            return Err(missing());
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(missing()),
        };
        let ts = now_timestamp();
        fields.insert("createdAt".into(), ts.clone());
        fields.insert("updatedAt".into(), ts);
        let doc = self.store.set(spec.collection, &id, fields, WriteMode::Replace).await?;
        info!(id = %doc.id, "created record");
        Ok(doc)
    }

    async fn write_merge(
        &self,
        spec: &ResourceSpec,
        id: &str,
        body: Option<Value>,
    ) -> Result<Document, ServiceError> {
        require_id(spec, id)?;
        let mut fields: Map<String, Value> = match body {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(ServiceError::Validation(format!("Missing {} data", spec.singular))),
        };
        fields.remove("id");
        fields.insert("updatedAt".into(), now_timestamp());
        let doc = self.store.set(spec.collection, id, fields, WriteMode::Merge).await?;
        info!(id = %doc.id, "updated record");
        Ok(doc)
    }

    async fn remove(&self, spec: &ResourceSpec, id: &str) -> Result<(), ServiceError> {
        require_id(spec, id)?;
        self.store.delete(spec.collection, id).await?;
        info!(id, "deleted record");
        Ok(())
    }

    pub async fn collections(&self) -> Result<Vec<String>, ServiceError> {
        self.store.list_collections().await
    }

    pub async fn collection_documents(&self, name: &str) -> Result<Vec<Document>, ServiceError> {
        self.scan(name).await
    }

    fn track<T>(&self, spec: &ResourceSpec, op: Operation, result: &Result<T, ServiceError>) {
        metrics::record_operation(spec.collection, op.as_str());
        if result.is_err() {
            metrics::record_error(spec.collection, op.as_str());
        }
    }
}

fn require_id(spec: &ResourceSpec, id: &str) -> Result<(), ServiceError> {
    if id.is_empty() {
        return Err(ServiceError::Validation(format!("Missing {} id", spec.singular)));
    }
    Ok(())
}
