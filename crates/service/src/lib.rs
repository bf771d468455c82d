//! Service layer providing record operations on top of the document store.
//! - Separates business rules (validation, timestamps, merge) from storage.
//! - Reuses the wire types from the `models` crate.
//! - Filtering and pagination run in memory over a capped collection scan.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod pagination;
pub mod query;
pub mod records;
pub mod metrics;

pub use errors::ServiceError;
pub use records::{Operation, RecordService, ResourceSpec};
