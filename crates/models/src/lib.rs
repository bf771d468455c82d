//! Wire and domain types shared by the HTTP server and the dashboard client.

pub mod errors;
pub mod lenient;
pub mod document;
pub mod service;
pub mod price;
pub mod pagination;
pub mod responses;

pub use document::Document;
pub use pagination::{Paginated, PaginationMeta};
pub use price::{Environment, Price, PriceTable, REGION_CODES};
pub use responses::{CountResponse, DeleteResponse, ErrorBody, MutationResponse};
pub use service::{Product, Service};
