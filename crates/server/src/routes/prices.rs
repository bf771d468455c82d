use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{CountResponse, DeleteResponse, Document, MutationResponse, Paginated};
use serde_json::Value;
use service::query::{PriceFilter, PriceListQuery};
use service::ResourceSpec;

use super::resource;
use crate::errors::JsonApiError;
use crate::state::ServerState;

const RESOURCE: ResourceSpec = ResourceSpec::PRICES;

/// List prices, filtered and paginated
#[utoipa::path(
    get,
    path = "/prices",
    tag = "prices",
    params(
        ("page" = Option<String>, Query, description = "1-based page, default 1"),
        ("limit" = Option<String>, Query, description = "Page size, default 20"),
        ("search" = Option<String>, Query, description = "Substring of id or code"),
        ("env" = Option<String>, Query, description = "Only prices with a table for HML or PRD"),
    ),
    responses(
        (status = 200, body = crate::openapi::PageDoc),
        (status = 500, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<PriceListQuery>,
) -> Result<Json<Paginated<Document>>, JsonApiError> {
    let filter = PriceFilter::from_query(&q);
    resource::list_page(&state, &RESOURCE, &filter, q.page.as_deref(), q.limit.as_deref()).await
}

#[utoipa::path(get, path = "/prices/count", tag = "prices",
    responses((status = 200, body = crate::openapi::CountDoc)))]
pub async fn count(State(state): State<ServerState>) -> Result<Json<CountResponse>, JsonApiError> {
    resource::count(&state, &RESOURCE).await
}

#[utoipa::path(get, path = "/prices/{id}", tag = "prices",
    params(("id" = String, Path, description = "Price id")),
    responses(
        (status = 200, body = crate::openapi::DocumentDoc),
        (status = 404, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Document>, JsonApiError> {
    resource::get_one(&state, &RESOURCE, &id).await
}

#[utoipa::path(post, path = "/prices", tag = "prices",
    request_body = crate::openapi::DocumentDoc,
    responses(
        (status = 201, body = crate::openapi::MutationDoc),
        (status = 400, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<MutationResponse<Document>>), JsonApiError> {
    resource::create(&state, &RESOURCE, body).await
}

#[utoipa::path(put, path = "/prices/{id}", tag = "prices",
    params(("id" = String, Path, description = "Price id")),
    request_body = crate::openapi::DocumentDoc,
    responses(
        (status = 200, body = crate::openapi::MutationDoc),
        (status = 400, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<MutationResponse<Document>>, JsonApiError> {
    resource::update(&state, &RESOURCE, &id, body).await
}

#[utoipa::path(delete, path = "/prices/{id}", tag = "prices",
    params(("id" = String, Path, description = "Price id")),
    responses((status = 200, body = crate::openapi::DeleteDoc))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, JsonApiError> {
    resource::delete(&state, &RESOURCE, &id).await
}
