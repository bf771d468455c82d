use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use models::{CountResponse, DeleteResponse, Document, MutationResponse, Paginated};
use serde_json::Value;
use service::query::{ServiceFilter, ServiceListQuery};
use service::ResourceSpec;

use super::resource;
use crate::errors::JsonApiError;
use crate::state::ServerState;

const RESOURCE: ResourceSpec = ResourceSpec::SERVICES;

/// List services, filtered and paginated
#[utoipa::path(
    get,
    path = "/services",
    tag = "services",
    params(
        ("page" = Option<String>, Query, description = "1-based page, default 1"),
        ("limit" = Option<String>, Query, description = "Page size, default 20"),
        ("search" = Option<String>, Query, description = "Substring of id, tipo or servico"),
        ("categoria" = Option<String>, Query, description = "Exact categoria"),
        ("segmento" = Option<String>, Query, description = "Exact segmento"),
    ),
    responses(
        (status = 200, body = crate::openapi::PageDoc),
        (status = 500, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ServiceListQuery>,
) -> Result<Json<Paginated<Document>>, JsonApiError> {
    let filter = ServiceFilter::from_query(&q);
    resource::list_page(&state, &RESOURCE, &filter, q.page.as_deref(), q.limit.as_deref()).await
}

#[utoipa::path(get, path = "/services/count", tag = "services",
    responses((status = 200, body = crate::openapi::CountDoc)))]
pub async fn count(State(state): State<ServerState>) -> Result<Json<CountResponse>, JsonApiError> {
    resource::count(&state, &RESOURCE).await
}

#[utoipa::path(get, path = "/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, body = crate::openapi::DocumentDoc),
        (status = 404, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Document>, JsonApiError> {
    resource::get_one(&state, &RESOURCE, &id).await
}

/// Create or overwrite a service; the body must carry `id`
#[utoipa::path(post, path = "/services", tag = "services",
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

/// Deep-merge a partial body into a service
#[utoipa::path(put, path = "/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
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

#[utoipa::path(delete, path = "/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses((status = 200, body = crate::openapi::DeleteDoc))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, JsonApiError> {
    resource::delete(&state, &RESOURCE, &id).await
}
