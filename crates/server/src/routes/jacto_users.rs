//! `jactoUsers` collection: list, read, merge-update and delete. No create.

use axum::{
    extract::{Path, State},
    Json,
};
use models::{DeleteResponse, Document, MutationResponse};
use serde_json::Value;
use service::ResourceSpec;

use super::resource;
use crate::errors::JsonApiError;
use crate::state::ServerState;

const RESOURCE: ResourceSpec = ResourceSpec::JACTO_USERS;

#[utoipa::path(get, path = "/jacto-users", tag = "users",
    responses((status = 200, body = [crate::openapi::DocumentDoc])))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Document>>, JsonApiError> {
    resource::list_all(&state, &RESOURCE).await
}

#[utoipa::path(get, path = "/jacto-users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, body = crate::openapi::DocumentDoc),
        (status = 404, body = crate::openapi::ErrorDoc),
    )
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Document>, JsonApiError> {
    resource::get_one(&state, &RESOURCE, &id).await
}

#[utoipa::path(put, path = "/jacto-users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
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

#[utoipa::path(delete, path = "/jacto-users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, body = crate::openapi::DeleteDoc))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, JsonApiError> {
    resource::delete(&state, &RESOURCE, &id).await
}
