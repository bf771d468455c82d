use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::Document;

use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Names of every non-empty collection
#[utoipa::path(get, path = "/collections", tag = "collections",
    responses((status = 200, body = [String])))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<String>>, JsonApiError> {
    state
        .records
        .collections()
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service(e, "Failed to get collections"))
}

/// Every document of one collection as `{id, ...fields}`
#[utoipa::path(get, path = "/collections/{id}", tag = "collections",
    params(("id" = String, Path, description = "Collection name")),
    responses((status = 200, body = [crate::openapi::DocumentDoc]))
)]
pub async fn documents(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Document>>, JsonApiError> {
    if id.is_empty() {
        return Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Missing collection id"));
    }
    state
        .records
        .collection_documents(&id)
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service(e, "Failed to get collection documents"))
}
