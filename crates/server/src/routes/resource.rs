//! Handler bodies shared by the services, prices and jacto-users endpoints.

use axum::{http::StatusCode, Json};
use models::{CountResponse, DeleteResponse, Document, MutationResponse, Paginated};
use serde_json::Value;
use service::query::RecordFilter;
use service::{Operation, ResourceSpec};

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub(crate) async fn list_page(
    state: &ServerState,
    spec: &ResourceSpec,
    filter: &dyn RecordFilter,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<Json<Paginated<Document>>, JsonApiError> {
    state
        .records
        .list_page(spec, filter, page, limit)
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::List)))
}

pub(crate) async fn list_all(state: &ServerState, spec: &ResourceSpec) -> Result<Json<Vec<Document>>, JsonApiError> {
    state
        .records
        .list_all(spec)
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::List)))
}

pub(crate) async fn count(state: &ServerState, spec: &ResourceSpec) -> Result<Json<CountResponse>, JsonApiError> {
    state
        .records
        .count(spec)
        .await
        .map(|count| Json(CountResponse { count }))
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::Count)))
}

pub(crate) async fn get_one(state: &ServerState, spec: &ResourceSpec, id: &str) -> Result<Json<Document>, JsonApiError> {
    state
        .records
        .get(spec, id)
        .await
        .map(Json)
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::Get)))
}

pub(crate) async fn create(
    state: &ServerState,
    spec: &ResourceSpec,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<MutationResponse<Document>>), JsonApiError> {
    state
        .records
        .create(spec, body.map(|Json(v)| v))
        .await
        .map(|doc| (StatusCode::CREATED, Json(MutationResponse::ok(doc))))
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::Create)))
}

pub(crate) async fn update(
    state: &ServerState,
    spec: &ResourceSpec,
    id: &str,
    body: Option<Json<Value>>,
) -> Result<Json<MutationResponse<Document>>, JsonApiError> {
    state
        .records
        .update(spec, id, body.map(|Json(v)| v))
        .await
        .map(|doc| Json(MutationResponse::ok(doc)))
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::Update)))
}

pub(crate) async fn delete(
    state: &ServerState,
    spec: &ResourceSpec,
    id: &str,
) -> Result<Json<DeleteResponse>, JsonApiError> {
    state
        .records
        .delete(spec, id)
        .await
        .map(|()| Json(DeleteResponse::ok(spec.deleted_message())))
        .map_err(|e| JsonApiError::from_service(e, spec.failure_message(Operation::Delete)))
}
