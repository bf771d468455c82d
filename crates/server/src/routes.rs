pub mod collections;
pub mod jacto_users;
pub mod prices;
mod resource;
pub mod services;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health",
    responses((status = 200, body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Prometheus text exposition of the default registry.
pub async fn metrics() -> Response {
    match service::metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encode failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")).into_response()
        }
    }
}

/// Build the full application router: resource APIs, collection browser,
/// health/metrics, API docs and the static dashboard as fallback.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let index = state.static_dir.join("index.html");
    let static_files = ServeDir::new(&state.static_dir).fallback(ServeFile::new(index));

    let services = Router::new()
        .route("/services", get(services::list).post(services::create))
        .route("/services/count", get(services::count))
        .route(
            "/services/:id",
            get(services::get).put(services::update).delete(services::delete),
        );

    let prices = Router::new()
        .route("/prices", get(prices::list).post(prices::create))
        .route("/prices/count", get(prices::count))
        .route(
            "/prices/:id",
            get(prices::get).put(prices::update).delete(prices::delete),
        );

    let browser = Router::new()
        .route("/collections", get(collections::list))
        .route("/collections/:id", get(collections::documents))
        .route("/jacto-users", get(jacto_users::list))
        .route(
            "/jacto-users/:id",
            get(jacto_users::get).put(jacto_users::update).delete(jacto_users::delete),
        );

    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    Router::new()
        .merge(services)
        .merge(prices)
        .merge(browser)
        .merge(ops)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_files)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
