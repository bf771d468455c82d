use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::ErrorBody;
use service::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Map a service failure onto a response. Validation and lookup errors
    /// keep their own message; anything else is logged and answered with the
    /// generic `failure` text.
    pub fn from_service(err: ServiceError, failure: impl Into<String>) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Model(e) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            other => {
                let failure = failure.into();
                error!(error = %other, %failure, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error("store unavailable: {0}")]
    Store(#[from] ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_hide_details_behind_failure_text() {
        let e = JsonApiError::from_service(ServiceError::store("disk on fire"), "Failed to get services");
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "Failed to get services");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let e = JsonApiError::from_service(ServiceError::Validation("Missing price data".into()), "x");
        assert_eq!((e.status, e.message.as_str()), (StatusCode::BAD_REQUEST, "Missing price data"));
        let e = JsonApiError::from_service(ServiceError::not_found("Service"), "x");
        assert_eq!((e.status, e.message.as_str()), (StatusCode::NOT_FOUND, "Service not found"));
    }
}
