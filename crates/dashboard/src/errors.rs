use thiserror::Error;

/// Fallback text when an error response carries no `error` field.
pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx answer; `message` is the server's `error` field.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    Url(String),
    /// Form input rejected before any request was sent.
    #[error("{0}")]
    Form(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
