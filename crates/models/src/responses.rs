use serde::{Deserialize, Serialize};

/// `{success, data}` body returned by create and update endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> MutationResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, data } }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn ok(message: impl Into<String>) -> Self { Self { success: true, message: message.into() } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Body of every 4xx/5xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
