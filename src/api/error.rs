//! HTTP mapping for [`RapportError`]

use crate::error::RapportError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

impl RapportError {
    /// Status code returned to API clients
    pub fn status_code(&self) -> StatusCode {
        match self {
            RapportError::FriendNotFound(_) | RapportError::InteractionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RapportError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RapportError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
