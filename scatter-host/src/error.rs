//! Error types for the host

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Stream not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HostError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            HostError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            HostError::Serialization(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, HostError>;
