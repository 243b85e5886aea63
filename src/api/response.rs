//! JSON error bodies shared by the handlers

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, error::JsonPayloadError};
use serde::{Deserialize, Serialize};

/// Body returned when a key resolves to nothing.
pub const NOT_FOUND_DETAIL: &str = "URL not found";

/// Body of every 5xx; internal causes stay in the logs.
pub const INTERNAL_ERROR_DETAIL: &str = "Failed to process the request.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn error_response(status: StatusCode, detail: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        detail: detail.into(),
    })
}

pub fn not_found() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, NOT_FOUND_DETAIL)
}

pub fn internal_error() -> HttpResponse {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_DETAIL)
}

pub fn unprocessable(detail: impl Into<String>) -> HttpResponse {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, detail)
}

/// Turn JSON extractor failures into `422 {"detail": ...}`.
pub fn json_error_handler(
    err: JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let detail = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "Request body too large".to_string()
        }
        other => format!("Invalid request body: {}", other),
    };
    actix_web::error::InternalError::from_response(err, unprocessable(detail)).into()
}
