use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use hrms_infra::AccessError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Access(err) => access_error_to_response(err),
        }
    }
}

pub fn access_error_to_response(err: AccessError) -> Response {
    match err {
        AccessError::Denied(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        AccessError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        AccessError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AccessError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        AccessError::Backend(msg) => {
            error!(error = %msg, "store backend failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
