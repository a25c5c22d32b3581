use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::pipeline::EventRejection;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid shared secret")]
    Unauthenticated,
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("missing required field: slug")]
    MissingSlug,
    #[error("missing required fields: entityId and spaceId")]
    MissingIdentifiers,
    #[error("no document found for slug '{0}'")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MissingSlug => StatusCode::BAD_REQUEST,
            ApiError::MissingIdentifiers => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::InvalidPayload(_) => "INVALID_JSON",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::MissingSlug => "MISSING_SLUG",
            ApiError::MissingIdentifiers => "MISSING_IDENTIFIERS",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(json!(body))).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<EventRejection> for ApiError {
    fn from(value: EventRejection) -> Self {
        match value {
            EventRejection::MissingSlug => ApiError::MissingSlug,
            EventRejection::MissingIdentifiers => ApiError::MissingIdentifiers,
        }
    }
}
