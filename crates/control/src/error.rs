//! Request-level errors and their HTTP mapping.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("no value stored under `{0}`")]
    NotFound(String),

    #[error("store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("store failure: {0}")]
    Store(String),
}

impl ApiError {
    /// Stable machine-readable code carried in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Malformed(_) => "malformed_request",
            ApiError::MissingField(_) => "missing_field",
            ApiError::UnknownMethod(_) => "unknown_method",
            ApiError::NotFound(_) => "not_found",
            ApiError::Timeout(_) => "timeout",
            ApiError::Store(_) => "store_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Malformed(_) | ApiError::MissingField(_) | ApiError::UnknownMethod(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<corelib::Error> for ApiError {
    fn from(err: corelib::Error) -> Self {
        match err {
            corelib::Error::NotFound(key) => ApiError::NotFound(key),
            corelib::Error::Timeout(after) => ApiError::Timeout(after),
            other => ApiError::Store(other.to_string()),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
