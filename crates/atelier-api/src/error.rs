//! HTTP error mapping.
//!
//! Core errors become JSON bodies of the form `{"error": "..."}` with a
//! status chosen by [`ApiError::status`].

use atelier_core::Error;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure reported by the core.
    #[error(transparent)]
    Core(#[from] Error),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Request refused by an extractor, with the status it chose.
    #[error("{message}")]
    Rejected {
        /// Status reported by the extractor.
        status: StatusCode,
        /// Extractor message.
        message: String,
    },
}

impl ApiError {
    /// Create a bad request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Core(err) => match err {
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Conflict(_) => StatusCode::CONFLICT,
                Error::InvalidInput(_) | Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Rejected {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::not_found("p"), StatusCode::NOT_FOUND),
            (Error::conflict("p"), StatusCode::CONFLICT),
            (Error::invalid_input("p"), StatusCode::BAD_REQUEST),
            (Error::invalid_path("p"), StatusCode::BAD_REQUEST),
            (Error::corrupt("p"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                Error::io(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::io_at(
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                    "/srv/projects/p1",
                ),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(
            ApiError::bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_message_is_core_display() {
        let err = ApiError::from(Error::not_found("project 42"));
        assert_eq!(err.to_string(), "Not found: project 42");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::from(Error::conflict("x")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
