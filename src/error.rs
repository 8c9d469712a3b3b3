/// Unified error types for VidTube
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing fields, query parameters or identifiers
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or expired credential
    #[error("{0}")]
    Unauthorized(String),

    /// Refresh token failed signature/expiry checks or names an unknown user
    #[error("{0}")]
    InvalidToken(String),

    /// Refresh token is not the one currently stored for the user
    #[error("Refresh token is expired or used")]
    TokenReuse,

    /// Acting identity does not own the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Media store collaborator failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidToken(_) | ApiError::TokenReuse => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UploadFailed(_)
            | ApiError::Internal(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Io(_) | ApiError::Jwt(_) => {
                "Server error".to_string()
            }
            ApiError::UploadFailed(_) => "Failed to upload media please try again".to_string(),
            _ => self.to_string(),
        }
    }

    /// Wrap a persistence failure as an opaque `Internal` error.
    ///
    /// `map_err(ApiError::from_store("Failed to create comment"))`
    pub fn from_store(context: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
        move |e| ApiError::Internal(format!("{}: {}", context, e))
    }
}

/// Error envelope returned by every endpoint on failure
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            // The cause stays in the logs, the client gets an opaque message
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse {
            status_code: status.as_u16(),
            message: self.public_message(),
            success: false,
            errors: Vec::new(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::TokenReuse.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::UploadFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = ApiError::Internal("connection refused on 10.0.0.3".into());
        assert_eq!(err.public_message(), "Server error");

        let err = ApiError::InvalidInput("Title is required".into());
        assert_eq!(err.public_message(), "Title is required");
    }
}
