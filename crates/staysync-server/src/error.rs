//! Server error types.

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use staysync_core::PropertyId;
use staysync_protocol::{ErrorCode, ErrorResponse};
use thiserror::Error;
use tracing::error;

use crate::repository::RepositoryError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The property does not exist.
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// No or unknown bearer token on a protected route.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller may not manage this property.
    #[error("Access denied. Owner or admin role required.")]
    Forbidden,

    /// Malformed path or query.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A store lookup failed.
    #[error("Repository error during {stage}: {source}")]
    Repository {
        stage: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error (bind, config file).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn repository(stage: &'static str, source: RepositoryError) -> Self {
        Self::Repository { stage, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PropertyNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Repository { .. } | Self::Config { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::PropertyNotFound(_) => ErrorCode::NotFound,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::Repository { .. } | Self::Config { .. } | Self::Io(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::PropertyNotFound(_) => "Property not found".to_string(),
            s if status.is_server_error() => {
                error!(error = %s, "Request failed");
                "Internal server error".to_string()
            }
            s => s.to_string(),
        };

        (
            status,
            Json(ErrorResponse::new(self.error_code(), message)),
        )
            .into_response()
    }
}
