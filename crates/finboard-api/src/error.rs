//! Error types for finboard-api

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use finboard_core::{CoreError, DefaultErrorLogger, ErrorContext, ErrorKind, ErrorLogger};
use thiserror::Error;

pub const DATABASE_UNAVAILABLE: &str =
    "Database not available. Please contact administrator to set up the database connection.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Database not available. Please contact administrator to set up the database connection.")]
    ServiceUnavailable,

    #[error("Internal server error")]
    InternalError,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a core error to its HTTP form, logging it with the request context.
    /// Unexpected errors keep their detail in the log only.
    pub fn from_core(error: CoreError, context: &ErrorContext) -> Self {
        DefaultErrorLogger.log_error(&error, context);
        match error.kind() {
            ErrorKind::Validation => ApiError::BadRequest {
                message: error.to_string(),
            },
            ErrorKind::Unauthenticated => ApiError::Unauthorized {
                message: error.to_string(),
            },
            ErrorKind::Unavailable => ApiError::ServiceUnavailable,
            ErrorKind::Unexpected => ApiError::InternalError,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::from_core(error, &ErrorContext::new("request"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
