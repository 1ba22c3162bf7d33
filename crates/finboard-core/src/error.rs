//! Error types for finboard-core
//!
//! Every failure in the core falls into one of three buckets that the HTTP
//! layer maps to status codes: caller mistakes (validation, auth), an
//! unreachable store, and everything unexpected.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidColumns,
    UserExists,
    InvalidCredentials,
    StoreUnavailable,
    DatabaseError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InvalidColumns => write!(f, "INVALID_COLUMNS"),
            ErrorCode::UserExists => write!(f, "USER_EXISTS"),
            ErrorCode::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            ErrorCode::StoreUnavailable => write!(f, "STORE_UNAVAILABLE"),
            ErrorCode::DatabaseError => write!(f, "DATABASE_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Broad failure category, used for status-code mapping at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request itself is wrong
    Validation,
    /// Credentials missing or wrong
    Unauthenticated,
    /// The backing store cannot be reached
    Unavailable,
    /// Anything else
    Unexpected,
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Detailed error information for logs and API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Main error type for finboard-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid columns: {}", columns.join(", "))]
    InvalidColumns { columns: Vec<String> },

    #[error("User with this email already exists")]
    UserExists { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::InvalidColumns { .. } => ErrorCode::InvalidColumns,
            CoreError::UserExists { .. } => ErrorCode::UserExists,
            CoreError::InvalidCredentials => ErrorCode::InvalidCredentials,
            CoreError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            CoreError::Database { .. } => ErrorCode::DatabaseError,
            CoreError::Io { .. } => ErrorCode::IoError,
            CoreError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation { .. }
            | CoreError::InvalidColumns { .. }
            | CoreError::UserExists { .. } => ErrorKind::Validation,
            CoreError::InvalidCredentials => ErrorKind::Unauthenticated,
            CoreError::StoreUnavailable { .. } => ErrorKind::Unavailable,
            CoreError::Database { .. } | CoreError::Io { .. } | CoreError::Internal { .. } => {
                ErrorKind::Unexpected
            }
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::InvalidColumns { .. } => ErrorSeverity::Info,
            CoreError::UserExists { .. } => ErrorSeverity::Info,
            CoreError::InvalidCredentials => ErrorSeverity::Warning,
            CoreError::StoreUnavailable { .. } => ErrorSeverity::Critical,
            CoreError::Database { .. } => ErrorSeverity::Error,
            CoreError::Io { .. } => ErrorSeverity::Error,
            CoreError::Internal { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidColumns { columns } => {
                details = details.with_detail(serde_json::json!({ "columns": columns }));
                details = details.with_suggestion(
                    "Use the /api/export/columns endpoint to list valid column keys.".to_string(),
                );
            }
            CoreError::StoreUnavailable { .. } => {
                details = details.with_suggestion(
                    "Check that the database URL in the config file is reachable.".to_string(),
                );
            }
            CoreError::Database { message } => {
                details = details.with_detail(serde_json::json!({ "database_message": message }));
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::Io {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Internal {
            message: format!("JSON error: {}", error),
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                CoreError::StoreUnavailable {
                    message: error.to_string(),
                }
            }
            sqlx::Error::Database(ref db) if db.is_unique_violation() => CoreError::Database {
                message: format!("unique constraint violated: {}", db.message()),
            },
            other => CoreError::Database {
                message: other.to_string(),
            },
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Authenticated user (if any)
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info => log::debug!(
                target: "finboard::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "finboard::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "finboard::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "finboard::error",
            "{} - Operation: {} - User: {:?}",
            message,
            context.operation,
            context.user_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::StoreUnavailable.to_string(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_invalid_columns_message() {
        let error = CoreError::InvalidColumns {
            columns: vec!["ssn".to_string(), "salary".to_string()],
        };
        assert_eq!(error.to_string(), "Invalid columns: ssn, salary");
        assert_eq!(error.kind(), ErrorKind::Validation);
        let details = error.to_details();
        assert!(details.details.is_some());
        assert!(!details.suggestions.is_empty());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(CoreError::InvalidCredentials.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            CoreError::StoreUnavailable { message: "down".to_string() }.kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            CoreError::Internal { message: "boom".to_string() }.kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let error = CoreError::validation("At least one column must be selected");
        assert_eq!(error.to_string(), "At least one column must be selected");
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let error: CoreError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(error.code(), ErrorCode::StoreUnavailable);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_row_not_found_is_unexpected() {
        let error: CoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(error.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("list_transactions").with_user_id("user-1");
        assert_eq!(context.operation, "list_transactions");
        assert_eq!(context.user_id.as_deref(), Some("user-1"));
    }
}
