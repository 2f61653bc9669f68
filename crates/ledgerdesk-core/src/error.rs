//! Error types for ledgerdesk-core
//!
//! Every failure a table can report is a `CoreError`. The three kinds the
//! controller cares about are transport failures (transient, the caller may
//! try again), backend rejections (surfaced as-is) and validation failures
//! (raised before anything reaches the data source).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Connectivity or timeout
    TransportError,
    /// Query or mutation rejected by the backend
    BackendError,
    /// Caller input rejected before any fetch
    ValidationError,
    /// Record not found
    NotFound,
    /// Duplicate entry
    DuplicateEntry,
    /// Operation not supported for this record type
    NotSupported,
    /// Configuration error
    ConfigError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::TransportError => write!(f, "TRANSPORT_ERROR"),
            ErrorCode::BackendError => write!(f, "BACKEND_ERROR"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::NotFound => write!(f, "NOT_FOUND"),
            ErrorCode::DuplicateEntry => write!(f, "DUPLICATE_ENTRY"),
            ErrorCode::NotSupported => write!(f, "NOT_SUPPORTED"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
        }
    }
}

/// Detailed error information for the view layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Whether repeating the same operation may succeed
    pub retryable: bool,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
            retryable: false,
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
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

/// Main error type for ledgerdesk-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Record not found: {id}")]
    NotFound { id: i64 },

    #[error("Duplicate entry: {entry}")]
    DuplicateEntry { entry: String },

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn transport(message: impl Into<String>) -> Self {
        CoreError::Transport {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        CoreError::Backend {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Transport { .. } => ErrorCode::TransportError,
            CoreError::Backend { .. } => ErrorCode::BackendError,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::DuplicateEntry { .. } => ErrorCode::DuplicateEntry,
            CoreError::NotSupported { .. } => ErrorCode::NotSupported,
            CoreError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Transport { .. } => ErrorSeverity::Warning,
            CoreError::Backend { .. } => ErrorSeverity::Error,
            CoreError::Validation { .. } => ErrorSeverity::Info,
            CoreError::NotFound { .. } => ErrorSeverity::Info,
            CoreError::DuplicateEntry { .. } => ErrorSeverity::Warning,
            CoreError::NotSupported { .. } => ErrorSeverity::Warning,
            CoreError::Config { .. } => ErrorSeverity::Critical,
        }
    }

    /// Transient failures may succeed when repeated; nothing else will
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Transport { .. })
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let details = ErrorDetails::new(self.code(), self.to_string()).retryable(self.is_transient());

        match self {
            CoreError::Transport { .. } => details
                .with_suggestion("Check the connection to the backend and try again.".to_string()),
            CoreError::Backend { message } => details
                .with_detail(serde_json::json!({ "backend_message": message }))
                .with_suggestion("The backend rejected the request; it will not be retried.".to_string()),
            CoreError::Validation { message } => details
                .with_detail(serde_json::json!({ "validation_message": message })),
            CoreError::NotFound { id } => details
                .with_suggestion(format!("Record {} may have been deleted; refresh the list.", id)),
            CoreError::DuplicateEntry { entry } => details
                .with_suggestion(format!("'{}' already exists; pick a different name.", entry)),
            CoreError::NotSupported { operation } => details
                .with_suggestion(format!("'{}' is not available for this record type.", operation)),
            CoreError::Config { .. } => details,
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<ledgerdesk_config::ConfigError> for CoreError {
    fn from(error: ledgerdesk_config::ConfigError) -> Self {
        CoreError::Config {
            message: error.to_string(),
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Table the operation ran against
    pub table: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            table: None,
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data[key] = value.into();
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let table = context.table.as_deref().unwrap_or("-");
        match error.severity() {
            ErrorSeverity::Info => log::info!(
                target: "ledgerdesk::error",
                "{} - Table: {} - Operation: {} - Data: {}",
                error.to_details(), table, context.operation, context.data
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "ledgerdesk::error",
                "{} - Table: {} - Operation: {} - Data: {}",
                error.to_details(), table, context.operation, context.data
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "ledgerdesk::error",
                "{} - Table: {} - Operation: {} - Data: {}",
                error.to_details(), table, context.operation, context.data
            ),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "ledgerdesk::error",
            "WARNING: {} - Table: {} - Operation: {}",
            message,
            context.table.as_deref().unwrap_or("-"),
            context.operation
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::TransportError.to_string(), "TRANSPORT_ERROR");
        assert_eq!(ErrorCode::BackendError.to_string(), "BACKEND_ERROR");
        assert_eq!(ErrorCode::ValidationError.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_only_transport_is_transient() {
        assert!(CoreError::transport("timeout").is_transient());
        assert!(!CoreError::backend("bad sort field").is_transient());
        assert!(!CoreError::validation("page 0").is_transient());
        assert!(!CoreError::NotFound { id: 4 }.is_transient());
    }

    #[test]
    fn test_core_error_severity() {
        assert_eq!(CoreError::transport("x").severity(), ErrorSeverity::Warning);
        assert_eq!(CoreError::backend("x").severity(), ErrorSeverity::Error);
        assert_eq!(CoreError::validation("x").severity(), ErrorSeverity::Info);
        assert_eq!(
            CoreError::Config { message: "x".to_string() }.severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_transport_details_are_retryable() {
        let details = CoreError::transport("connection reset").to_details();
        assert_eq!(details.code, ErrorCode::TransportError);
        assert!(details.retryable);
        assert!(!details.suggestions.is_empty());
    }

    #[test]
    fn test_backend_details_carry_message() {
        let details = CoreError::backend("unsupported sort field: colour").to_details();
        assert!(!details.retryable);
        assert_eq!(
            details.details,
            Some(serde_json::json!({ "backend_message": "unsupported sort field: colour" }))
        );
        assert!(details.to_string().starts_with("[BACKEND_ERROR]"));
    }

    #[test]
    fn test_config_error_conversion() {
        let error: CoreError = ledgerdesk_config::ConfigError::MissingField {
            field: "tables.categories.searchable_fields".to_string(),
        }
        .into();
        assert_eq!(error.code(), ErrorCode::ConfigError);
        assert!(error.to_string().contains("searchable_fields"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("go_to_page")
            .with_table("transactions")
            .with_data("page", 4)
            .with_data("field", "amount");

        assert_eq!(context.operation, "go_to_page");
        assert_eq!(context.table.as_deref(), Some("transactions"));
        assert_eq!(context.data["page"], 4);
        assert_eq!(context.data["field"], "amount");
    }
}
