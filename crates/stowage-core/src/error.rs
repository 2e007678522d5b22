//! Error types module
//!
//! All errors are unified under the `AppError` enum. External-store failures
//! are wrapped with the store and operation they occurred in before they
//! leave the crate that saw them; raw driver errors never cross a service
//! boundary.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like lookups of absent records
    Debug,
    /// Warning level - for recoverable or degraded outcomes
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// The HTTP layer lives outside this workspace; this trait lets errors
/// self-describe so that layer stays a thin mapping.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE_CODE")
    fn error_code(&self) -> &'static str;

    /// Whether the caller can reasonably retry the same request
    fn is_retryable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate code within entity: {code}")]
    DuplicateCode { code: String },

    #[error("Requested size {requested} bytes exceeds maximum of {max} bytes")]
    CapacityExceeded { requested: u64, max: u64 },

    #[error("Upload limit reached: entity {entity_id} already has {limit} files")]
    UploadLimitReached { entity_id: String, limit: u32 },

    #[error("{store} unavailable during {operation}: {message}")]
    UpstreamUnavailable {
        /// Which external store failed ("metadata store" or "object store").
        store: &'static str,
        /// The orchestrator step that was executing.
        operation: &'static str,
        message: String,
    },

    #[error("Thumbnail derivation failed: {0}")]
    ThumbnailFailed(String),

    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Code generation exhausted after {attempts} attempts")]
    CodeGenerationExhausted { attempts: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata per variant: (http_status, error_code, retryable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::DuplicateCode { .. } => (409, "DUPLICATE_CODE", true, LogLevel::Warn),
        AppError::CapacityExceeded { .. } => (413, "CAPACITY_EXCEEDED", false, LogLevel::Debug),
        AppError::UploadLimitReached { .. } => {
            (422, "UPLOAD_LIMIT_REACHED", false, LogLevel::Debug)
        }
        AppError::UpstreamUnavailable { .. } => {
            (503, "UPSTREAM_UNAVAILABLE", true, LogLevel::Error)
        }
        AppError::ThumbnailFailed(_) => (422, "THUMBNAIL_FAILED", false, LogLevel::Warn),
        AppError::EntropyUnavailable(_) => (500, "ENTROPY_UNAVAILABLE", true, LogLevel::Error),
        AppError::CodeGenerationExhausted { .. } => {
            (500, "CODE_GENERATION_EXHAUSTED", true, LogLevel::Error)
        }
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::Config(_) => (500, "CONFIG_ERROR", false, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl AppError {
    /// Wrap a metadata-store failure with the orchestrator step it happened in.
    pub fn metadata_store(operation: &'static str, message: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable {
            store: "metadata store",
            operation,
            message: message.into(),
        }
    }

    /// Wrap an object-store failure with the orchestrator step it happened in.
    pub fn object_store(operation: &'static str, message: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable {
            store: "object store",
            operation,
            message: message.into(),
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_retryable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}
