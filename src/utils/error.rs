//! Error handling module
//!
//! Defines the error taxonomy shared by the client, parser and orchestrators

use std::time::Duration;
use thiserror::Error;

/// Maximum number of raw response characters kept in error messages
const RAW_SNIPPET_LEN: usize = 200;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration (credentials, endpoint, limits)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Upstream rejected the credentials
    #[error("Authentication failed ({status}): {message}")]
    Authentication {
        status: u16,
        message: String,
    },

    /// Upstream answered HTTP 429
    #[error("Rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimit {
        /// Wait suggested by the upstream `Retry-After` header
        retry_after: Option<Duration>,
    },

    /// Transport failure or non-2xx response
    #[error("API error{}: {message}", status_suffix(.status))]
    Api {
        status: Option<u16>,
        message: String,
        body: Option<String>,
    },

    /// No recoverable structure in the upstream response
    #[error("Invalid response: {message} (raw: {})", snippet(.raw))]
    InvalidResponse {
        message: String,
        raw: String,
    },

    /// Envelope parsed but the translation is missing or empty
    #[error("Empty translation in response (raw: {})", snippet(.raw))]
    EmptyTranslation {
        raw: String,
    },

    /// Envelope parsed but the summary is missing or empty
    #[error("Empty summary in response (raw: {})", snippet(.raw))]
    EmptySummary {
        raw: String,
    },

    /// Locale code not present in the locale table
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Request validation failed
    #[error("Request validation failed: {0}")]
    Validation(String),

    /// Input text exceeds the configured maximum length
    #[error("Text too long: {length} characters (maximum {max})")]
    TextTooLong {
        length: usize,
        max: usize,
    },

    /// Batch exceeds the configured maximum size
    #[error("Batch too large: {size} items (maximum {max})")]
    BatchTooLarge {
        size: usize,
        max: usize,
    },

    /// Batch response recovered a different number of items than requested
    #[error("Batch response item count mismatch: expected {expected}, got {actual}")]
    BatchMismatch {
        expected: usize,
        actual: usize,
    },
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(", retry after {}ms", wait.as_millis()),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

/// Truncate raw upstream output for display
pub(crate) fn snippet(raw: &str) -> String {
    if raw.chars().count() > RAW_SNIPPET_LEN {
        let head: String = raw.chars().take(RAW_SNIPPET_LEN).collect();
        format!("{}...", head)
    } else {
        raw.to_string()
    }
}

impl AppError {
    /// Get the upstream HTTP status code, when one is known
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::Authentication { status, .. } => Some(*status),
            AppError::RateLimit { .. } => Some(429),
            AppError::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration_error",
            AppError::Authentication { .. } => "authentication_error",
            AppError::RateLimit { .. } => "rate_limit_error",
            AppError::Api { .. } => "api_error",
            AppError::InvalidResponse { .. } => "invalid_response_error",
            AppError::EmptyTranslation { .. } => "empty_translation_error",
            AppError::EmptySummary { .. } => "empty_summary_error",
            AppError::UnsupportedLanguage(_) => "unsupported_language_error",
            AppError::Validation(_)
            | AppError::TextTooLong { .. }
            | AppError::BatchTooLarge { .. } => "invalid_request_error",
            AppError::BatchMismatch { .. } => "batch_mismatch_error",
        }
    }

    /// Whether the bounded exponential retry policy applies
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Api { .. }
                | AppError::InvalidResponse { .. }
                | AppError::EmptyTranslation { .. }
                | AppError::EmptySummary { .. }
        )
    }

    /// Whether this is an upstream rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AppError::RateLimit { .. })
    }

    /// Wait suggested by the upstream, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::RateLimit { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the error was raised before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::TextTooLong { .. }
                | AppError::BatchTooLarge { .. }
                | AppError::UnsupportedLanguage(_)
        )
    }

    /// Whether the failure invalidates every remaining item of a batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Authentication { .. } | AppError::Config(_))
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(self, AppError::Authentication { .. } | AppError::Config(_))
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> AppError {
        AppError::Validation(message.into())
    }

    /// Create invalid response error
    pub fn invalid_response(message: impl Into<String>, raw: &str) -> AppError {
        AppError::InvalidResponse {
            message: message.into(),
            raw: raw.to_string(),
        }
    }

    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> AppError {
        AppError::Config(anyhow::anyhow!(message.into()))
    }

    /// Create API error without a status (transport level)
    pub fn transport_error(message: impl Into<String>) -> AppError {
        AppError::Api {
            status: None,
            message: message.into(),
            body: None,
        }
    }
}
