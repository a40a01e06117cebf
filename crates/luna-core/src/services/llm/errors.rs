//! Chat model error types.

use thiserror::Error;

/// Provider-agnostic chat model errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { message: String },

    #[error("Request timeout after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

impl LlmError {
    /// Check if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimit { .. } | LlmError::Timeout { .. } | LlmError::Network { .. } => {
                true
            }
            LlmError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get suggested retry delay in seconds
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            LlmError::RateLimit { .. } => Some(10),
            LlmError::Timeout { .. } => Some(5),
            _ => None,
        }
    }

    /// Map an HTTP error status and body to an error
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = body.chars().take(500).collect::<String>();
        match status {
            401 | 403 => LlmError::Authentication { message },
            429 => LlmError::RateLimit { message },
            400..=499 => LlmError::InvalidRequest { message },
            _ => LlmError::Server { status, message },
        }
    }

    /// Convert to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            LlmError::Configuration { message } => format!("Configuration error: {message}"),
            LlmError::Authentication { .. } => {
                "Authentication failed. Please check your API key.".to_string()
            }
            LlmError::RateLimit { .. } => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            LlmError::Timeout { timeout_secs } => {
                format!("Request timed out after {timeout_secs} seconds.")
            }
            LlmError::Network { .. } => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            LlmError::Server { .. } => {
                "The model provider is having issues. Please try again later.".to_string()
            }
            LlmError::InvalidRequest { message } => format!("Invalid request: {message}"),
            LlmError::Parse { .. } | LlmError::InvalidResponse { .. } => {
                "Received an unreadable response. Please try again.".to_string()
            }
        }
    }
}
