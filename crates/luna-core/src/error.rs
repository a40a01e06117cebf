use thiserror::Error;

use crate::services::llm::LlmError;
use crate::vector_store::RecordId;

/// Custom error types for the Luna core
#[derive(Error, Debug)]
pub enum LunaError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Batch insert stopped at index {failed_index} after {} inserts: {source}", .inserted.len())]
    BatchInsert {
        inserted: Vec<RecordId>,
        failed_index: usize,
        #[source]
        source: Box<LunaError>,
    },

    #[error("Model error: {0}")]
    Model(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl LunaError {
    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an embedding collaborator error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Check if this error is retryable.
    ///
    /// Only collaborator failures qualify; configuration and dimension
    /// errors are programmer errors and will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            LunaError::Embedding { .. } => true,
            LunaError::Model(err) => err.is_retryable(),
            LunaError::Io(_) => true,
            LunaError::BatchInsert { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            LunaError::InvalidConfiguration { .. } => "config",
            LunaError::DimensionMismatch { .. } => "dimension",
            LunaError::Embedding { .. } => "embedding",
            LunaError::BatchInsert { .. } => "batch_insert",
            LunaError::Model(_) => "model",
            LunaError::Io(_) => "io",
            LunaError::TomlDe(_) | LunaError::TomlSer(_) => "toml",
            LunaError::Unknown { .. } => "unknown",
        }
    }
}

impl From<anyhow::Error> for LunaError {
    fn from(err: anyhow::Error) -> Self {
        LunaError::Unknown {
            message: err.to_string(),
        }
    }
}

/// Result type alias for Luna
pub type Result<T> = std::result::Result<T, LunaError>;
