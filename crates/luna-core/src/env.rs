//! Environment variable constants used throughout the application
//!
//! All variable names live here so the CLI and the core agree on them.

/// Logging configuration
pub mod logging {
    /// Log level configuration (e.g., "debug", "info", "warn", "error")
    pub const LOG_LEVEL: &str = "LUNA_LOG_LEVEL";

    /// Log file path for file-based logging
    pub const LOG_FILE: &str = "LUNA_LOG_FILE";

    /// Disable colored output (follows the NO_COLOR standard)
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// External API configuration
pub mod apis {
    /// Groq API key for chat completions
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
}

/// Memory and retrieval overrides
pub mod memory {
    /// Conversational memory length in exchanges
    pub const MEMORY_LEN: &str = "LUNA_MEMORY_LEN";

    /// Number of documents retrieved per prompt
    pub const TOP_K: &str = "LUNA_TOP_K";
}
