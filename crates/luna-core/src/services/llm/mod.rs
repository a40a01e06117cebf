//! Chat model abstraction
//!
//! The conversation agent depends on the [`ChatModel`] trait only. The
//! Groq client is the hosted implementation; tests substitute fakes.

pub mod errors;
#[cfg(feature = "reqwest")]
pub mod groq;
pub mod retry;
pub mod traits;
pub mod types;

pub use errors::LlmError;
#[cfg(feature = "reqwest")]
pub use groq::{GroqClient, GroqConfig, GROQ_BASE_URL};
pub use retry::{with_retry, RetryConfig};
pub use traits::ChatModel;
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, GenerationSettings, GroqModel, TokenUsage,
};
