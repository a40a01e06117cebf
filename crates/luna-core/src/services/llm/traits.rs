//! Chat model trait definition

use async_trait::async_trait;

use super::errors::LlmError;
use super::types::{ChatRequest, ChatResponse};

/// Provider-agnostic trait for chat completion
///
/// The conversation agent only talks to this trait, so the hosted provider
/// can be swapped for a fake in tests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the next assistant message for a conversation
    ///
    /// # Arguments
    /// * `request` - Messages in prompt order plus sampling settings
    ///
    /// # Returns
    /// * `Ok(ChatResponse)` - The generated reply with metadata
    /// * `Err(LlmError)` - Provider-specific or transport errors
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Get the model identifier being used
    fn model_name(&self) -> &str;
}
