pub mod conversation;
pub mod llm;

pub use conversation::{AgentReply, ConversationAgent, SYSTEM_PROMPT_DEFAULT};
pub use llm::{ChatMessage, ChatModel, ChatRequest, ChatResponse, GroqModel, LlmError};

#[cfg(feature = "reqwest")]
pub use llm::{GroqClient, GroqConfig};
