pub mod embedding;
pub mod memory;
pub mod services;
pub mod vector_store;

pub mod config;
pub mod env;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Config;
pub use error::{LunaError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use memory::{MemoryConfig, SessionMemoryManager, TrimPolicy, Turn};
pub use services::{AgentReply, ChatModel, ConversationAgent};
pub use vector_store::{SearchResult, VectorStore};

pub use embedding::{Embedder, HashingEmbedder};
#[cfg(feature = "semantic-search")]
pub use embedding::FastEmbedEmbedder;
