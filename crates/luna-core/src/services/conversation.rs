//! Conversation orchestration: memory + retrieval + chat model.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use super::llm::{ChatMessage, ChatModel, ChatRequest, GenerationSettings};
use crate::error::{LunaError, Result};
use crate::memory::{Message, SessionMemoryManager, Turn};
use crate::vector_store::{SearchResult, VectorStore, TOP_K_DEFAULT};

pub const SYSTEM_PROMPT_DEFAULT: &str = "You are LUNA, a friendly and curious assistant. \
Answer concisely by default and in depth when the user asks for details.";

/// Result of one agent turn.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The exchange as it was appended to memory.
    pub turn: Turn,
    /// Documents that were placed in the prompt, nearest first.
    pub context: Vec<SearchResult>,
    /// Model that produced the reply.
    pub model: String,
    /// Wall time spent retrieving and generating.
    pub elapsed: Duration,
}

/// Drives one assistant: reads session history, pulls supporting documents,
/// asks the chat model and records the exchange.
pub struct ConversationAgent {
    memory: Arc<SessionMemoryManager>,
    model: Arc<dyn ChatModel>,
    retriever: Option<Arc<VectorStore>>,
    top_k: usize,
    system_prompt: String,
    settings: GenerationSettings,
}

impl ConversationAgent {
    pub fn new(memory: Arc<SessionMemoryManager>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            memory,
            model,
            retriever: None,
            top_k: TOP_K_DEFAULT,
            system_prompt: SYSTEM_PROMPT_DEFAULT.to_string(),
            settings: GenerationSettings::default(),
        }
    }

    /// Attach a document store consulted before every reply.
    pub fn with_retriever(mut self, store: Arc<VectorStore>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(LunaError::invalid_config("top_k must be at least 1"));
        }
        self.retriever = Some(store);
        self.top_k = top_k;
        Ok(self)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn memory(&self) -> &Arc<SessionMemoryManager> {
        &self.memory
    }

    pub fn retriever(&self) -> Option<&Arc<VectorStore>> {
        self.retriever.as_ref()
    }

    /// Answer `input` within `session_key`'s conversation.
    ///
    /// History is only extended when the model call succeeds.
    pub async fn respond(&self, session_key: &str, input: &str) -> Result<AgentReply> {
        let started = Instant::now();
        let history = self.memory.messages_view(session_key);

        let context = match &self.retriever {
            Some(store) if !store.is_empty() => store.search(input, self.top_k).await?,
            _ => Vec::new(),
        };

        let messages = self.build_messages(&history, &context, input);
        let request = ChatRequest::new(messages).with_settings(self.settings);

        let response = match self.model.generate(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    session = session_key,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Chat model failed"
                );
                return Err(err.into());
            }
        };

        let timestamp = Utc::now();
        self.memory
            .append_turn(session_key, input, response.text.as_str(), timestamp);
        let elapsed = started.elapsed();

        tracing::info!(
            session = session_key,
            model = %response.model,
            history_messages = history.len(),
            context_documents = context.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Generated reply"
        );

        Ok(AgentReply {
            turn: Turn::new(input, response.text, timestamp),
            context,
            model: response.model,
            elapsed,
        })
    }

    /// Prompt layout: system prompt, retrieved context, history, new input.
    pub fn build_messages(
        &self,
        history: &[Message],
        context: &[SearchResult],
        input: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ChatMessage::system(self.system_prompt.clone()));

        if !context.is_empty() {
            let documents = context
                .iter()
                .map(|result| format!("- {}", result.text))
                .collect::<Vec<_>>()
                .join("\n");
            messages.push(ChatMessage::system(format!(
                "Relevant documents:\n{documents}"
            )));
        }

        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(input));
        messages
    }

    /// Forget every session's history.
    pub fn clear_history(&self) {
        self.memory.clear_all();
    }
}
