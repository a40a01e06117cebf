//! Chat model request and response types.

use serde::{Deserialize, Serialize};

use crate::memory::{Message, Role};

/// Hosted models offered for chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroqModel {
    #[serde(rename = "llama3-70b-8192")]
    Llama3_70b8192,
    #[default]
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33_70bVersatile,
    #[serde(rename = "deepseek-r1-distill-llama-70b")]
    DeepseekR1DistillLlama70b,
}

impl GroqModel {
    pub const ALL: [GroqModel; 3] = [
        GroqModel::Llama3_70b8192,
        GroqModel::Llama33_70bVersatile,
        GroqModel::DeepseekR1DistillLlama70b,
    ];

    /// Model identifier sent to the API.
    pub fn id(&self) -> &'static str {
        match self {
            GroqModel::Llama3_70b8192 => "llama3-70b-8192",
            GroqModel::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            GroqModel::DeepseekR1DistillLlama70b => "deepseek-r1-distill-llama-70b",
        }
    }
}

impl std::fmt::Display for GroqModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for GroqModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroqModel::ALL
            .into_iter()
            .find(|model| model.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let valid: Vec<&str> = GroqModel::ALL.iter().map(GroqModel::id).collect();
                format!("Unknown model: {s}. Valid options: {}", valid.join(", "))
            })
    }
}

/// Speaker of a chat message, in the OpenAI wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        match message.role {
            Role::Human => ChatMessage::user(message.content.clone()),
            Role::Agent => ChatMessage::assistant(message.content.clone()),
        }
    }
}

/// Sampling settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

/// Request for a chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.temperature = Some(settings.temperature);
        self.max_tokens = Some(settings.max_tokens);
        self.top_p = Some(settings.top_p);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Response from a chat completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl ChatResponse {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            finish_reason: None,
            usage: None,
        }
    }
}
