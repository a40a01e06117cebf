//! Groq chat completions client (OpenAI-compatible API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::errors::LlmError;
use super::retry::{with_retry, RetryConfig};
use super::traits::ChatModel;
use super::types::{ChatMessage, ChatRequest, ChatResponse, GroqModel, TokenUsage};
use crate::env::apis as env_vars;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: GroqModel,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(env_vars::GROQ_API_KEY).unwrap_or_default(),
            base_url: GROQ_BASE_URL.to_string(),
            model: GroqModel::default(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: GroqModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Configuration {
                message: format!("{} is not set", env_vars::GROQ_API_KEY),
            });
        }
        if self.base_url.is_empty() {
            return Err(LlmError::Configuration {
                message: "Base URL cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

#[derive(Clone)]
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { config, client })
    }

    /// Create a client from `GROQ_API_KEY`
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(GroqConfig::default())
    }

    pub fn config(&self) -> &GroqConfig {
        &self.config
    }

    async fn generate_once(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = CompletionRequest {
            model: self.config.model.id(),
            messages: &request.messages,
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            top_p: request.top_p,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.handle_response(response).await
    }

    fn map_transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else {
            LlmError::Network {
                message: error.to_string(),
            }
        }
    }

    async fn handle_response(&self, response: Response) -> Result<ChatResponse, LlmError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        parse_completion(&body, self.config.model.id())
    }
}

fn parse_completion(body: &str, requested_model: &str) -> Result<ChatResponse, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| LlmError::Parse {
        message: format!("Failed to parse response: {e}"),
    })?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            message: "Response contained no choices".to_string(),
        })?;

    let text = choice
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse {
            message: "Response choice had no content".to_string(),
        })?;

    Ok(ChatResponse {
        text,
        model: parsed
            .model
            .unwrap_or_else(|| requested_model.to_string()),
        finish_reason: choice.finish_reason,
        usage: parsed.usage.map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }),
    })
}

#[async_trait]
impl ChatModel for GroqClient {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let retry_config =
            RetryConfig::new(self.config.max_retries.max(1)).with_total_timeout(self.config.timeout);

        let response = with_retry(retry_config, || self.generate_once(&request)).await?;

        tracing::debug!(
            model = %response.model,
            finish_reason = ?response.finish_reason,
            total_tokens = ?response.usage.as_ref().and_then(|u| u.total_tokens),
            "Chat completion received"
        );
        Ok(response)
    }

    fn model_name(&self) -> &str {
        self.config.model.id()
    }
}
