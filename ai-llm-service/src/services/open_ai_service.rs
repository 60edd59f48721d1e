//! OpenAI-compatible service for text generation.
//!
//! Minimal, synchronous (non-streaming) client around the chat-completions
//! REST shape. Endpoint is derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions — chat completion (non-streaming)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAi`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::Duration;

use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::llm_provider::LlmProvider;
use crate::llm::LlmModelConfig;

/// Errors produced by [`OpenAiService`].
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// The provider in the config is not OpenAI.
    #[error("[AI LLM Service] invalid provider: expected OpenAI, got different provider")]
    InvalidProvider,

    /// API key missing from config.
    #[error("[AI LLM Service] missing OpenAI API key")]
    MissingApiKey,

    /// Invalid endpoint (empty or missing http/https).
    #[error("[AI LLM Service] invalid OpenAI endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error.
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[AI LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Optional short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),

    /// Upstream returned zero choices.
    #[error("[AI LLM Service] response contained no choices")]
    EmptyChoices,
}

/// Result alias for OpenAI operations.
pub type Result<T> = std::result::Result<T, OpenAiError>;

/// Thin client for an OpenAI-compatible API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers) and
/// exposes [`OpenAiService::generate`] for single, non-streaming completions.
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// Validates the provider, API key, and endpoint scheme. Builds an HTTP
    /// client with default headers and a configurable timeout.
    ///
    /// # Errors
    /// - [`OpenAiError::InvalidProvider`] if `cfg.provider` is not OpenAI
    /// - [`OpenAiError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`OpenAiError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OpenAiError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::OpenAi {
            return Err(OpenAiError::InvalidProvider);
        }

        let api_key = cfg.api_key.clone().ok_or(OpenAiError::MissingApiKey)?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OpenAiError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| OpenAiError::Decode(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a **non-streaming** chat completion request (`/v1/chat/completions`).
    ///
    /// Minimal `messages` array: a single user message with `prompt`.
    /// Mapped options from config: `model`, `temperature`, `top_p`; `max_tokens`
    /// takes the per-call override, falling back to `self.cfg.max_tokens`.
    ///
    /// # Errors
    /// - [`OpenAiError::HttpStatus`] for non-2xx responses
    /// - [`OpenAiError::Transport`] for client/network failures
    /// - [`OpenAiError::Decode`] if the JSON cannot be parsed
    /// - [`OpenAiError::EmptyChoices`] if no choices are returned
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, max_tokens: Option<u32>) -> Result<String> {
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, max_tokens);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = text.chars().take(240).collect::<String>();
            return Err(OpenAiError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| OpenAiError::Decode(format!("serde error: {e}")))?;

        let choice = out.choices.into_iter().next().ok_or(OpenAiError::EmptyChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, max_tokens: Option<u32>) -> Self {
        Self {
            model: &cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            max_tokens: max_tokens.or(cfg.max_tokens),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body subset for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
