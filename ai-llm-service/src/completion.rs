//! Single completion facade over the supported providers.
//!
//! The rest of the application depends only on this capability:
//! `complete(prompt, max_tokens) -> text`. One adapter per provider is
//! selected at startup from [`LlmModelConfig`]; dispatch is enum-based.

use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Concrete completion client (enum-dispatch).
pub enum CompletionClient {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
}

impl CompletionClient {
    /// Constructs a concrete client from generic config.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] when the selected provider rejects the config
    /// (bad endpoint, missing API key) or the HTTP client cannot be built.
    pub fn from_config(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        debug!(provider = ?cfg.provider, model = %cfg.model, "initializing completion client");
        Ok(match cfg.provider {
            LlmProvider::Ollama => Self::Ollama(OllamaService::new(cfg)?),
            LlmProvider::OpenAi => Self::OpenAi(OpenAiService::new(cfg)?),
        })
    }

    /// Runs a single non-streaming completion and returns the raw text.
    ///
    /// `max_tokens` is the per-call token budget; `None` falls back to the
    /// configured default.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] on transport failures, non-success statuses, or
    /// undecodable responses. Callers that must not fail (the orchestrator's
    /// fallback paths) convert errors into fixed fallback values.
    pub async fn complete(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> Result<String, AiLlmError> {
        match self {
            Self::Ollama(svc) => Ok(svc.generate(prompt, max_tokens).await?),
            Self::OpenAi(svc) => Ok(svc.generate(prompt, max_tokens).await?),
        }
    }
}
