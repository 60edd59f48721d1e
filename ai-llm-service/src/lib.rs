//! Shared LLM service crate.
//!
//! Provides thin non-streaming clients for the supported inference backends
//! (Ollama, OpenAI-compatible) behind a single [`completion::CompletionClient`]
//! facade, plus the unified error types in [`error_handler`].
//!
//! Dispatch is enum-based; no `async-trait` and no `Box<dyn ...>`.

pub mod completion;
pub mod config;
pub mod error_handler;
pub mod services;

/// Convenience alias so call sites can write `ai_llm_service::llm::LlmModelConfig`.
pub use config::llm_model_config as llm;
