/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between different backends such as local Ollama
/// or any OpenAI-compatible chat-completion API (OpenAI itself, OpenRouter,
/// vLLM, and so on).
///
/// Adding more providers in the future (e.g., a native Anthropic client)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI-compatible chat completions API.
    OpenAi,
}

impl LlmProvider {
    /// Parses a provider name as found in configuration (`LLM_PROVIDER`).
    ///
    /// Accepted values (case-insensitive): `ollama`, `openai`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}
