//! LLM integration module
//!
//! Blocking chat-completion backends used by the capability adapter.
//!
//! Supported providers:
//! - OpenAI (and OpenAI-compatible APIs)
//! - Gemini (Google AI)
//! - Ollama (local inference)

mod error;
mod gemini;
mod message;
mod ollama;
mod openai;
mod provider;
mod registry;

pub use error::LlmError;
pub use message::{parse_data_url, ChatMessage, ContentPart, MessageContent, MessageRole};
pub use provider::{
    Completion, CompletionOptions, LlmProvider, ProviderStatus, SharedProvider,
};
pub use registry::{build_provider, ProviderInfo, ProviderRegistry};

// Provider implementations
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
