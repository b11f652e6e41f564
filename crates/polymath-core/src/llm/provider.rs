//! LLM provider trait and request options

use super::{ChatMessage, LlmError};
use std::time::Duration;

/// Per-request options
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,

    /// Wall-clock limit for the whole request
    pub timeout: Duration,

    /// Maximum output tokens, if the provider accepts a limit
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            timeout: Duration::from_secs(120),
            max_tokens: None,
        }
    }
}

/// One completed model turn
#[derive(Debug, Clone)]
pub struct Completion {
    /// Text of the reply, empty when the model produced none
    pub text: String,

    /// Raw provider response body
    pub raw: serde_json::Value,
}

/// Provider status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Ready to accept requests
    Ready,

    /// Not available (no API key, server down, etc.)
    Unavailable(String),
}

impl ProviderStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProviderStatus::Ready)
    }
}

/// LLM provider trait
///
/// Defines the interface for LLM providers (OpenAI, Gemini, Ollama).
/// Calls block until the provider answers or the request times out.
pub trait LlmProvider: Send + Sync {
    /// Get the provider's unique identifier (e.g., "openai", "gemini", "ollama")
    fn id(&self) -> &str;

    /// Get the provider's display name
    fn name(&self) -> &str;

    /// Get the currently active model name
    fn model(&self) -> String;

    /// Get current provider status
    fn status(&self) -> ProviderStatus;

    /// Send the conversation and wait for the reply
    fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Check if the provider is currently available
    fn is_available(&self) -> bool {
        self.status().is_ready()
    }
}

/// Wrapper to make Box<dyn LlmProvider> cloneable via Arc
pub type SharedProvider = std::sync::Arc<dyn LlmProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_options_default() {
        let options = CompletionOptions::default();
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.timeout, Duration::from_secs(120));
        assert!(options.max_tokens.is_none());
    }

    #[test]
    fn test_provider_status_ready() {
        assert!(ProviderStatus::Ready.is_ready());
    }

    #[test]
    fn test_provider_status_unavailable() {
        let status = ProviderStatus::Unavailable("No API key".to_string());
        assert!(!status.is_ready());
        assert!(matches!(status, ProviderStatus::Unavailable(msg) if msg == "No API key"));
    }
}
