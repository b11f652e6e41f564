//! Ollama LLM provider
//!
//! Connects to a local Ollama instance for chat completions.

use super::{
    parse_data_url, ChatMessage, Completion, CompletionOptions, LlmError, LlmProvider,
    ProviderStatus,
};
use serde_json::{json, Value};

/// Ollama provider for local LLM inference
pub struct OllamaProvider {
    /// Base URL for Ollama API
    base_url: String,

    /// Model to use
    model: String,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new("http://localhost:11434", "llama3.1")
    }
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create with default URL
    pub fn with_model(model: &str) -> Self {
        Self::new("http://localhost:11434", model)
    }

    /// Check if Ollama is running
    fn check_connection(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        ureq::get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .call()
            .is_ok()
    }
}

impl LlmProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn status(&self) -> ProviderStatus {
        if self.check_connection() {
            ProviderStatus::Ready
        } else {
            ProviderStatus::Unavailable("Cannot connect to Ollama".to_string())
        }
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let model = self.model();
        let url = format!("{}/api/chat", self.base_url);
        let body = request_body(&model, messages, options);

        tracing::debug!(model = %model, messages = messages.len(), "ollama request");

        let response = ureq::post(&url)
            .timeout(options.timeout)
            .set("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Transport(t) if !t.to_string().contains("timed out") => {
                    LlmError::ProviderUnavailable(format!(
                        "Cannot connect to Ollama at {}: {}",
                        self.base_url, t
                    ))
                }
                other => LlmError::from(other),
            })?;

        let raw: Value = response.into_json()?;

        if let Some(error) = raw.get("error").and_then(|e| e.as_str()) {
            return Err(LlmError::Api {
                status: 500,
                message: error.to_string(),
            });
        }

        let text = raw
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Completion { text, raw })
    }
}

/// Build an `/api/chat` request body
///
/// Ollama takes images as bare base64 strings on the message.
fn request_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> Value {
    let conversation: Vec<Value> = messages
        .iter()
        .map(|msg| {
            let mut value = json!({
                "role": msg.role_str(),
                "content": msg.text(),
            });
            let images: Vec<&str> = msg
                .content
                .images()
                .into_iter()
                .filter_map(|url| parse_data_url(url).map(|(_, data)| data))
                .collect();
            if !images.is_empty() {
                value["images"] = json!(images);
            }
            value
        })
        .collect();

    let mut model_options = json!({ "temperature": options.temperature });
    if let Some(max_tokens) = options.max_tokens {
        model_options["num_predict"] = json!(max_tokens);
    }

    json!({
        "model": model,
        "messages": conversation,
        "stream": false,
        "options": model_options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body() {
        let messages = vec![
            ChatMessage::system("answer tersely"),
            ChatMessage::user_with_image("what is it?", "data:image/png;base64,QUJD"),
        ];
        let body = request_body("llama3.1", &messages, &CompletionOptions::default());

        assert_eq!(body["model"], "llama3.1");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
        assert_eq!(body["messages"][1]["content"], "what is it?");
        assert_eq!(body["messages"][1]["images"][0], "QUJD");
        assert!(body["messages"][0].get("images").is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1");
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.model(), "llama3.1");
    }
}
