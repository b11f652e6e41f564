//! OpenAI LLM provider
//!
//! Connects to OpenAI's API (or any OpenAI-compatible endpoint) for chat completions.

use super::{
    ChatMessage, Completion, CompletionOptions, ContentPart, LlmError, LlmProvider,
    MessageContent, ProviderStatus,
};
use serde_json::{json, Value};

/// OpenAI provider
pub struct OpenAIProvider {
    /// API key
    api_key: String,

    /// Base URL for the API (supports OpenAI-compatible APIs)
    base_url: String,

    /// Current model
    model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.to_string(),
        }
    }

    /// Create with a specific base URL (for OpenAI-compatible APIs like Azure, local proxies)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

impl LlmProvider for OpenAIProvider {
    fn id(&self) -> &str {
        "openai"
    }

    fn name(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn status(&self) -> ProviderStatus {
        if self.api_key.is_empty() {
            ProviderStatus::Unavailable("No API key configured".to_string())
        } else {
            ProviderStatus::Ready
        }
    }

    fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::ProviderUnavailable(
                "OpenAI: no API key configured".to_string(),
            ));
        }

        let body = request_body(&self.model(), messages, options);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %self.model(), messages = messages.len(), "openai request");

        let response = ureq::post(&url)
            .timeout(options.timeout)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)?;

        let raw: Value = response.into_json()?;
        let text = extract_text(&raw)?;

        Ok(Completion { text, raw })
    }
}

/// Build the chat-completions request body
fn request_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> Value {
    let conversation: Vec<Value> = messages.iter().map(message_json).collect();

    let mut body = json!({
        "model": model,
        "messages": conversation,
        "temperature": options.temperature,
    });
    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

fn message_json(msg: &ChatMessage) -> Value {
    let content = match &msg.content {
        MessageContent::Text(text) => json!(text),
        MessageContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => json!({ "type": "text", "text": text }),
                    ContentPart::ImageUrl { url } => {
                        json!({ "type": "image_url", "image_url": { "url": url } })
                    }
                })
                .collect(),
        ),
    };

    let mut value = json!({ "role": msg.role_str(), "content": content });
    if let Some(name) = &msg.name {
        value["name"] = json!(name);
    }
    value
}

/// Pull the assistant text out of a chat-completions response
fn extract_text(raw: &Value) -> Result<String, LlmError> {
    if let Some(error) = raw.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(LlmError::Api {
            status: 500,
            message: message.to_string(),
        });
    }

    let choice = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    Ok(choice
        .pointer("/message/content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user_with_image("what is this?", "data:image/png;base64,AAAA"),
            ChatMessage::assistant("a cat").with_name("reasoner"),
        ];
        let options = CompletionOptions {
            max_tokens: Some(64),
            ..Default::default()
        };

        let body = request_body("gpt-4o", &messages, &options);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
        assert_eq!(body["messages"][2]["name"], "reasoner");
    }

    #[test]
    fn test_extract_text() {
        let raw = json!({
            "choices": [{ "message": { "role": "assistant", "content": "42" } }]
        });
        assert_eq!(extract_text(&raw).unwrap(), "42");

        let null_content = json!({ "choices": [{ "message": { "content": null } }] });
        assert_eq!(extract_text(&null_content).unwrap(), "");
    }

    #[test]
    fn test_extract_text_errors() {
        let err = extract_text(&json!({ "error": { "message": "bad key" } })).unwrap_err();
        assert!(matches!(err, LlmError::Api { message, .. } if message == "bad key"));

        let err = extract_text(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_status_without_key() {
        let provider = OpenAIProvider::new("", "gpt-4o");
        assert!(!provider.status().is_ready());
        let err = provider
            .complete(&[ChatMessage::user("hi")], &CompletionOptions::default())
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderUnavailable(_)));
    }
}
