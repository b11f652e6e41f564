//! Gemini LLM provider
//!
//! Talks to the Google AI `generateContent` endpoint.

use super::{
    parse_data_url, ChatMessage, Completion, CompletionOptions, ContentPart, LlmError,
    LlmProvider, MessageContent, MessageRole, ProviderStatus,
};
use serde_json::{json, Value};

/// Gemini provider
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: model.to_string(),
        }
    }

    /// Override the API host
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

impl LlmProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn name(&self) -> &str {
        "Gemini"
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
                "Gemini: no API key configured".to_string(),
            ));
        }

        let model = self.model();
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model
        );
        let body = request_body(messages, options);

        tracing::debug!(model = %model, messages = messages.len(), "gemini request");

        let response = ureq::post(&url)
            .timeout(options.timeout)
            .query("key", &self.api_key)
            .set("Content-Type", "application/json")
            .send_json(&body)?;

        let raw: Value = response.into_json()?;
        let text = extract_text(&raw)?;

        Ok(Completion { text, raw })
    }
}

/// Build a `generateContent` request body
///
/// System messages are merged into `systemInstruction`; assistant turns use the
/// `model` role. Agent names are folded into the text since the API has no
/// per-message name field.
fn request_body(messages: &[ChatMessage], options: &CompletionOptions) -> Value {
    let system: Vec<Value> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| json!({ "text": m.text() }))
        .collect();

    let contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let role = match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            json!({ "role": role, "parts": parts_json(m) })
        })
        .collect();

    let mut generation = json!({ "temperature": options.temperature });
    if let Some(max_tokens) = options.max_tokens {
        generation["maxOutputTokens"] = json!(max_tokens);
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation,
    });
    if !system.is_empty() {
        body["systemInstruction"] = json!({ "parts": system });
    }
    body
}

fn parts_json(msg: &ChatMessage) -> Vec<Value> {
    let prefix = msg
        .name
        .as_ref()
        .map(|n| format!("[{}] ", n))
        .unwrap_or_default();

    match &msg.content {
        MessageContent::Text(text) => vec![json!({ "text": format!("{}{}", prefix, text) })],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => json!({ "text": format!("{}{}", prefix, text) }),
                ContentPart::ImageUrl { url } => match parse_data_url(url) {
                    Some((mime, data)) => {
                        json!({ "inline_data": { "mime_type": mime, "data": data } })
                    }
                    None => json!({ "file_data": { "file_uri": url } }),
                },
            })
            .collect(),
    }
}

fn extract_text(raw: &Value) -> Result<String, LlmError> {
    if let Some(error) = raw.get("error") {
        let status = error.get("code").and_then(|c| c.as_u64()).unwrap_or(500) as u16;
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(LlmError::Api {
            status,
            message: message.to_string(),
        });
    }

    let candidate = raw
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| LlmError::InvalidResponse("no candidates in response".to_string()))?;

    let text = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_moves_system_prompt() {
        let messages = vec![
            ChatMessage::system("You verify answers."),
            ChatMessage::user("What is 2 + 2?"),
            ChatMessage::assistant("4").with_name("generator"),
        ];
        let body = request_body(&messages, &CompletionOptions::default());

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You verify answers."
        );
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "[generator] 4");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[test]
    fn test_inline_image() {
        let messages = vec![ChatMessage::user_with_image(
            "describe",
            "data:image/png;base64,QUJD",
        )];
        let body = request_body(&messages, &CompletionOptions::default());
        let image = &body["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(image["mime_type"], "image/png");
        assert_eq!(image["data"], "QUJD");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let raw = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Par" }, { "text": "is" }] } }]
        });
        assert_eq!(extract_text(&raw).unwrap(), "Paris");
    }

    #[test]
    fn test_extract_text_api_error() {
        let raw = json!({ "error": { "code": 400, "message": "API key not valid" } });
        let err = extract_text(&raw).unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
    }
}
