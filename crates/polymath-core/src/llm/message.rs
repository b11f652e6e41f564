//! Chat message types with multimodal support

use serde::{Deserialize, Serialize};

/// Role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Content part for multimodal messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text { text: String },

    /// Image, usually a `data:` URL
    ImageUrl { url: String },
}

/// Message content - either simple text or multipart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Multipart content (text + images)
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Get the text content as a string
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Check if this is simple text
    pub fn is_text(&self) -> bool {
        matches!(self, MessageContent::Text(_))
    }

    /// Get image URLs
    pub fn images(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(_) => vec![],
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ImageUrl { url } => Some(url.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Chat message for LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Agent that produced the message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Message content (can be text or multipart)
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a new user message with text content
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            name: None,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new system message with text content
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            name: None,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message with text and an image
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            name: None,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    url: image_url.into(),
                },
            ]),
        }
    }

    /// Tag the message with the agent that produced it
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the text content of the message
    pub fn text(&self) -> String {
        self.content.as_text()
    }

    /// Get the role as a string (for API compatibility)
    pub fn role_str(&self) -> &str {
        self.role.as_str()
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into mime type and payload
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role_str(), "user");
        assert_eq!(msg.text(), "Hello");
        assert!(msg.content.is_text());
    }

    #[test]
    fn test_user_with_image() {
        let msg = ChatMessage::user_with_image("What is shown?", "data:image/png;base64,AAAA");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.text(), "What is shown?");
        assert_eq!(msg.content.images(), vec!["data:image/png;base64,AAAA"]);
    }

    #[test]
    fn test_named_message_serialization() {
        let msg = ChatMessage::assistant("4").with_name("reasoner");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["name"], "reasoner");
        assert_eq!(json["content"], "4");

        let plain = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert!(plain.get("name").is_none());
    }

    #[test]
    fn test_parse_data_url() {
        assert_eq!(
            parse_data_url("data:image/png;base64,iVBORw0"),
            Some(("image/png", "iVBORw0"))
        );
        assert_eq!(parse_data_url("https://example.com/cat.png"), None);
        assert_eq!(parse_data_url("data:text/plain,hello"), None);
    }
}
