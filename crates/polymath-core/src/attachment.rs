//! Pre-processed attachments and the initial conversation they seed
//!
//! File reading happens outside the core. Callers hand over an [`Attachment`]
//! whose payload is already extracted; the core only turns it into the first
//! user message of a run.

use crate::llm::ChatMessage;
use crate::{PolymathError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Attachment content, already normalized by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// Source code text
    Code { text: String },

    /// Image as a `data:<mime>;base64,...` URL
    Image { data_url: String },

    /// Transcript of an audio recording
    Transcript { text: String },

    /// Path to a tabular file, readable from the analysis sandbox
    Spreadsheet { path: String },
}

/// File types a caller may ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Code,
    Image,
    Audio,
    Spreadsheet,
}

impl AttachmentKind {
    /// Classify a file by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "py" => Ok(AttachmentKind::Code),
            "png" => Ok(AttachmentKind::Image),
            "mp3" => Ok(AttachmentKind::Audio),
            "xlsx" | "csv" => Ok(AttachmentKind::Spreadsheet),
            _ => Err(PolymathError::unsupported_attachment(format!(
                "{} (supported: .py, .png, .mp3, .xlsx, .csv)",
                path.display()
            ))),
        }
    }
}

/// Initial `messages` and `image` for a new run
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub messages: Vec<ChatMessage>,
    pub image: Option<String>,
}

/// Build the first user message for `question`, folding in the attachment
pub fn seed_messages(question: &str, attachment: Option<&Attachment>) -> Seed {
    let Some(attachment) = attachment else {
        return Seed {
            messages: vec![ChatMessage::user(question)],
            image: None,
        };
    };

    match attachment {
        Attachment::Code { text } => Seed {
            messages: vec![ChatMessage::user(format!("{}.\n### Code:\n{}", question, text))],
            image: None,
        },
        Attachment::Image { data_url } => Seed {
            messages: vec![ChatMessage::user_with_image(question, data_url.clone())],
            image: Some(data_url.clone()),
        },
        Attachment::Transcript { text } => Seed {
            messages: vec![ChatMessage::user(format!(
                "{}.\n### Audio transcription: {}",
                question, text
            ))],
            image: None,
        },
        Attachment::Spreadsheet { path } => Seed {
            messages: vec![ChatMessage::user(format!(
                "{}\n### File path:\n{}",
                question, path
            ))],
            image: None,
        },
    }
}
