//! File ingestion
//!
//! Turns a file on disk into the normalized [`Attachment`] the core accepts.
//! Audio is never transcribed here: a transcriber must have written
//! `<stem>_transcription.json` (`{"text": "..."}`) next to the recording.

use base64::Engine;
use polymath_core::{Attachment, AttachmentKind, PolymathError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct Transcription {
    text: String,
}

/// Read `path` into an attachment
pub fn ingest(path: &Path) -> Result<Attachment> {
    let kind = AttachmentKind::from_path(path)?;
    tracing::debug!(path = %path.display(), kind = ?kind, "ingesting attachment");

    match kind {
        AttachmentKind::Code => Ok(Attachment::Code {
            text: fs::read_to_string(path)?,
        }),
        AttachmentKind::Image => {
            let bytes = fs::read(path)?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            Ok(Attachment::Image {
                data_url: format!("data:image/png;base64,{}", encoded),
            })
        }
        AttachmentKind::Audio => {
            let cache = transcription_path(path);
            if !cache.exists() {
                return Err(PolymathError::not_found(format!(
                    "transcription {} (transcribe {} first)",
                    cache.display(),
                    path.display()
                )));
            }
            let content = fs::read_to_string(&cache)?;
            let transcription: Transcription = serde_json::from_str(&content)?;
            Ok(Attachment::Transcript {
                text: transcription.text,
            })
        }
        AttachmentKind::Spreadsheet => {
            let absolute = fs::canonicalize(path)?;
            Ok(Attachment::Spreadsheet {
                path: absolute.display().to_string(),
            })
        }
    }
}

/// Cached transcription for an audio file
pub fn transcription_path(audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    audio.with_file_name(format!("{}_transcription.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_code_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solve.py");
        fs::write(&path, "print(1 + 1)\n").unwrap();

        assert_eq!(
            ingest(&path).unwrap(),
            Attachment::Code {
                text: "print(1 + 1)\n".to_string()
            }
        );
    }

    #[test]
    fn test_image_becomes_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.PNG");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        match ingest(&path).unwrap() {
            Attachment::Image { data_url } => assert_eq!(data_url, "data:image/png;base64,iVBORw=="),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_audio_uses_cached_transcription() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("recipe.mp3");
        fs::write(&audio, b"ID3").unwrap();
        fs::write(
            dir.path().join("recipe_transcription.json"),
            r#"{"text": "two cups of flour"}"#,
        )
        .unwrap();

        assert_eq!(
            ingest(&audio).unwrap(),
            Attachment::Transcript {
                text: "two cups of flour".to_string()
            }
        );
    }

    #[test]
    fn test_audio_without_transcription() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("lecture.mp3");
        fs::write(&audio, b"ID3").unwrap();

        let err = ingest(&audio).unwrap_err();
        assert!(matches!(err, PolymathError::NotFound(_)));
        assert!(err.to_string().contains("lecture_transcription.json"));
    }

    #[test]
    fn test_spreadsheet_path_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");
        fs::write(&path, b"PK").unwrap();

        match ingest(&path).unwrap() {
            Attachment::Spreadsheet { path: absolute } => {
                assert!(Path::new(&absolute).is_absolute());
                assert!(absolute.ends_with("sales.xlsx"));
            }
            other => panic!("expected spreadsheet, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        fs::write(&path, b"x").unwrap();
        assert!(matches!(
            ingest(&path).unwrap_err(),
            PolymathError::UnsupportedAttachment(_)
        ));

        let missing = dir.path().join("missing.py");
        assert!(matches!(ingest(&missing).unwrap_err(), PolymathError::Io(_)));
    }
}
