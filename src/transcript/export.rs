//! Deterministic transcript serialization for export.
//!
//! JSON export is a pretty-printed array mirroring append order; text export
//! renders one `[timestamp] Role: content` line per turn with a blank line
//! between turns. Both are generated entirely client-side.

use super::types::{Role, Turn};
use crate::{ParleyError, Result};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    /// Default download file name for this format
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "chat-history.json",
            ExportFormat::Text => "chat-history.txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
        }
    }
}

/// Format a millisecond duration as `123ms`, `1.23s` or `1.23m`
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1_000.0)
    } else {
        format!("{:.2}m", ms as f64 / 60_000.0)
    }
}

/// Serialize a transcript snapshot into the requested format
pub fn export_transcript(turns: &[Turn], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(turns)
            .map_err(|e| ParleyError::IoError(format!("Failed to serialize transcript: {}", e))),
        ExportFormat::Text => {
            let mut out = String::from("Chat History\n=============\n\n");
            for turn in turns {
                let role = match turn.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                write!(out, "[{}] {}: {}", turn.timestamp, role, turn.content)
                    .map_err(|e| ParleyError::IoError(e.to_string()))?;
                if turn.role == Role::Assistant {
                    if let Some(ms) = turn.inference_ms {
                        write!(out, " (Inference: {})", format_duration_ms(ms))
                            .map_err(|e| ParleyError::IoError(e.to_string()))?;
                    }
                }
                out.push_str("\n\n");
            }
            Ok(out)
        }
    }
}

/// Export a transcript snapshot to a file on disk
pub fn export_to_file(turns: &[Turn], format: ExportFormat, dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join(format.file_name());
    let content = export_transcript(turns, format)?;
    std::fs::write(&path, content)?;
    info!("Exported {} turns to {:?}", turns.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_turns() -> Vec<Turn> {
        vec![
            Turn::user("Hello"),
            Turn::assistant("Hi! How can I help?").with_inference(1_250),
        ]
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(999), "999ms");
        assert_eq!(format_duration_ms(1_500), "1.50s");
        assert_eq!(format_duration_ms(90_000), "1.50m");
    }

    #[test]
    fn test_json_round_trip() {
        let turns = sample_turns();
        let json = export_transcript(&turns, ExportFormat::Json).unwrap();
        let parsed: Vec<Turn> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.len(), turns.len());
        for (original, restored) in turns.iter().zip(parsed.iter()) {
            assert_eq!(original.role, restored.role);
            assert_eq!(original.content, restored.content);
            assert_eq!(original.timestamp, restored.timestamp);
        }
    }

    #[test]
    fn test_text_export_layout() {
        let text = export_transcript(&sample_turns(), ExportFormat::Text).unwrap();

        assert!(text.starts_with("Chat History\n=============\n\n"));
        assert!(text.contains("You: Hello"));
        assert!(text.contains("Assistant: Hi! How can I help? (Inference: 1.25s)"));
        // One blank line between turns
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_text_export_without_inference() {
        let turns = vec![Turn::assistant("No timing here")];
        let text = export_transcript(&turns, ExportFormat::Text).unwrap();
        assert!(!text.contains("Inference"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_file(&sample_turns(), ExportFormat::Json, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "chat-history.json");
        let content = std::fs::read_to_string(path).unwrap();
        let parsed: Vec<Turn> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_empty_transcript_exports() {
        let json = export_transcript(&[], ExportFormat::Json).unwrap();
        assert_eq!(json, "[]");

        let text = export_transcript(&[], ExportFormat::Text).unwrap();
        assert_eq!(text, "Chat History\n=============\n\n");
    }
}
