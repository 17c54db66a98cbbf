//! Wire types for the speech backend endpoints.
//!
//! Latency values are integer milliseconds as reported by the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TextRequest {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextReply {
    pub response: String,
    #[serde(default)]
    pub latency: Option<TextLatency>,
}

impl TextReply {
    /// Server-reported processing time, if any
    pub fn processing_ms(&self) -> Option<u64> {
        self.latency.as_ref().and_then(|l| l.processing)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextLatency {
    #[serde(default)]
    pub processing: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceReply {
    pub status: String,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub tts_file: Option<String>,
    #[serde(default)]
    pub latency: Option<VoiceLatency>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VoiceReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Backend error description, with a generic fallback
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Failed to process voice message".to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceLatency {
    #[serde(default)]
    pub stt: Option<u64>,
    #[serde(default)]
    pub tts: Option<u64>,
    #[serde(default)]
    pub llm: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopReply {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl StopReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_reply_with_latency() {
        let reply: TextReply =
            serde_json::from_str(r#"{"response": "hi", "latency": {"processing": 150}}"#).unwrap();
        assert_eq!(reply.response, "hi");
        assert_eq!(reply.processing_ms(), Some(150));
    }

    #[test]
    fn test_text_reply_without_latency() {
        let reply: TextReply = serde_json::from_str(r#"{"response": "hi"}"#).unwrap();
        assert_eq!(reply.processing_ms(), None);
    }

    #[test]
    fn test_voice_reply_success() {
        let reply: VoiceReply = serde_json::from_str(
            r#"{
                "status": "success",
                "transcription": "hello there",
                "response": "hi",
                "tts_file": "/audio/out.wav",
                "latency": {"stt": 300, "tts": 200, "llm": 450}
            }"#,
        )
        .unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.transcription.as_deref(), Some("hello there"));
        assert_eq!(reply.latency.unwrap().llm, Some(450));
    }

    #[test]
    fn test_voice_reply_error_fallback() {
        let reply: VoiceReply = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.error_message(), "Failed to process voice message");
    }
}
