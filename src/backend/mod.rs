pub mod config;
pub mod http;
pub mod types;

pub use config::BackendConfig;
pub use http::HttpBackend;
pub use types::{StopReply, TextReply, VoiceLatency, VoiceReply};

use crate::Result;
use async_trait::async_trait;

/// Client-side contract of the speech backend.
///
/// Implemented over HTTP in production; tests inject scripted
/// implementations so the interaction state machine can be exercised
/// without a network.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Submit a text message and await the assistant reply
    async fn send_text(&self, message: &str) -> Result<TextReply>;

    /// Upload a recorded voice clip (WAV bytes) for transcription and reply
    async fn send_voice(&self, wav_bytes: Vec<u8>) -> Result<VoiceReply>;

    /// Tell the backend the user stopped the synthesized voice
    async fn stop_voice(&self) -> Result<()>;

    /// Fetch a synthesized speech resource by the path the backend returned
    async fn fetch_speech(&self, tts_path: &str) -> Result<Vec<u8>>;
}
