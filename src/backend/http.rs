//! HTTP implementation of the speech backend contract.

use super::config::BackendConfig;
use super::types::{StopReply, StopRequest, TextReply, TextRequest, VoiceReply};
use super::ChatBackend;
use crate::{ParleyError, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Speech backend client over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate().map_err(ParleyError::ConfigError)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ParleyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::NetworkFailure(format!(
                "Backend returned status {}",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&text)
            .map_err(|e| ParleyError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_text(&self, message: &str) -> Result<TextReply> {
        debug!("Sending text message to {}", self.url("/chat/text"));

        let body = TextRequest {
            message: message.to_string(),
            user_id: self.config.user_id.clone(),
        };

        let response = self
            .client
            .post(self.url("/chat/text"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Text request failed: {}", e)))?;

        Self::parse_json(response).await
    }

    async fn send_voice(&self, wav_bytes: Vec<u8>) -> Result<VoiceReply> {
        debug!(
            "Uploading {} byte voice clip to {}",
            wav_bytes.len(),
            self.url("/chat/voice")
        );

        let part = reqwest::multipart::Part::bytes(wav_bytes)
            .file_name("recording.wav")
            .mime_str("audio/wav")
            .map_err(|e| ParleyError::ConfigError(format!("Invalid multipart payload: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("audio", part)
            .text("user_id", self.config.user_id.clone());

        let response = self
            .client
            .post(self.url("/chat/voice"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Voice upload failed: {}", e)))?;

        Self::parse_json(response).await
    }

    async fn stop_voice(&self) -> Result<()> {
        let body = StopRequest {
            user_id: self.config.user_id.clone(),
        };

        let response = self
            .client
            .post(self.url("/voice/stop"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Stop request failed: {}", e)))?;

        let reply: StopReply = Self::parse_json(response).await?;
        if !reply.is_success() {
            warn!("Backend refused voice stop: {:?}", reply.error);
            return Err(ParleyError::NetworkFailure(
                reply.error.unwrap_or_else(|| "Failed to stop AI voice".to_string()),
            ));
        }

        info!("Backend acknowledged voice stop");
        Ok(())
    }

    async fn fetch_speech(&self, tts_path: &str) -> Result<Vec<u8>> {
        let url = self.url(tts_path);
        debug!("Fetching synthesized speech from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Speech fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::NetworkFailure(format!(
                "Speech fetch returned status {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ParleyError::NetworkFailure(format!("Failed to read speech body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
