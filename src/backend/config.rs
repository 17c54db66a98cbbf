//! Configuration for the speech backend connection.

use std::time::Duration;

/// Connection settings for the STT/TTS backend
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL of the speech backend, e.g. `http://localhost:5001`
    pub base_url: String,

    /// Per-session user identifier attached to every request
    pub user_id: String,

    /// Timeout applied to each request
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            user_id: generate_user_id(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Backend base URL is required".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("Backend base URL is not HTTP(S): {}", self.base_url));
        }
        if self.user_id.is_empty() {
            return Err("User id is required".to_string());
        }
        Ok(())
    }
}

/// Generate a fresh per-session user id (`user-<unix-millis>`)
pub fn generate_user_id() -> String {
    format!("user-{}", chrono::Utc::now().timestamp_millis())
}
