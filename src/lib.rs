pub mod audio;
pub mod backend;
pub mod interaction;
pub mod transcript;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A generation is already in progress")]
    Busy,

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IoError(e.to_string())
    }
}

impl ParleyError {
    /// Check if this error is recoverable by simply retrying the operation
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Permission must be granted by the user before another attempt
            ParleyError::PermissionDenied(_) => false,
            ParleyError::AudioDeviceError(_) => false,
            ParleyError::NetworkFailure(_) => true,
            ParleyError::MalformedResponse(_) => true,
            // Recovered automatically on the next user gesture
            ParleyError::PlaybackBlocked(_) => true,
            ParleyError::UserCancelled => true,
            ParleyError::InvalidInput(_) => true,
            ParleyError::Busy => true,
            ParleyError::IoError(_) => false,
            ParleyError::ConfigError(_) => false,
            ParleyError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description for the notice bar
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::PermissionDenied(_) => {
                "Unable to access microphone. Please grant permission and try again.".to_string()
            }
            ParleyError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            ParleyError::NetworkFailure(_) => {
                "Failed to reach the assistant backend. Please try again.".to_string()
            }
            ParleyError::MalformedResponse(_) => {
                "Sorry, I encountered an error processing your request.".to_string()
            }
            ParleyError::PlaybackBlocked(_) => {
                "AI voice response ready. It will play on your next interaction.".to_string()
            }
            ParleyError::UserCancelled => "Response generation cancelled".to_string(),
            ParleyError::InvalidInput(_) => "Please enter a message first.".to_string(),
            ParleyError::Busy => {
                "Still generating a response. Cancel it before sending another message.".to_string()
            }
            ParleyError::IoError(_) => "File system error occurred.".to_string(),
            ParleyError::ConfigError(_) => "Configuration error. Please check settings.".to_string(),
            ParleyError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;
