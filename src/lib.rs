pub mod audio;
pub mod config;
pub mod gateway;
pub mod session;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParleyError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Capture error: {0}")]
    CaptureError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Gateway error: {0}")]
    GatewayError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ParleyError {
    fn from(e: std::io::Error) -> Self {
        ParleyError::IOError(e.to_string())
    }
}

impl ParleyError {
    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ParleyError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            ParleyError::CaptureError(_) => {
                "Voice capture failed. Please try again.".to_string()
            }
            ParleyError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            ParleyError::SynthesisError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            ParleyError::GatewayError(_) | ParleyError::ProviderError(_) => {
                "Error generating response.".to_string()
            }
            ParleyError::EmptyPrompt => "Prompt must not be empty.".to_string(),
            ParleyError::StorageError(_) => {
                "Failed to save conversation state. Conversation continues in memory.".to_string()
            }
            ParleyError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ParleyError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParleyError>;
