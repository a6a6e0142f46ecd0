//! Configuration for the assistant process.
//!
//! Plain structs with defaults matching the reference deployment,
//! overridable through `PARLEY_*` environment variables.

use crate::gateway::ProviderConfig;
use crate::speech::{SynthesisConfig, TranscriptionConfig};
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3030";
const DEFAULT_STATE_DIR: &str = ".parley";

/// Configuration for the complete assistant.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the relay endpoint binds to.
    pub bind_addr: String,

    /// Upstream LLM provider.
    pub provider: ProviderConfig,

    /// Voice synthesis service.
    pub synthesis: SynthesisConfig,

    /// Transcription service.
    pub transcription: TranscriptionConfig,

    /// Directory holding persisted conversation state.
    pub state_dir: PathBuf,

    /// Whether to enable speech capture and playback.
    pub enable_voice: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            provider: ProviderConfig::default(),
            synthesis: SynthesisConfig::default(),
            transcription: TranscriptionConfig::default(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            enable_voice: true,
        }
    }
}

impl AppConfig {
    /// Build a configuration from the environment.
    pub fn from_env() -> Self {
        let mut config = Self {
            provider: ProviderConfig::from_env(),
            synthesis: SynthesisConfig::from_env(),
            transcription: TranscriptionConfig::from_env(),
            ..Self::default()
        };
        if let Ok(addr) = std::env::var("PARLEY_BIND") {
            config.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("PARLEY_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }
        if let Ok(flag) = std::env::var("PARLEY_VOICE") {
            config.enable_voice = flag != "0" && flag.to_lowercase() != "false";
        }
        config
    }

    /// The relay endpoint URL the controller talks to.
    pub fn gateway_endpoint(&self) -> String {
        format!("http://{}/api/debate", self.bind_addr)
    }

    /// Disable voice I/O (text-only mode).
    pub fn without_voice(mut self) -> Self {
        self.enable_voice = false;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", self.bind_addr));
        }
        if self.provider.model.is_empty() {
            return Err("Provider model must not be empty".to_string());
        }
        if self.enable_voice && self.synthesis.api_key.is_empty() {
            // Voice stays enabled; synthesis calls will degrade to text.
            tracing::warn!("No synthesis API key configured, replies will not be spoken");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enable_voice);
    }

    #[test]
    fn test_gateway_endpoint_derived_from_bind() {
        let config = AppConfig::default();
        assert_eq!(config.gateway_endpoint(), "http://127.0.0.1:3030/api/debate");
    }

    #[test]
    fn test_invalid_bind_addr_is_rejected() {
        let config = AppConfig {
            bind_addr: "not-an-addr".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_without_voice() {
        let config = AppConfig::default().without_voice();
        assert!(!config.enable_voice);
    }
}
