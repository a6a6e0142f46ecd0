//! Voice synthesis client for an ElevenLabs-style text-to-speech API.
//!
//! Requests raw 16-bit PCM so the payload can be fed straight to the audio
//! output after a rate conversion, with no codec in between.

use crate::{ParleyError, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";
const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// PCM output format requested from the service.
const OUTPUT_FORMAT: &str = "pcm_22050";
const OUTPUT_SAMPLE_RATE: u32 = 22050;

/// Configuration for the synthesis service.
#[derive(Clone, Debug)]
pub struct SynthesisConfig {
    /// Base URL of the synthesis API.
    pub base_url: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Voice to synthesize with.
    pub voice_id: String,

    /// Synthesis model identifier.
    pub model_id: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

impl SynthesisConfig {
    /// Override defaults from `PARLEY_TTS_URL` / `PARLEY_TTS_API_KEY` /
    /// `PARLEY_TTS_VOICE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PARLEY_TTS_URL") {
            config.base_url = url;
        }
        if let Ok(key) = std::env::var("PARLEY_TTS_API_KEY") {
            config.api_key = key;
        }
        if let Ok(voice) = std::env::var("PARLEY_TTS_VOICE") {
            config.voice_id = voice;
        }
        config
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }
}

/// Synthesized speech as mono f32 samples.
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl SynthesizedAudio {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

#[derive(Serialize)]
struct SynthesisRequest {
    text: String,
    model_id: String,
}

/// HTTP client for the synthesis service.
#[derive(Clone)]
pub struct SynthesisClient {
    client: Client,
    config: SynthesisConfig,
}

impl SynthesisClient {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id,
            OUTPUT_FORMAT
        )
    }

    /// Convert text to speech, returning the full audio payload.
    pub async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio> {
        if text.trim().is_empty() {
            return Err(ParleyError::SynthesisError("Nothing to speak".into()));
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.config.api_key)
            .json(&SynthesisRequest {
                text: text.to_string(),
                model_id: self.config.model_id.clone(),
            })
            .send()
            .await
            .map_err(|e| ParleyError::SynthesisError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ParleyError::SynthesisError(format!(
                "Synthesis service returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ParleyError::SynthesisError(format!("Failed to read audio: {}", e)))?;

        let samples = pcm16_to_f32(&bytes);
        debug!(
            bytes = bytes.len(),
            samples = samples.len(),
            "Synthesized speech"
        );

        Ok(SynthesizedAudio {
            samples,
            sample_rate: OUTPUT_SAMPLE_RATE,
        })
    }
}

/// Decode little-endian 16-bit PCM into f32 samples. A trailing odd byte
/// is ignored.
fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / i16::MAX as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_decoding() {
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x01, 0x80];
        let samples = pcm16_to_f32(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 1.0).abs() < 1e-6);
        assert!((samples[2] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_pcm_decoding_ignores_trailing_byte() {
        let samples = pcm16_to_f32(&[0x00, 0x00, 0x42]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_endpoint_includes_voice_and_format() {
        let client = SynthesisClient::new(SynthesisConfig::default());
        let endpoint = client.endpoint();
        assert!(endpoint.contains(DEFAULT_VOICE_ID));
        assert!(endpoint.ends_with("output_format=pcm_22050"));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let client = SynthesisClient::new(SynthesisConfig::default());
        assert!(client.synthesize("  ").await.is_err());
    }

    #[test]
    fn test_duration() {
        let audio = SynthesizedAudio {
            samples: vec![0.0; 22050],
            sample_rate: 22050,
        };
        assert!((audio.duration_secs() - 1.0).abs() < 1e-6);
    }
}
