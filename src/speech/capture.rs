//! Microphone capture and remote transcription.
//!
//! Capture records a clip from the default input device; stopping encodes
//! the clip as 16 kHz WAV and sends it to an external transcription
//! service, returning the transcript.

use crate::{ParleyError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Sample rate clips are resampled to before transcription.
pub const TRANSCRIPTION_SAMPLE_RATE: u32 = 16000;

/// Configuration for the transcription service.
#[derive(Clone, Debug, Default)]
pub struct TranscriptionConfig {
    /// Full URL of the transcription endpoint.
    pub endpoint: String,

    /// API key sent as a bearer token.
    pub api_key: String,
}

impl TranscriptionConfig {
    /// Override defaults from `PARLEY_STT_URL` / `PARLEY_STT_API_KEY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PARLEY_STT_URL") {
            config.endpoint = url;
        }
        if let Ok(key) = std::env::var("PARLEY_STT_API_KEY") {
            config.api_key = key;
        }
        config
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for the transcription service.
#[derive(Clone)]
pub struct TranscriptionClient {
    client: Client,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send a WAV clip for transcription and return the transcript text.
    pub async fn transcribe(&self, wav_clip: Vec<u8>) -> Result<String> {
        if !self.config.is_configured() {
            return Err(ParleyError::TranscriptionError(
                "No transcription endpoint configured".into(),
            ));
        }

        debug!(bytes = wav_clip.len(), "Sending clip for transcription");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .header("content-type", "audio/wav")
            .body(wav_clip)
            .send()
            .await
            .map_err(|e| ParleyError::TranscriptionError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ParleyError::TranscriptionError(format!(
                "Transcription service returned status {}",
                response.status()
            )));
        }

        let body: TranscriptionResponse = response.json().await.map_err(|e| {
            ParleyError::TranscriptionError(format!("Invalid transcription response: {}", e))
        })?;

        Ok(body.text)
    }
}

/// An in-progress microphone recording.
#[cfg(feature = "audio-io")]
pub struct ClipRecorder {
    input: crate::audio::AudioInput,
    audio_rx: crossbeam_channel::Receiver<Vec<f32>>,
}

#[cfg(feature = "audio-io")]
impl ClipRecorder {
    /// Open the default input device and start recording.
    pub fn start() -> Result<Self> {
        let (audio_tx, audio_rx) = crossbeam_channel::bounded(1000);
        let mut input = crate::audio::AudioInput::new()?;
        input.start_recording(audio_tx)?;
        Ok(Self { input, audio_rx })
    }

    /// Stop recording and return the clip as a 16 kHz WAV payload.
    pub fn stop(mut self) -> Result<Vec<u8>> {
        let sample_rate = self.input.sample_rate();
        self.input.stop_recording();

        let mut samples = Vec::new();
        while let Ok(chunk) = self.audio_rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }

        tracing::info!(
            samples = samples.len(),
            secs = samples.len() as f32 / sample_rate as f32,
            "Recorded clip"
        );

        let resampled =
            crate::audio::resample(&samples, sample_rate, TRANSCRIPTION_SAMPLE_RATE)?;
        crate::audio::encode_wav(&resampled, TRANSCRIPTION_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_transcription_errors() {
        let client = TranscriptionClient::new(TranscriptionConfig::default());
        let err = client.transcribe(vec![0; 44]).await.unwrap_err();
        assert!(matches!(err, ParleyError::TranscriptionError(_)));
    }

    #[test]
    fn test_transcription_response_parses() {
        let body: TranscriptionResponse =
            serde_json::from_str(r#"{"text":"hello world","language":"en"}"#).unwrap();
        assert_eq!(body.text, "hello world");
    }
}
