//! Speech I/O: microphone capture, remote transcription, and voice
//! synthesis playback, under a single mutually-exclusive voice state.

pub mod capture;
pub mod synthesis;
pub mod voice;

pub use capture::{TranscriptionClient, TranscriptionConfig};
pub use synthesis::{SynthesisClient, SynthesisConfig, SynthesizedAudio};
pub use voice::{VoiceState, VoiceStateMachine};

use crate::{ParleyError, Result};
use async_trait::async_trait;
use tracing::debug;

/// Result of probing the host for speech capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported(String),
    PermissionDenied,
}

impl Capability {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported)
    }

    /// User-facing notice for a non-supported capability.
    pub fn notice(&self) -> Option<String> {
        match self {
            Capability::Supported => None,
            Capability::Unsupported(reason) => {
                Some(format!("Speech is not available: {}", reason))
            }
            Capability::PermissionDenied => {
                Some("Microphone/speaker access was denied.".to_string())
            }
        }
    }
}

/// Outcome of a capture toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Recording started.
    Started,
    /// Recording stopped; carries the transcript.
    Stopped(String),
}

/// The session controller's seam to speech I/O.
///
/// Not `Send`: the real adapter owns platform audio streams and lives on
/// the single control-flow thread with the controller.
#[async_trait(?Send)]
pub trait SpeechPort {
    fn capability(&self) -> Capability;

    fn voice_state(&self) -> VoiceState;

    /// Synthesize and play `text`, returning once playback ends.
    /// Any other voice activity is stopped first.
    async fn speak(&mut self, text: &str) -> Result<()>;

    /// Toggle capture: start recording, or stop and transcribe the clip.
    /// Starting interrupts any active playback first.
    async fn toggle_capture(&mut self) -> Result<CaptureOutcome>;

    /// Stop any capture or playback and return the voice state to idle.
    fn stop_all(&mut self);
}

/// No-op speech port for hosts without audio support and for tests.
#[derive(Default)]
pub struct NullSpeech;

impl NullSpeech {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl SpeechPort for NullSpeech {
    fn capability(&self) -> Capability {
        Capability::Unsupported("no speech backend".to_string())
    }

    fn voice_state(&self) -> VoiceState {
        VoiceState::Idle
    }

    async fn speak(&mut self, _text: &str) -> Result<()> {
        debug!("Speech output unavailable, reply shown as text only");
        Ok(())
    }

    async fn toggle_capture(&mut self) -> Result<CaptureOutcome> {
        Err(ParleyError::CaptureError(
            "Speech capture is not supported on this host".into(),
        ))
    }

    fn stop_all(&mut self) {}
}

/// Real speech adapter: synthesis playback through the shared audio
/// output, clip capture through the microphone, one voice state.
#[cfg(feature = "audio-io")]
pub struct SpeechAdapter {
    machine: VoiceStateMachine,
    synthesis: SynthesisClient,
    transcription: TranscriptionClient,
    output: Option<crate::audio::AudioOutput>,
    recorder: Option<capture::ClipRecorder>,
    capability: Capability,
}

#[cfg(feature = "audio-io")]
impl SpeechAdapter {
    /// Probe the audio host and build the adapter. A missing or
    /// inaccessible output device degrades the capability rather than
    /// failing construction.
    pub fn new(synthesis: SynthesisConfig, transcription: TranscriptionConfig) -> Self {
        let (output, capability) = match crate::audio::AudioOutput::new() {
            Ok(output) => (Some(output), Capability::Supported),
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(error = %reason, "Audio output unavailable");
                let capability = if reason.to_lowercase().contains("permission")
                    || reason.to_lowercase().contains("access")
                {
                    Capability::PermissionDenied
                } else {
                    Capability::Unsupported(reason)
                };
                (None, capability)
            }
        };

        Self {
            machine: VoiceStateMachine::new(),
            synthesis: SynthesisClient::new(synthesis),
            transcription: TranscriptionClient::new(transcription),
            output,
            recorder: None,
            capability,
        }
    }

    fn discard_recording(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            // Interrupted capture is discarded, not transcribed.
            drop(recorder);
        }
    }

    async fn play(&mut self, audio: SynthesizedAudio) -> Result<()> {
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| ParleyError::AudioDeviceError("No output device".into()))?;

        let device_rate = output.sample_rate();
        let samples = crate::audio::resample(&audio.samples, audio.sample_rate, device_rate)?;
        output.enqueue(&samples)?;

        // Await playback completion; an interleaved stop drains the buffer
        // and ends the wait early.
        loop {
            if self.machine.state() != VoiceState::Speaking {
                break;
            }
            let remaining = self.output.as_ref().map(|o| o.remaining()).unwrap_or(0);
            if remaining == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        Ok(())
    }
}

#[cfg(feature = "audio-io")]
#[async_trait(?Send)]
impl SpeechPort for SpeechAdapter {
    fn capability(&self) -> Capability {
        self.capability.clone()
    }

    fn voice_state(&self) -> VoiceState {
        self.machine.state()
    }

    async fn speak(&mut self, text: &str) -> Result<()> {
        self.stop_all();
        self.machine.begin_speaking();

        let audio = match self.synthesis.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                // Degrade to text: reset the voice state and surface the
                // error for logging, conversation log untouched.
                self.machine.finish();
                return Err(e);
            }
        };

        let played = self.play(audio).await;
        self.machine.finish();
        played
    }

    async fn toggle_capture(&mut self) -> Result<CaptureOutcome> {
        if let Some(recorder) = self.recorder.take() {
            self.machine.finish();
            let clip = recorder.stop()?;
            let transcript = self.transcription.transcribe(clip).await?;
            return Ok(CaptureOutcome::Stopped(transcript));
        }

        if let Some(interrupted) = self.machine.begin_capture() {
            debug!(?interrupted, "Interrupting voice activity for capture");
            if let Some(output) = self.output.as_mut() {
                output.stop();
            }
        }

        match capture::ClipRecorder::start() {
            Ok(recorder) => {
                self.recorder = Some(recorder);
                Ok(CaptureOutcome::Started)
            }
            Err(e) => {
                self.machine.finish();
                Err(e)
            }
        }
    }

    fn stop_all(&mut self) {
        self.discard_recording();
        if let Some(output) = self.output.as_mut() {
            output.stop();
        }
        self.machine.finish();
    }
}
