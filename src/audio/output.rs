use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// Single shared audio output playing queued mono samples.
///
/// Samples are drained from an internal buffer by the device callback;
/// `stop` clears the buffer so playback cuts off immediately.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    buffer: Arc<Mutex<Vec<f32>>>,
    is_playing: Arc<Mutex<bool>>,
}

impl AudioOutput {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No output device available".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to get output config: {}", e))
            })?
            .into();

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            "Opened output device"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            is_playing: Arc::new(Mutex::new(false)),
        })
    }

    /// Native sample rate of the output device.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Queue mono samples (already at the device rate) for playback.
    ///
    /// Builds the output stream on first use.
    pub fn enqueue(&mut self, samples: &[f32]) -> Result<()> {
        if self.stream.is_none() {
            self.start_stream()?;
        }
        *self.is_playing.lock() = true;
        self.buffer.lock().extend_from_slice(samples);
        Ok(())
    }

    /// Number of samples still waiting to be played.
    pub fn remaining(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Stop playback immediately, discarding queued samples.
    pub fn stop(&mut self) {
        *self.is_playing.lock() = false;
        self.buffer.lock().clear();
    }

    fn start_stream(&mut self) -> Result<()> {
        let channels = self.config.channels as usize;
        let is_playing = Arc::clone(&self.is_playing);
        let buffer = Arc::clone(&self.buffer);

        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !*is_playing.lock() {
                        data.fill(0.0);
                        return;
                    }

                    let mut buf = buffer.lock();
                    let samples_needed = data.len() / channels;
                    let samples_available = buf.len().min(samples_needed);

                    for i in 0..samples_available {
                        let sample = buf[i];
                        for c in 0..channels {
                            data[i * channels + c] = sample;
                        }
                    }
                    buf.drain(0..samples_available);

                    for value in data.iter_mut().skip(samples_available * channels) {
                        *value = 0.0;
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to build output stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            ParleyError::AudioDeviceError(format!("Failed to start output stream: {}", e))
        })?;

        self.stream = Some(stream);
        Ok(())
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
