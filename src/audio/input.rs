use crate::{ParleyError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Microphone capture, downmixed to mono and fed to a channel.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    live: Arc<Mutex<bool>>,
}

impl AudioInput {
    /// Open the default input device.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ParleyError::AudioDeviceError("No input device available".into()))?;

        let config = device
            .default_input_config()
            .map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            "Opened input device"
        );

        Ok(Self {
            device,
            config,
            stream: None,
            live: Arc::new(Mutex::new(false)),
        })
    }

    /// Native sample rate of the input device.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start capturing, pushing mono chunks into `audio_tx`.
    pub fn start_recording(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if *self.live.lock() {
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let live = Arc::clone(&self.live);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*live.lock() {
                        return;
                    }
                    if let Err(e) = audio_tx.try_send(downmix_mono(data, channels)) {
                        debug!("Dropping capture chunk: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            ParleyError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        *self.live.lock() = true;
        self.stream = Some(stream);
        info!("Capture started");
        Ok(())
    }

    /// Stop capturing and tear the stream down.
    pub fn stop_recording(&mut self) {
        *self.live.lock() = false;
        if self.stream.take().is_some() {
            info!("Capture stopped");
        }
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop_recording();
    }
}

fn downmix_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_passes_mono_through() {
        let data = [0.1, 0.2, 0.3];
        assert_eq!(downmix_mono(&data, 1), data.to_vec());
    }

    #[test]
    fn test_downmix_averages_stereo_frames() {
        let data = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix_mono(&data, 2), vec![0.5, 0.5]);
    }
}
