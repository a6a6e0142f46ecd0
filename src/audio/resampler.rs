use crate::{ParleyError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Resample mono audio between sample rates.
///
/// Pads the final chunk with silence so no tail samples are dropped.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == 0 || output_rate == 0 {
        return Err(ParleyError::ConfigError(
            "Sample rates must be greater than 0".into(),
        ));
    }

    if input.is_empty() || input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let ratio = output_rate as f64 / input_rate as f64;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| ParleyError::AudioDeviceError(format!("Failed to create resampler: {}", e)))?;

    let mut output = Vec::with_capacity((input.len() as f64 * ratio * 1.1) as usize);

    for chunk in input.chunks(chunk_size) {
        let frame = if chunk.len() == chunk_size {
            chunk.to_vec()
        } else {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        };

        let processed = resampler
            .process(&[frame], None)
            .map_err(|e| ParleyError::AudioDeviceError(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&processed[0]);
    }

    debug!(
        input_len = input.len(),
        output_len = output.len(),
        input_rate,
        output_rate,
        "Resampled audio"
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_passthrough() {
        let input: Vec<f32> = (0..100).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resample(&input, 16000, 16000).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_upsampling_grows_output() {
        let input: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resample(&input, 22050, 44100).unwrap();
        assert!(output.len() > input.len());
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(resample(&[0.0; 16], 0, 16000).is_err());
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let output = resample(&[], 16000, 48000).unwrap();
        assert!(output.is_empty());
    }
}
