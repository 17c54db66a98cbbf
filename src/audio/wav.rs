use crate::{ParleyError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Encode audio samples as 16-bit PCM WAV bytes
///
/// # Arguments
/// * `samples` - Audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| ParleyError::IoError(format!("Failed to create WAV writer: {}", e)))?;

        // Convert f32 samples to i16
        for &sample in samples {
            let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| ParleyError::IoError(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| ParleyError::IoError(format!("Failed to finalize WAV data: {}", e)))?;
    }

    let bytes = cursor.into_inner();
    debug!("Encoded {} samples into {} WAV bytes", samples.len(), bytes.len());
    Ok(bytes)
}

/// Decode WAV bytes into f32 samples
///
/// # Returns
/// * Tuple of (samples, sample_rate, channels)
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| ParleyError::IoError(format!("Failed to read WAV data: {}", e)))?;

    let spec = reader.spec();
    let samples: Result<Vec<f32>> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| ParleyError::IoError(format!("Failed to read sample: {}", e))))
            .collect(),
        SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|s| {
                    s.map(|sample| sample as f32 / i16::MAX as f32)
                        .map_err(|e| ParleyError::IoError(format!("Failed to read sample: {}", e)))
                })
                .collect(),
            other => Err(ParleyError::IoError(format!(
                "Unsupported bit depth: {}",
                other
            ))),
        },
    };

    Ok((samples?, spec.sample_rate, spec.channels))
}
