pub mod playback;
pub mod recorder;
pub mod visualizer;
pub mod wav;

pub use playback::{AudioSink, PlaybackController, PlaybackResource, PlaybackState};
pub use recorder::{CaptureSource, Recorder, RecorderState};
pub use visualizer::{ActivityBand, FrameDirective, Visualizer};
pub use wav::{decode_wav, encode_wav};

use crate::Result;
use serde::{Deserialize, Serialize};

/// A finalized captured audio buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode the clip as 16-bit PCM WAV bytes for upload.
    ///
    /// A zero-sample clip still encodes to a valid header-only payload.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        encode_wav(&self.samples, self.sample_rate, self.channels)
    }
}
