//! Live audio activity visualization.
//!
//! Consumes time-domain samples at display cadence and emits one render
//! directive per frame: a smoothed 0-100 activity level classified into
//! {Silent, Low, Active} bands. Each `start` resets to a flat baseline.

/// Deviations below this fraction of full scale are treated as noise
const NOISE_FLOOR: f32 = 2.0 / 128.0;

/// Exponential smoothing factor applied to successive activity levels
const SMOOTHING: f32 = 0.6;

const ACTIVE_THRESHOLD: f32 = 30.0;
const LOW_THRESHOLD: f32 = 5.0;

/// Discretized audio-level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityBand {
    Silent,
    Low,
    Active,
}

/// Render directive for one visualization frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDirective {
    pub band: ActivityBand,
    /// Smoothed activity level, 0.0 to 100.0
    pub level: f32,
}

pub struct Visualizer {
    active: bool,
    smoothed: f32,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            active: false,
            smoothed: 0.0,
        }
    }

    /// Begin a visualization session from a flat baseline
    pub fn start(&mut self) {
        self.active = true;
        self.smoothed = 0.0;
    }

    /// Declare the source inactive; no further frames are produced
    pub fn stop(&mut self) {
        self.active = false;
        self.smoothed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Produce the render directive for one frame of samples, or `None` once
    /// the source has been declared inactive.
    pub fn tick(&mut self, samples: &[f32]) -> Option<FrameDirective> {
        if !self.active {
            return None;
        }

        let raw = activity_level(samples);
        self.smoothed = SMOOTHING * self.smoothed + (1.0 - SMOOTHING) * raw;

        let band = if self.smoothed > ACTIVE_THRESHOLD {
            ActivityBand::Active
        } else if self.smoothed > LOW_THRESHOLD {
            ActivityBand::Low
        } else {
            ActivityBand::Silent
        };

        Some(FrameDirective {
            band,
            level: self.smoothed,
        })
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean absolute deviation from the neutral midpoint, ignoring sub-noise
/// deviations, scaled to 0-100
fn activity_level(samples: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;

    for &sample in samples {
        let deviation = sample.abs();
        if deviation > NOISE_FLOOR {
            sum += deviation;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    let average = sum / count as f32;
    (average * 256.0).clamp(0.0, 100.0)
}
