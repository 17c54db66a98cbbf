//! Latency measurement utilities.
//!
//! Tracks per-interaction wall times and the stt/llm/tts breakdown the
//! backend reports alongside its replies.

use crate::transcript::format_duration_ms;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tracks round-trip timings over a sliding window
#[derive(Debug)]
pub struct TimingTracker {
    samples: VecDeque<Duration>,
    max_samples: usize,
}

impl TimingTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().min().copied().unwrap_or(Duration::ZERO)
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().max().copied().unwrap_or(Duration::ZERO)
    }

    /// 95th percentile over the window
    pub fn percentile_95(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted: Vec<_> = self.samples.iter().copied().collect();
        sorted.sort();
        let idx = (sorted.len() as f32 * 0.95) as usize;
        sorted
            .get(idx.min(sorted.len() - 1))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn summary(&self) -> String {
        if self.samples.is_empty() {
            return "no completed interactions".to_string();
        }
        format!(
            "{} interactions | avg {} | min {} | max {} | p95 {}",
            self.count(),
            format_duration_ms(self.average().as_millis() as u64),
            format_duration_ms(self.min().as_millis() as u64),
            format_duration_ms(self.max().as_millis() as u64),
            format_duration_ms(self.percentile_95().as_millis() as u64),
        )
    }
}

/// A simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Per-interaction latency breakdown, milliseconds. Server-reported values
/// take precedence over client-measured wall time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LatencyBreakdown {
    pub stt_ms: Option<u64>,
    pub llm_ms: Option<u64>,
    pub tts_ms: Option<u64>,
    pub total_ms: Option<u64>,
}

impl LatencyBreakdown {
    /// Sum of the reported stages, when all are present
    pub fn stage_total_ms(&self) -> Option<u64> {
        match (self.stt_ms, self.llm_ms, self.tts_ms) {
            (Some(stt), Some(llm), Some(tts)) => Some(stt + llm + tts),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(stt) = self.stt_ms {
            parts.push(format!("STT: {}", format_duration_ms(stt)));
        }
        if let Some(llm) = self.llm_ms {
            parts.push(format!("LLM: {}", format_duration_ms(llm)));
        }
        if let Some(tts) = self.tts_ms {
            parts.push(format!("TTS: {}", format_duration_ms(tts)));
        }
        if let Some(total) = self.total_ms {
            parts.push(format!("Total: {}", format_duration_ms(total)));
        }

        if parts.is_empty() {
            "no latency data".to_string()
        } else {
            parts.join(" | ")
        }
    }
}
