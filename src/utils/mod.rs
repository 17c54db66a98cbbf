pub mod perf;

pub use perf::{LatencyBreakdown, Stopwatch, TimingTracker};
