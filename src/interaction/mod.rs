pub mod controller;

pub use controller::InteractionController;

use crate::transcript::Turn;
use crate::utils::LatencyBreakdown;
use uuid::Uuid;

/// The current stage of an in-flight interaction. Exactly one per
/// controller; mutated only by the controller itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    AwaitingResponse,
    PlayingAudio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// Events emitted by the interaction controller. The presentation layer
/// subscribes and renders; the controller never touches a UI directly.
#[derive(Debug, Clone)]
pub enum InteractionEvent {
    /// Recording has started
    RecordingStarted,

    /// Recording has stopped; the clip is being processed
    RecordingStopped,

    /// A turn was appended to the transcript
    TurnAppended(Turn),

    /// A generation request was issued
    GenerationStarted { request_id: Uuid },

    /// The assistant reply arrived and was appended
    GenerationComplete {
        request_id: Uuid,
        inference_ms: u64,
        total_ms: u64,
    },

    /// The in-flight generation was cancelled by the user
    GenerationCancelled { request_id: Uuid },

    /// A synthesized speech resource is available for playback
    PlaybackReady { tts_file: String },

    /// Fresh latency measurements for the latency panel
    LatencyUpdate(LatencyBreakdown),

    /// Transient user-visible notice
    Notice {
        severity: NoticeSeverity,
        message: String,
    },
}
