//! The interaction controller: owner of the turn lifecycle.
//!
//! All transcript mutation and phase transitions happen here. Operations are
//! cooperative and event-driven: the controller awaits the backend, the user
//! cancels through a signal, and a completion that lost the race checks a
//! "still relevant" flag before touching shared state.

use super::{InteractionEvent, NoticeSeverity, Phase};
use crate::audio::AudioClip;
use crate::backend::ChatBackend;
use crate::transcript::{export_transcript, ExportFormat, TranscriptStore, Turn};
use crate::utils::{LatencyBreakdown, Stopwatch, TimingTracker};
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Round-trip samples kept for the latency summary
const ROUND_TRIP_WINDOW: usize = 50;

struct ActiveGeneration {
    request_id: Uuid,
    cancelled: Arc<AtomicBool>,
    cancel_notify: Arc<Notify>,
}

/// Owns the interaction phase and at most one outstanding generation.
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct InteractionController {
    backend: Arc<dyn ChatBackend>,
    transcript: TranscriptStore,
    phase: Arc<Mutex<Phase>>,
    active: Arc<Mutex<Option<ActiveGeneration>>>,
    round_trips: Arc<Mutex<TimingTracker>>,
    event_tx: Sender<InteractionEvent>,
    event_rx: Receiver<InteractionEvent>,
}

impl InteractionController {
    pub fn new(backend: Arc<dyn ChatBackend>, transcript: TranscriptStore) -> Self {
        let (event_tx, event_rx) = bounded(256);
        Self {
            backend,
            transcript,
            phase: Arc::new(Mutex::new(Phase::Idle)),
            active: Arc::new(Mutex::new(None)),
            round_trips: Arc::new(Mutex::new(TimingTracker::new(ROUND_TRIP_WINDOW))),
            event_tx,
            event_rx,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    /// Receiver for controller events; poll with `try_recv`
    pub fn event_receiver(&self) -> Receiver<InteractionEvent> {
        self.event_rx.clone()
    }

    /// Summary of completed round-trip timings
    pub fn round_trip_summary(&self) -> String {
        self.round_trips.lock().summary()
    }

    /// Submit a text message and await the assistant reply.
    ///
    /// At most one generation may be outstanding; a second submission is
    /// rejected with a transient notice rather than queued.
    pub async fn submit_text(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            let err = ParleyError::InvalidInput("empty message".into());
            self.notice(NoticeSeverity::Warning, err.user_message());
            return Err(err);
        }

        self.claim_phase()?;

        self.append_turn(Turn::user(text));

        let request_id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_notify = Arc::new(Notify::new());
        *self.active.lock() = Some(ActiveGeneration {
            request_id,
            cancelled: Arc::clone(&cancelled),
            cancel_notify: Arc::clone(&cancel_notify),
        });
        self.emit(InteractionEvent::GenerationStarted { request_id });
        debug!("Generation {} started", request_id);

        let sw = Stopwatch::start();
        let outcome = tokio::select! {
            reply = self.backend.send_text(text) => Some(reply),
            _ = cancel_notify.notified() => None,
        };

        *self.active.lock() = None;
        let result = match outcome {
            // The reply may have raced an already-issued cancel; the
            // cancelled flag decides whether it is still relevant
            _ if cancelled.load(Ordering::SeqCst) => {
                info!("Generation {} cancelled", request_id);
                self.emit(InteractionEvent::GenerationCancelled { request_id });
                self.notice(NoticeSeverity::Info, "Response generation cancelled");
                Err(ParleyError::UserCancelled)
            }
            Some(Ok(reply)) => {
                let total_ms = sw.elapsed_ms();
                let inference_ms = reply.processing_ms().unwrap_or(total_ms);

                self.append_turn(Turn::assistant(&reply.response).with_inference(inference_ms));
                self.round_trips.lock().record(sw.elapsed());
                self.emit(InteractionEvent::GenerationComplete {
                    request_id,
                    inference_ms,
                    total_ms,
                });
                self.emit(InteractionEvent::LatencyUpdate(LatencyBreakdown {
                    llm_ms: Some(inference_ms),
                    total_ms: Some(total_ms),
                    ..Default::default()
                }));
                Ok(())
            }
            Some(Err(e)) => {
                warn!("Generation {} failed: {}", request_id, e);
                self.notice(NoticeSeverity::Error, e.user_message());
                Err(e)
            }
            None => {
                // The notify fires only after the flag is set, so this arm
                // is unreachable; treat it as cancelled all the same
                self.emit(InteractionEvent::GenerationCancelled { request_id });
                Err(ParleyError::UserCancelled)
            }
        };

        *self.phase.lock() = Phase::Idle;
        result
    }

    /// Cancel the in-flight generation. Idempotent; a no-op when nothing
    /// is outstanding.
    pub fn cancel_generation(&self) {
        let active = self.active.lock();
        if let Some(generation) = active.as_ref() {
            if !generation.cancelled.swap(true, Ordering::SeqCst) {
                debug!("Cancelling generation {}", generation.request_id);
                generation.cancel_notify.notify_one();
            }
        }
    }

    /// Enter the recording phase. Rejected while a generation or another
    /// recording is in progress.
    pub fn begin_recording(&self) -> Result<()> {
        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Idle {
                drop(phase);
                self.notice(NoticeSeverity::Warning, ParleyError::Busy.user_message());
                return Err(ParleyError::Busy);
            }
            *phase = Phase::Recording;
        }
        self.emit(InteractionEvent::RecordingStarted);
        Ok(())
    }

    /// Leave the recording phase; the caller then submits the captured clip
    pub fn end_recording(&self) -> Result<()> {
        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Recording {
                return Err(ParleyError::InvalidInput("not recording".into()));
            }
            *phase = Phase::Idle;
        }
        self.emit(InteractionEvent::RecordingStopped);
        Ok(())
    }

    /// Upload a captured clip for transcription and reply.
    ///
    /// A zero-sample clip is still uploaded as a minimal WAV payload; a
    /// backend error comes back as a notice, never a panic. Returns the
    /// `tts_file` path when the reply carries one.
    pub async fn submit_voice(&self, clip: &AudioClip) -> Result<Option<String>> {
        self.claim_phase()?;

        let result = self.run_voice_exchange(clip).await;

        *self.phase.lock() = Phase::Idle;
        result
    }

    async fn run_voice_exchange(&self, clip: &AudioClip) -> Result<Option<String>> {
        let wav_bytes = clip.to_wav_bytes()?;
        debug!(
            "Uploading voice clip: {} samples, {} bytes",
            clip.samples.len(),
            wav_bytes.len()
        );

        let sw = Stopwatch::start();
        match self.backend.send_voice(wav_bytes).await {
            Ok(reply) if reply.is_success() => {
                let total_ms = sw.elapsed_ms();
                let latency = reply.latency.clone().unwrap_or_default();

                if let Some(transcription) = &reply.transcription {
                    self.append_turn(Turn::user(transcription));
                }
                if let Some(response) = &reply.response {
                    let mut turn = Turn::assistant(response);
                    if let Some(llm_ms) = latency.llm {
                        turn = turn.with_inference(llm_ms);
                    }
                    self.append_turn(turn);
                }

                self.round_trips.lock().record(sw.elapsed());
                let breakdown = if reply.latency.is_some() {
                    LatencyBreakdown {
                        stt_ms: latency.stt,
                        llm_ms: latency.llm,
                        tts_ms: latency.tts,
                        total_ms: Some(total_ms),
                    }
                } else {
                    // No server breakdown; attribute the wall time to STT
                    LatencyBreakdown {
                        stt_ms: Some(total_ms),
                        total_ms: Some(total_ms),
                        ..Default::default()
                    }
                };
                self.emit(InteractionEvent::LatencyUpdate(breakdown));

                if let Some(tts_file) = reply.tts_file.clone() {
                    self.emit(InteractionEvent::PlaybackReady {
                        tts_file: tts_file.clone(),
                    });
                    return Ok(Some(tts_file));
                }
                Ok(None)
            }
            Ok(reply) => {
                let message = reply.error_message();
                warn!("Voice exchange rejected by backend: {}", message);
                self.notice(NoticeSeverity::Error, format!("Error: {}", message));
                Err(ParleyError::NetworkFailure(message))
            }
            Err(e) => {
                warn!("Voice exchange failed: {}", e);
                self.notice(
                    NoticeSeverity::Error,
                    "Failed to send voice message. Please try again.",
                );
                Err(e)
            }
        }
    }

    /// Mark synthesized speech as playing/finished for phase bookkeeping
    pub fn set_playing_audio(&self, playing: bool) {
        let mut phase = self.phase.lock();
        if playing && *phase == Phase::Idle {
            *phase = Phase::PlayingAudio;
        } else if !playing && *phase == Phase::PlayingAudio {
            *phase = Phase::Idle;
        }
    }

    /// Notify the backend that the user stopped the synthesized voice
    pub async fn stop_voice(&self) -> Result<()> {
        match self.backend.stop_voice().await {
            Ok(()) => {
                self.notice(NoticeSeverity::Info, "AI voice output stopped");
                self.set_playing_audio(false);
                Ok(())
            }
            Err(e) => {
                warn!("Voice stop failed: {}", e);
                self.notice(
                    NoticeSeverity::Error,
                    "Failed to stop AI voice. Please try again.",
                );
                Err(e)
            }
        }
    }

    /// Fetch a synthesized speech resource announced by a voice reply
    pub async fn fetch_speech(&self, tts_path: &str) -> Result<Vec<u8>> {
        self.backend.fetch_speech(tts_path).await
    }

    /// Destructively clear the transcript. `confirmed` must reflect an
    /// explicit confirmation gesture from the user.
    pub fn clear_transcript(&self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(ParleyError::InvalidInput(
                "clearing the transcript requires confirmation".into(),
            ));
        }
        self.transcript.clear();
        info!("Transcript cleared");
        self.notice(NoticeSeverity::Info, "Chat history cleared");
        Ok(())
    }

    /// Deterministic serialization of the current transcript snapshot
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export_transcript(&self.transcript.snapshot(), format)
    }

    fn claim_phase(&self) -> Result<()> {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Idle => {
                *phase = Phase::AwaitingResponse;
                Ok(())
            }
            _ => {
                drop(phase);
                self.notice(NoticeSeverity::Warning, ParleyError::Busy.user_message());
                Err(ParleyError::Busy)
            }
        }
    }

    fn append_turn(&self, turn: Turn) {
        self.transcript.append(turn.clone());
        self.emit(InteractionEvent::TurnAppended(turn));
    }

    fn notice(&self, severity: NoticeSeverity, message: impl Into<String>) {
        self.emit(InteractionEvent::Notice {
            severity,
            message: message.into(),
        });
    }

    fn emit(&self, event: InteractionEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("Dropped interaction event: {}", e);
        }
    }
}
