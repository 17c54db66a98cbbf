//! End-to-end tests for the interaction controller against a scripted
//! backend, covering the turn lifecycle, cancellation, and exports.

use async_trait::async_trait;
use parking_lot::Mutex;
use parley::backend::{ChatBackend, TextReply, VoiceLatency, VoiceReply};
use parley::interaction::{InteractionController, InteractionEvent, NoticeSeverity, Phase};
use parley::transcript::{ExportFormat, Role, TranscriptStore, Turn};
use parley::{ParleyError, Result};
use parley::audio::AudioClip;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct BackendLog {
    text_calls: usize,
    voice_payload_sizes: Vec<usize>,
    stop_calls: usize,
}

/// Scripted stand-in for the speech backend
struct FakeBackend {
    log: Arc<Mutex<BackendLog>>,
    reply_delay: Duration,
    fail_text: bool,
    voice_status: &'static str,
    tts_file: Option<&'static str>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(BackendLog::default())),
            reply_delay: Duration::ZERO,
            fail_text: false,
            voice_status: "success",
            tts_file: Some("/audio/reply.wav"),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail_text = true;
        self
    }

    fn with_voice_status(mut self, status: &'static str) -> Self {
        self.voice_status = status;
        self
    }

    fn log(&self) -> Arc<Mutex<BackendLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn send_text(&self, message: &str) -> Result<TextReply> {
        self.log.lock().text_calls += 1;
        if !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        }
        if self.fail_text {
            return Err(ParleyError::NetworkFailure("scripted failure".into()));
        }
        let json = format!(
            r#"{{"response": "Echo: {}", "latency": {{"processing": 42}}}}"#,
            message
        );
        Ok(serde_json::from_str(&json).unwrap())
    }

    async fn send_voice(&self, wav_bytes: Vec<u8>) -> Result<VoiceReply> {
        self.log.lock().voice_payload_sizes.push(wav_bytes.len());
        if self.voice_status != "success" {
            return Ok(VoiceReply {
                status: self.voice_status.to_string(),
                transcription: None,
                response: None,
                tts_file: None,
                latency: None,
                error: Some("Failed to process voice message".to_string()),
            });
        }
        Ok(VoiceReply {
            status: "success".to_string(),
            transcription: Some("hello from voice".to_string()),
            response: Some("I heard: hello from voice".to_string()),
            tts_file: self.tts_file.map(str::to_string),
            latency: Some(VoiceLatency {
                stt: Some(300),
                tts: Some(200),
                llm: Some(450),
            }),
            error: None,
        })
    }

    async fn stop_voice(&self) -> Result<()> {
        self.log.lock().stop_calls += 1;
        Ok(())
    }

    async fn fetch_speech(&self, _tts_path: &str) -> Result<Vec<u8>> {
        Ok(vec![0u8; 64])
    }
}

fn controller_with(backend: FakeBackend) -> InteractionController {
    InteractionController::new(Arc::new(backend), TranscriptStore::new())
}

fn collect_notices(controller: &InteractionController) -> Vec<(NoticeSeverity, String)> {
    let rx = controller.event_receiver();
    let mut notices = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let InteractionEvent::Notice { severity, message } = event {
            notices.push((severity, message));
        }
    }
    notices
}

#[tokio::test]
async fn submit_hello_yields_user_and_assistant_turns() {
    let controller = controller_with(FakeBackend::new());

    controller.submit_text("Hello").await.unwrap();

    let turns = controller.transcript().snapshot();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "Hello");
    assert_eq!(turns[1].role, Role::Assistant);
    assert!(!turns[1].content.is_empty());
    assert_eq!(turns[1].inference_ms, Some(42));
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn whitespace_only_input_is_rejected() {
    let controller = controller_with(FakeBackend::new());

    let result = controller.submit_text("   \n\t ").await;
    assert!(matches!(result, Err(ParleyError::InvalidInput(_))));
    assert!(controller.transcript().is_empty());
}

#[tokio::test]
async fn failure_yields_exactly_one_error_notice_and_no_assistant_turn() {
    let controller = controller_with(FakeBackend::new().failing());

    let result = controller.submit_text("Hello").await;
    assert!(matches!(result, Err(ParleyError::NetworkFailure(_))));

    // Exactly one error notice, never an assistant turn alongside it
    let turns = controller.transcript().snapshot();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);

    let errors: Vec<_> = collect_notices(&controller)
        .into_iter()
        .filter(|(severity, _)| *severity == NoticeSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn second_submission_while_awaiting_is_rejected() {
    let backend = FakeBackend::new().with_delay(Duration::from_millis(200));
    let log = backend.log();
    let controller = controller_with(backend);

    let background = controller.clone();
    let handle = tokio::spawn(async move { background.submit_text("first").await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(controller.phase(), Phase::AwaitingResponse);
    let result = controller.submit_text("second").await;
    assert!(matches!(result, Err(ParleyError::Busy)));

    handle.await.unwrap().unwrap();
    // Only the first request ever reached the backend
    assert_eq!(log.lock().text_calls, 1);
}

#[tokio::test]
async fn cancel_prevents_any_later_assistant_turn() {
    let backend = FakeBackend::new().with_delay(Duration::from_millis(100));
    let controller = controller_with(backend);

    let background = controller.clone();
    let handle = tokio::spawn(async move { background.submit_text("slow question").await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    controller.cancel_generation();
    // Idempotent from any state
    controller.cancel_generation();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(ParleyError::UserCancelled)));

    // Even after the backend's reply would have arrived, no assistant
    // turn materializes
    tokio::time::sleep(Duration::from_millis(150)).await;
    let turns = controller.transcript().snapshot();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(controller.phase(), Phase::Idle);

    // Cancellation surfaces as an informational message, not an error
    let notices = collect_notices(&controller);
    assert!(notices
        .iter()
        .any(|(severity, message)| *severity == NoticeSeverity::Info
            && message.contains("cancelled")));
    assert!(!notices
        .iter()
        .any(|(severity, _)| *severity == NoticeSeverity::Error));

    // No latency sample recorded for the cancelled interaction
    assert_eq!(controller.round_trip_summary(), "no completed interactions");
}

#[tokio::test]
async fn cancel_is_a_noop_when_idle() {
    let controller = controller_with(FakeBackend::new());
    controller.cancel_generation();
    assert_eq!(controller.phase(), Phase::Idle);

    // A later submission still works normally
    controller.submit_text("Hello").await.unwrap();
    assert_eq!(controller.transcript().len(), 2);
}

#[tokio::test]
async fn voice_round_trip_appends_transcription_and_response() {
    let controller = controller_with(FakeBackend::new());

    let clip = AudioClip::new(vec![0.1; 1600], 16000, 1);
    let tts_file = controller.submit_voice(&clip).await.unwrap();
    assert_eq!(tts_file.as_deref(), Some("/audio/reply.wav"));

    let turns = controller.transcript().snapshot();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "hello from voice");
    assert_eq!(turns[1].content, "I heard: hello from voice");
    assert_eq!(turns[1].inference_ms, Some(450));

    let rx = controller.event_receiver();
    let mut playback_ready = false;
    while let Ok(event) = rx.try_recv() {
        if let InteractionEvent::PlaybackReady { tts_file } = event {
            assert_eq!(tts_file, "/audio/reply.wav");
            playback_ready = true;
        }
    }
    assert!(playback_ready);

    // The announced resource is fetchable for playback
    let bytes = controller.fetch_speech("/audio/reply.wav").await.unwrap();
    assert_eq!(bytes.len(), 64);
}

#[tokio::test]
async fn empty_clip_is_still_uploaded_and_backend_error_is_a_notice() {
    let backend = FakeBackend::new().with_voice_status("error");
    let log = backend.log();
    let controller = controller_with(backend);

    let clip = AudioClip::new(Vec::new(), 16000, 1);
    let result = controller.submit_voice(&clip).await;
    assert!(result.is_err());

    // The upload happened with a minimal (header-only) WAV payload
    let sizes = log.lock().voice_payload_sizes.clone();
    assert_eq!(sizes.len(), 1);
    assert!(sizes[0] > 0);

    let errors: Vec<_> = collect_notices(&controller)
        .into_iter()
        .filter(|(severity, _)| *severity == NoticeSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn recording_phase_bookkeeping() {
    let controller = controller_with(FakeBackend::new());

    controller.begin_recording().unwrap();
    assert_eq!(controller.phase(), Phase::Recording);

    // Submissions are rejected mid-recording
    assert!(matches!(
        controller.submit_text("Hello").await,
        Err(ParleyError::Busy)
    ));
    assert!(matches!(controller.begin_recording(), Err(ParleyError::Busy)));

    controller.end_recording().unwrap();
    assert_eq!(controller.phase(), Phase::Idle);
    assert!(controller.end_recording().is_err());
}

#[tokio::test]
async fn stop_voice_notifies_backend() {
    let backend = FakeBackend::new();
    let log = backend.log();
    let controller = controller_with(backend);

    controller.set_playing_audio(true);
    assert_eq!(controller.phase(), Phase::PlayingAudio);

    controller.stop_voice().await.unwrap();
    assert_eq!(log.lock().stop_calls, 1);
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn export_round_trip_preserves_turns() {
    let controller = controller_with(FakeBackend::new());
    controller.submit_text("Hello").await.unwrap();
    controller.submit_text("How are you?").await.unwrap();

    let json = controller.export(ExportFormat::Json).unwrap();
    let restored: Vec<Turn> = serde_json::from_str(&json).unwrap();

    let original = controller.transcript().snapshot();
    assert_eq!(restored.len(), original.len());
    for (a, b) in original.iter().zip(restored.iter()) {
        assert_eq!(a.role, b.role);
        assert_eq!(a.content, b.content);
        assert_eq!(a.timestamp, b.timestamp);
    }

    let text = controller.export(ExportFormat::Text).unwrap();
    assert!(text.starts_with("Chat History"));
    assert!(text.contains("You: Hello"));
}

#[tokio::test]
async fn clear_requires_confirmation() {
    let controller = controller_with(FakeBackend::new());
    controller.submit_text("Hello").await.unwrap();

    assert!(controller.clear_transcript(false).is_err());
    assert_eq!(controller.transcript().len(), 2);

    controller.clear_transcript(true).unwrap();
    assert!(controller.transcript().is_empty());
}
