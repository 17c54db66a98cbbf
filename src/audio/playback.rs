//! Synthesized speech playback with a single-concurrent-playback invariant.
//!
//! `play` always stops and releases the current playback before starting the
//! next one. A start that fails because no output route is usable parks the
//! resource for exactly one deferred retry on the next user gesture; the
//! pending slot is cleared whether or not that retry succeeds, so it can
//! never fire for an unrelated later resource.

use crate::{ParleyError, Result};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Ended,
    Stopped,
    Errored,
}

/// A fetched synthesized-speech resource ready for playback
#[derive(Debug, Clone)]
pub struct PlaybackResource {
    pub bytes: Vec<u8>,
    /// Backend path the resource was fetched from, for logging
    pub origin: String,
}

impl PlaybackResource {
    pub fn new(bytes: Vec<u8>, origin: impl Into<String>) -> Self {
        Self {
            bytes,
            origin: origin.into(),
        }
    }
}

/// Seam over the physical audio output so the playback state machine is
/// testable without a device.
pub trait AudioSink {
    /// Begin playing the resource. `PlaybackBlocked` means no output route
    /// was usable; other errors are terminal for this resource.
    fn start(&mut self, resource: &PlaybackResource) -> Result<()>;

    /// Stop and release the current output. Safe to call repeatedly.
    fn stop(&mut self);

    /// Whether the current resource has drained
    fn is_finished(&self) -> bool;
}

pub struct PlaybackController {
    sink: Box<dyn AudioSink>,
    state: PlaybackState,
    pending_retry: Option<PlaybackResource>,
}

impl PlaybackController {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            state: PlaybackState::Idle,
            pending_retry: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    /// Start playing a resource, stopping any current playback first.
    pub fn play(&mut self, resource: PlaybackResource) -> Result<()> {
        // The new resource supersedes both the live playback and any
        // resource parked for a deferred retry
        self.release_current();
        self.pending_retry = None;

        self.state = PlaybackState::Loading;
        debug!("Loading playback resource from {}", resource.origin);

        match self.sink.start(&resource) {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                info!("Playback started: {}", resource.origin);
                Ok(())
            }
            Err(ParleyError::PlaybackBlocked(reason)) => {
                warn!("Playback blocked ({}), deferring to next user gesture", reason);
                self.state = PlaybackState::Idle;
                self.pending_retry = Some(resource);
                Err(ParleyError::PlaybackBlocked(reason))
            }
            Err(e) => {
                self.state = PlaybackState::Errored;
                Err(e)
            }
        }
    }

    /// Retry a playback that was blocked at start, at most once per parked
    /// resource. Returns true when a retry was attempted and succeeded.
    pub fn user_gesture(&mut self) -> Result<bool> {
        let Some(resource) = self.pending_retry.take() else {
            return Ok(false);
        };

        debug!("Retrying deferred playback of {}", resource.origin);
        self.state = PlaybackState::Loading;
        match self.sink.start(&resource) {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                info!("Deferred playback started: {}", resource.origin);
                Ok(true)
            }
            Err(e) => {
                // No second retry regardless of the failure kind
                self.state = PlaybackState::Errored;
                Err(e)
            }
        }
    }

    /// Stop any active playback. Idempotent and safe from any state; returns
    /// whether something was actually stopped so the caller can send the
    /// backend voice-stop signal.
    pub fn stop(&mut self) -> bool {
        let was_live = self.release_current();
        if was_live {
            self.state = PlaybackState::Stopped;
            info!("Playback stopped");
        }
        was_live
    }

    /// Advance the state machine; moves Playing to Ended once the sink drains
    pub fn poll(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Playing && self.sink.is_finished() {
            self.state = PlaybackState::Ended;
            debug!("Playback ended");
        }
        self.state
    }

    fn release_current(&mut self) -> bool {
        let live = matches!(self.state, PlaybackState::Loading | PlaybackState::Playing);
        if live {
            self.sink.stop();
        }
        live
    }
}

#[cfg(feature = "audio-io")]
pub use rodio_sink::RodioSink;

#[cfg(feature = "audio-io")]
mod rodio_sink {
    use super::{AudioSink, PlaybackResource};
    use crate::{ParleyError, Result};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::io::Cursor;

    /// Default output device playback via rodio
    pub struct RodioSink {
        // The stream must outlive the sink; dropping it tears down the route
        stream: Option<(OutputStream, OutputStreamHandle)>,
        sink: Option<Sink>,
    }

    impl RodioSink {
        pub fn new() -> Self {
            Self {
                stream: None,
                sink: None,
            }
        }
    }

    impl Default for RodioSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioSink for RodioSink {
        fn start(&mut self, resource: &PlaybackResource) -> Result<()> {
            if self.stream.is_none() {
                let (stream, handle) = OutputStream::try_default().map_err(|e| {
                    ParleyError::PlaybackBlocked(format!("No usable output route: {}", e))
                })?;
                self.stream = Some((stream, handle));
            }

            let Some((_, handle)) = &self.stream else {
                return Err(ParleyError::PlaybackBlocked("No usable output route".into()));
            };
            let sink = Sink::try_new(handle).map_err(|e| {
                ParleyError::PlaybackBlocked(format!("Failed to open output sink: {}", e))
            })?;

            let source = Decoder::new(Cursor::new(resource.bytes.clone())).map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to decode speech audio: {}", e))
            })?;

            sink.append(source);
            sink.play();
            self.sink = Some(sink);
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }

        fn is_finished(&self) -> bool {
            self.sink.as_ref().map(|s| s.empty()).unwrap_or(true)
        }
    }
}
