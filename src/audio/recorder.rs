//! Microphone capture with explicit device lifecycle.
//!
//! The recorder owns exactly one capture source at a time: `start()` acquires
//! the device, `stop()` finalizes the buffered chunks into an [`AudioClip`]
//! and always releases the device, also on error and on drop. A later
//! `start()` performs a fresh acquisition.

use super::AudioClip;
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Samples of live audio retained for visualization (last ~2 seconds)
const LIVE_WINDOW_SECS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    RequestingPermission,
    Recording,
    Flushing,
}

/// Seam over the physical capture device so the recorder state machine is
/// testable without hardware.
pub trait CaptureSource {
    /// Acquire the device and begin delivering sample chunks on `chunk_tx`.
    /// Chunks must stop arriving once `close` is called.
    fn open(&mut self, chunk_tx: Sender<Vec<f32>>) -> Result<()>;

    /// Release the device. Must be safe to call repeatedly.
    fn close(&mut self);

    fn sample_rate(&self) -> u32;
}

pub struct Recorder {
    source: Box<dyn CaptureSource>,
    state: RecorderState,
    chunk_rx: Option<Receiver<Vec<f32>>>,
    captured: Vec<f32>,
    live_buffer: Arc<Mutex<Vec<f32>>>,
}

impl Recorder {
    pub fn new(source: Box<dyn CaptureSource>) -> Self {
        Self {
            source,
            state: RecorderState::Idle,
            chunk_rx: None,
            captured: Vec::new(),
            live_buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Begin capturing. Rejected while a capture is already in progress.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Idle {
            warn!("Recorder start rejected in state {:?}", self.state);
            return Err(ParleyError::Busy);
        }

        self.state = RecorderState::RequestingPermission;
        let (chunk_tx, chunk_rx) = bounded(1024);

        if let Err(e) = self.source.open(chunk_tx) {
            // Release whatever the source may have claimed before failing
            self.source.close();
            self.state = RecorderState::Idle;
            return Err(e);
        }

        self.captured.clear();
        self.live_buffer.lock().clear();
        self.chunk_rx = Some(chunk_rx);
        self.state = RecorderState::Recording;
        info!("Recording started at {} Hz", self.source.sample_rate());
        Ok(())
    }

    /// Pull delivered chunks into the capture buffer. Call at display cadence
    /// while recording; the live window feeds the visualizer.
    pub fn drain(&mut self) {
        let Some(rx) = &self.chunk_rx else {
            return;
        };

        let window = self.source.sample_rate() as usize * LIVE_WINDOW_SECS;
        while let Ok(chunk) = rx.try_recv() {
            {
                let mut live = self.live_buffer.lock();
                live.extend_from_slice(&chunk);
                let len = live.len();
                if len > window {
                    live.drain(0..len - window);
                }
            }
            self.captured.extend_from_slice(&chunk);
        }
    }

    /// Snapshot of the live visualization window
    pub fn live_samples(&self) -> Vec<f32> {
        self.live_buffer.lock().clone()
    }

    /// Finalize the capture into a single clip and release the device.
    ///
    /// A capture stopped immediately still yields a (possibly empty) clip so
    /// the upload path is always attempted.
    pub fn stop(&mut self) -> Result<AudioClip> {
        if self.state != RecorderState::Recording {
            return Err(ParleyError::InvalidInput(format!(
                "Recorder is not recording (state {:?})",
                self.state
            )));
        }

        self.state = RecorderState::Flushing;
        self.source.close();

        // Drain anything that was in flight before the device released
        if let Some(rx) = self.chunk_rx.take() {
            while let Ok(chunk) = rx.try_recv() {
                self.captured.extend_from_slice(&chunk);
            }
        }

        let clip = AudioClip::new(
            std::mem::take(&mut self.captured),
            self.source.sample_rate(),
            1,
        );
        self.live_buffer.lock().clear();
        self.state = RecorderState::Idle;
        debug!(
            "Recording stopped with {} samples ({:.2}s)",
            clip.samples.len(),
            clip.duration_seconds()
        );
        Ok(clip)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.source.close();
    }
}

#[cfg(feature = "audio-io")]
pub use cpal_source::CpalSource;

#[cfg(feature = "audio-io")]
mod cpal_source {
    use super::CaptureSource;
    use crate::{ParleyError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Device, Stream, StreamConfig};
    use crossbeam_channel::Sender;
    use tracing::{debug, error, info};

    /// Default input device capture via cpal, downmixed to mono
    pub struct CpalSource {
        device: Device,
        config: StreamConfig,
        stream: Option<Stream>,
    }

    impl CpalSource {
        pub fn new() -> Result<Self> {
            let host = cpal::default_host();

            let device = host.default_input_device().ok_or_else(|| {
                ParleyError::PermissionDenied("No input device available".into())
            })?;

            info!(
                "Using input device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );

            let config = device
                .default_input_config()
                .map_err(|e| {
                    ParleyError::AudioDeviceError(format!("Failed to get input config: {}", e))
                })?
                .into();

            Ok(Self {
                device,
                config,
                stream: None,
            })
        }
    }

    impl CaptureSource for CpalSource {
        fn open(&mut self, chunk_tx: Sender<Vec<f32>>) -> Result<()> {
            let channels = self.config.channels as usize;

            let err_fn = |err| {
                error!("Audio input stream error: {}", err);
            };

            let stream = self
                .device
                .build_input_stream(
                    &self.config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        // Average all channels to mono
                        let samples = if channels == 1 {
                            data.to_vec()
                        } else {
                            data.chunks(channels)
                                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                                .collect()
                        };

                        if let Err(e) = chunk_tx.try_send(samples) {
                            debug!("Failed to deliver audio chunk: {}", e);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| match e {
                    cpal::BuildStreamError::DeviceNotAvailable => {
                        ParleyError::PermissionDenied("Input device not available".into())
                    }
                    other => {
                        ParleyError::AudioDeviceError(format!("Failed to build input stream: {}", other))
                    }
                })?;

            stream.play().map_err(|e| {
                ParleyError::AudioDeviceError(format!("Failed to start input stream: {}", e))
            })?;

            self.stream = Some(stream);
            Ok(())
        }

        fn close(&mut self) {
            if let Some(stream) = self.stream.take() {
                drop(stream);
                info!("Released capture device");
            }
        }

        fn sample_rate(&self) -> u32 {
            self.config.sample_rate.0
        }
    }
}
