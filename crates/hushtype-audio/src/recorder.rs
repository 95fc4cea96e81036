//! Single-session WAV recorder.
//!
//! The `Recorder` owns at most one recording session at a time. A session
//! binds the capture stream, a hound WAV writer, and a one-shot timeout
//! task. Explicit stop, cancel, and timeout expiry all funnel through the
//! same release path, serialized by the session mutex, so the device is
//! released and `Completed` is emitted exactly once per session no matter
//! which path wins the race.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use hushtype_core::error::{HushError, Result};

use crate::capture::{BufferSink, CaptureBackend, CaptureStream, SAMPLE_RATE};
use crate::level;

/// Notifications emitted by the recorder.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Normalized RMS loudness of the latest captured buffer, in `[0, 1]`.
    Level(f32),
    /// A recording finished and its WAV file is ready at the given path.
    /// Emitted exactly once per session; never emitted for cancelled
    /// sessions.
    Completed(PathBuf),
}

/// Recorder settings.
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    /// Maximum recording duration before the session auto-stops.
    pub max_duration: Duration,
    /// Directory for temporary WAV files.
    pub temp_dir: PathBuf,
    /// Input device name substring, or "default".
    pub device: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(60),
            temp_dir: std::env::temp_dir(),
            device: "default".to_string(),
        }
    }
}

type SharedWriter = Arc<Mutex<Option<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>>;

struct ActiveSession {
    id: Uuid,
    path: PathBuf,
    writer: SharedWriter,
    /// Dropping the stream stops capture and releases the device.
    stream: Box<dyn CaptureStream>,
    timeout: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

/// Owns the lifecycle of one recording at a time.
///
/// Must be used from within a Tokio runtime; `start` spawns the timeout
/// task.
pub struct Recorder {
    backend: Arc<dyn CaptureBackend>,
    session: Arc<Mutex<Option<ActiveSession>>>,
    events: broadcast::Sender<RecorderEvent>,
    settings: RecorderSettings,
}

impl Recorder {
    pub fn new(backend: Arc<dyn CaptureBackend>, settings: RecorderSettings) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            backend,
            session: Arc::new(Mutex::new(None)),
            events,
            settings,
        }
    }

    /// Subscribe to recorder events (levels and completions).
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events.subscribe()
    }

    /// Whether a recording session is currently active.
    pub fn is_recording(&self) -> bool {
        self.session.lock().expect("session mutex poisoned").is_some()
    }

    /// Start a new recording session.
    ///
    /// Fails with `AlreadyRecording` if a session is active, or
    /// `DeviceUnavailable` if the input device cannot be opened. A start
    /// failure rolls back fully: no file and no open stream remain.
    pub fn start(&self) -> Result<PathBuf> {
        let mut guard = self.session.lock().expect("session mutex poisoned");
        if guard.is_some() {
            return Err(HushError::AlreadyRecording);
        }

        let id = Uuid::new_v4();
        let path = self.settings.temp_dir.join(format!("hushtype-{}.wav", id));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(&path, spec)
            .map_err(|e| HushError::Audio(format!("failed to create WAV file: {}", e)))?;
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer)));

        let cb_writer = Arc::clone(&writer);
        let cb_events = self.events.clone();
        let sink: BufferSink = Box::new(move |bytes: &[u8]| {
            let _ = cb_events.send(RecorderEvent::Level(level::rms_level(bytes)));
            let mut w = cb_writer.lock().expect("writer mutex poisoned");
            if let Some(writer) = w.as_mut() {
                for chunk in bytes.chunks_exact(2) {
                    if let Err(e) = writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]])) {
                        tracing::warn!(error = %e, "Failed to write audio sample");
                        break;
                    }
                }
            }
        });

        let stream = match self.backend.open(&self.settings.device, sink) {
            Ok(s) => s,
            Err(e) => {
                // Full rollback: close the writer and remove the partial file.
                writer.lock().expect("writer mutex poisoned").take();
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };

        let timeout = {
            let session = Arc::clone(&self.session);
            let events = self.events.clone();
            let max = self.settings.max_duration;
            tokio::spawn(async move {
                tokio::time::sleep(max).await;
                tracing::warn!(session_id = %id, "Recording timeout reached, stopping");
                if let Err(e) = Recorder::release(&session, Some(id), &events, false) {
                    tracing::warn!(error = %e, "Timeout stop failed");
                }
            })
        };

        *guard = Some(ActiveSession {
            id,
            path: path.clone(),
            writer,
            stream,
            timeout,
            started_at: Utc::now(),
        });

        tracing::info!(session_id = %id, path = %path.display(), "Recording started");
        Ok(path)
    }

    /// Stop the current session and emit `Completed` with the WAV path.
    ///
    /// Idempotent: a no-op when nothing is recording.
    pub fn stop(&self) -> Result<()> {
        Self::release(&self.session, None, &self.events, false)
    }

    /// Stop the current session and discard its output file.
    ///
    /// No `Completed` event is emitted; file deletion errors are ignored.
    pub fn cancel(&self) {
        if let Err(e) = Self::release(&self.session, None, &self.events, true) {
            tracing::warn!(error = %e, "Cancel cleanup failed");
        }
    }

    /// Release the active session exactly once.
    ///
    /// `expected` ties a timeout task to the session it was armed for, so a
    /// stale timer never tears down a later session. The session is taken
    /// out under the mutex; teardown happens after, so the capture callback
    /// can never observe a half-released session.
    fn release(
        session: &Mutex<Option<ActiveSession>>,
        expected: Option<Uuid>,
        events: &broadcast::Sender<RecorderEvent>,
        discard: bool,
    ) -> Result<()> {
        let taken = {
            let mut guard = session.lock().expect("session mutex poisoned");
            let matches = match (guard.as_ref(), expected) {
                (Some(active), Some(id)) => active.id == id,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if matches {
                guard.take()
            } else {
                None
            }
        };
        let Some(active) = taken else {
            return Ok(());
        };

        active.timeout.abort();
        drop(active.stream);

        let writer = active.writer.lock().expect("writer mutex poisoned").take();
        let finalized = match writer {
            Some(w) => w
                .finalize()
                .map_err(|e| HushError::Audio(format!("failed to finalize WAV file: {}", e))),
            None => Ok(()),
        };

        let elapsed_ms = (Utc::now() - active.started_at).num_milliseconds();

        if discard {
            if let Err(e) = std::fs::remove_file(&active.path) {
                tracing::debug!(error = %e, "Failed to remove cancelled recording");
            }
            tracing::info!(session_id = %active.id, elapsed_ms, "Recording cancelled");
            return Ok(());
        }

        finalized?;
        tracing::info!(
            session_id = %active.id,
            path = %active.path.display(),
            elapsed_ms,
            "Recording completed"
        );
        let _ = events.send(RecorderEvent::Completed(active.path));
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
