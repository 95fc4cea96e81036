//! Orchestrator driving the dictation state machine.
//!
//! The only component that calls into the controller, recorder, and
//! transcription client together. Translates trigger and cancel actions
//! into controller-gated calls, pumps recorder events, and performs error
//! recovery: every entry point converts failures into an `Error`
//! transition plus a log line, with `reset_to_idle` as the last resort, so
//! no fault escapes to the delivering thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use hushtype_audio::{Recorder, RecorderEvent};
use hushtype_core::types::LanguageHint;
use hushtype_transcribe::TranscriptionService;

use crate::inject::{FocusTracker, TextInjector};
use crate::state::{AppState, StateController};

/// Delays and deadlines used by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorTimings {
    /// How long `Complete` is displayed before auto-reset.
    pub complete_display: Duration,
    /// How long `Error` is displayed before auto-recovery.
    pub error_display: Duration,
    /// Watchdog bound on `Processing`; a stop that takes longer is forced
    /// to `Error`.
    pub processing_watchdog: Duration,
}

impl Default for OrchestratorTimings {
    fn default() -> Self {
        Self {
            complete_display: Duration::from_secs(2),
            error_display: Duration::from_secs(3),
            processing_watchdog: Duration::from_secs(10),
        }
    }
}

/// Wires external triggers to the controller, recorder, and transcription
/// client. All collaborators are injected at construction.
pub struct Orchestrator<T: TranscriptionService> {
    controller: Arc<StateController>,
    recorder: Arc<Recorder>,
    transcriber: Arc<T>,
    injector: Arc<dyn TextInjector>,
    focus: Arc<dyn FocusTracker>,
    language: LanguageHint,
    timings: OrchestratorTimings,
    /// Bumped whenever a dictation cycle starts or is cancelled, so a
    /// scheduled timer from an earlier cycle never fires into a newer one.
    generation: Arc<AtomicU64>,
    /// Generation value of the most recently started cycle. A completion
    /// event whose cycle no longer matches `generation` was cancelled and
    /// must be discarded, not transcribed.
    cycle: AtomicU64,
}

impl<T: TranscriptionService> Orchestrator<T> {
    pub fn new(
        controller: Arc<StateController>,
        recorder: Arc<Recorder>,
        transcriber: Arc<T>,
        injector: Arc<dyn TextInjector>,
        focus: Arc<dyn FocusTracker>,
        language: LanguageHint,
    ) -> Self {
        Self {
            controller,
            recorder,
            transcriber,
            injector,
            focus,
            language,
            timings: OrchestratorTimings::default(),
            generation: Arc::new(AtomicU64::new(0)),
            cycle: AtomicU64::new(0),
        }
    }

    /// Override the display and watchdog timings.
    pub fn with_timings(mut self, timings: OrchestratorTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn controller(&self) -> &Arc<StateController> {
        &self.controller
    }

    /// Handle the toggle trigger (e.g. the hotkey edge).
    pub async fn handle_trigger(&self) {
        match self.controller.current() {
            AppState::Idle => self.begin_recording().await,
            AppState::Recording => self.finish_recording().await,
            other => {
                tracing::debug!(state = %other, "Trigger ignored");
            }
        }
    }

    /// Handle an explicit cancel action.
    pub async fn handle_cancel(&self) {
        match self.controller.current() {
            AppState::Recording => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.recorder.cancel();
                if !self.controller.try_transition_to(AppState::Idle) {
                    self.controller.reset_to_idle();
                }
                tracing::info!("Recording cancelled by user");
            }
            AppState::Processing | AppState::Transcribing => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.transcriber.cancel();
                self.controller.reset_to_idle();
                tracing::info!("Transcription cancelled by user");
            }
            other => {
                tracing::debug!(state = %other, "Cancel ignored");
            }
        }
    }

    /// Pump recorder events until the channel closes.
    pub async fn run(&self, mut events: broadcast::Receiver<RecorderEvent>) {
        loop {
            match events.recv().await {
                Ok(RecorderEvent::Completed(path)) => {
                    self.handle_recording_completed(path).await;
                }
                // Level events feed the VU meter collaborator, which holds
                // its own subscription.
                Ok(RecorderEvent::Level(_)) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Recorder event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// A finished recording is ready for transcription.
    pub async fn handle_recording_completed(&self, path: PathBuf) {
        if self.generation.load(Ordering::SeqCst) != self.cycle.load(Ordering::SeqCst) {
            // The cycle was cancelled while this completion sat in the
            // channel; its take must not be transcribed.
            tracing::info!(path = %path.display(), "Discarding completion from cancelled cycle");
            let _ = std::fs::remove_file(&path);
            return;
        }

        if !self.controller.try_transition_to(AppState::Transcribing) {
            // A timeout auto-stop delivers the completion while the state
            // is still Recording; step through Processing and retry.
            self.controller.try_transition_to(AppState::Processing);
            if !self.controller.try_transition_to(AppState::Transcribing) {
                let _ = std::fs::remove_file(&path);
                self.fail("transcribing transition rejected");
                return;
            }
        }

        match self.transcriber.transcribe(&path, self.language).await {
            Ok(text) => self.deliver(&text).await,
            Err(e) if e.is_cancelled() => {
                // The cancel action already reset the state machine.
                tracing::info!("Transcription cancelled");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Transcription failed");
                self.fail("transcription failed");
            }
        }
    }

    async fn begin_recording(&self) {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cycle.store(gen, Ordering::SeqCst);
        if !self.controller.try_transition_to(AppState::Recording) {
            return;
        }
        self.controller.set_previous_focus(self.focus.current());
        if let Err(e) = self.recorder.start() {
            tracing::warn!(error = %e, "Failed to start recording");
            self.fail("recording start failed");
        }
    }

    async fn finish_recording(&self) {
        if !self.controller.try_transition_to(AppState::Processing) {
            return;
        }
        // Armed before the stop call; the watchdog guards a stuck stop.
        self.arm_watchdog();
        if let Err(e) = self.recorder.stop() {
            tracing::warn!(error = %e, "Failed to stop recording");
            self.fail("recording stop failed");
        }
    }

    async fn deliver(&self, text: &str) {
        if !self.controller.try_transition_to(AppState::Complete) {
            self.fail("complete transition rejected");
            return;
        }

        let trimmed = text.trim_end_matches(|c| c == '\n' || c == '\r');
        if let Some(handle) = self.controller.previous_focus() {
            self.focus.restore(handle);
        }
        if let Err(e) = self.injector.inject(trimmed) {
            tracing::warn!(error = %e, "Text injection failed");
        }

        self.schedule_reset(AppState::Complete, self.timings.complete_display);
    }

    /// Force the error state and schedule its auto-recovery.
    fn fail(&self, context: &str) {
        tracing::warn!(context, "Entering error state");
        if self.controller.try_transition_to(AppState::Error) {
            self.schedule_reset(AppState::Error, self.timings.error_display);
        } else {
            self.controller.reset_to_idle();
        }
    }

    /// Reset to idle after `delay`, unless the cycle moved on or a new one
    /// started.
    fn schedule_reset(&self, expected: AppState, delay: Duration) {
        let gen = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == gen && controller.current() == expected {
                tracing::debug!(state = %expected, "Display window elapsed, resetting");
                controller.reset_to_idle();
            }
        });
    }

    fn arm_watchdog(&self) {
        let gen = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let controller = Arc::clone(&self.controller);
        let bound = self.timings.processing_watchdog;
        let error_display = self.timings.error_display;
        tokio::spawn(async move {
            tokio::time::sleep(bound).await;
            if generation.load(Ordering::SeqCst) != gen
                || controller.current() != AppState::Processing
            {
                return;
            }
            tracing::warn!("Processing watchdog expired, forcing error state");
            if controller.try_transition_to(AppState::Error) {
                tokio::time::sleep(error_display).await;
                if generation.load(Ordering::SeqCst) == gen
                    && controller.current() == AppState::Error
                {
                    controller.reset_to_idle();
                }
            } else {
                controller.reset_to_idle();
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::{MockFocusTracker, MockInjector};
    use hushtype_audio::{MockCaptureBackend, RecorderSettings};
    use hushtype_core::types::FocusHandle;
    use hushtype_transcribe::{MockOutcome, MockTranscriptionService};

    struct Fixture {
        orchestrator: Orchestrator<MockTranscriptionService>,
        backend: MockCaptureBackend,
        injector: Arc<MockInjector>,
        focus: Arc<MockFocusTracker>,
        _dir: tempfile::TempDir,
    }

    fn fixture(backend: MockCaptureBackend, outcome: MockOutcome) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = RecorderSettings {
            temp_dir: dir.path().to_path_buf(),
            ..RecorderSettings::default()
        };
        let recorder = Arc::new(Recorder::new(Arc::new(backend.clone()), settings));
        let injector = Arc::new(MockInjector::new());
        let focus = Arc::new(MockFocusTracker::new(FocusHandle(99)));
        let orchestrator = Orchestrator::new(
            Arc::new(StateController::new()),
            recorder,
            Arc::new(MockTranscriptionService::new(outcome)),
            Arc::clone(&injector) as Arc<dyn TextInjector>,
            Arc::clone(&focus) as Arc<dyn FocusTracker>,
            LanguageHint::Auto,
        )
        .with_timings(OrchestratorTimings {
            complete_display: Duration::from_millis(40),
            error_display: Duration::from_millis(40),
            processing_watchdog: Duration::from_millis(100),
        });
        Fixture {
            orchestrator,
            backend,
            injector,
            focus,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_trigger_starts_recording_and_captures_focus() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("x".into()));
        f.orchestrator.handle_trigger().await;

        assert_eq!(f.orchestrator.controller().current(), AppState::Recording);
        assert!(f.backend.is_open());
        assert_eq!(
            f.orchestrator.controller().previous_focus(),
            Some(FocusHandle(99))
        );
    }

    #[tokio::test]
    async fn test_trigger_ignored_in_blocking_states() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("x".into()));
        let controller = Arc::clone(f.orchestrator.controller());

        controller.try_transition_to(AppState::Recording);
        controller.try_transition_to(AppState::Processing);
        controller.try_transition_to(AppState::Transcribing);

        f.orchestrator.handle_trigger().await;
        assert_eq!(controller.current(), AppState::Transcribing);

        controller.try_transition_to(AppState::Complete);
        f.orchestrator.handle_trigger().await;
        assert_eq!(controller.current(), AppState::Complete);
    }

    #[tokio::test]
    async fn test_device_failure_forces_error_then_recovers() {
        let f = fixture(MockCaptureBackend::failing(), MockOutcome::Text("x".into()));
        f.orchestrator.handle_trigger().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Error);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
    }

    #[tokio::test]
    async fn test_trailing_line_breaks_trimmed_before_injection() {
        let f = fixture(
            MockCaptureBackend::new(),
            MockOutcome::Text("hello world\r\n\n".into()),
        );
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;

        // Drive completion directly with a real temp file.
        let path = f._dir.path().join("take.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path).await;

        assert_eq!(f.injector.injected(), vec!["hello world"]);
        assert_eq!(f.focus.restored(), vec![FocusHandle(99)]);
        assert_eq!(f.orchestrator.controller().current(), AppState::Complete);
    }

    #[tokio::test]
    async fn test_remote_failure_forces_error() {
        let f = fixture(
            MockCaptureBackend::new(),
            MockOutcome::Remote {
                status: 500,
                body: "boom".into(),
            },
        );
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;

        let path = f._dir.path().join("take.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path).await;

        assert_eq!(f.orchestrator.controller().current(), AppState::Error);
        assert!(f.injector.injected().is_empty());
    }

    #[tokio::test]
    async fn test_watchdog_forces_error_when_processing_stalls() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("x".into()));
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;
        // Completion is never delivered; Processing stalls.
        assert_eq!(f.orchestrator.controller().current(), AppState::Processing);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Error);
    }

    #[tokio::test]
    async fn test_watchdog_does_not_fire_after_progress() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("done".into()));
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;

        let path = f._dir.path().join("take.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Complete);

        // Past the watchdog bound; Complete must not be disturbed into
        // Error (the auto-reset to Idle is expected).
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_while_recording_returns_to_idle() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("x".into()));
        f.orchestrator.handle_trigger().await;
        assert!(f.backend.is_open());

        f.orchestrator.handle_cancel().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
        assert!(!f.backend.is_open());
    }

    #[tokio::test]
    async fn test_cancel_ignored_when_idle() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("x".into()));
        f.orchestrator.handle_cancel().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
    }

    #[tokio::test]
    async fn test_complete_auto_resets() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("ok".into()));
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;

        let path = f._dir.path().join("take.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Complete);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
        // Focus handle was cleared by the reset.
        assert_eq!(f.orchestrator.controller().previous_focus(), None);
    }

    #[tokio::test]
    async fn test_completion_while_recording_steps_through_processing() {
        // A timeout auto-stop delivers the completion without a second
        // trigger, so the state machine is still in Recording.
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("auto stop".into()));
        f.orchestrator.handle_trigger().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Recording);

        let path = f._dir.path().join("take.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path).await;

        assert_eq!(f.orchestrator.controller().current(), AppState::Complete);
        assert_eq!(f.injector.injected(), vec!["auto stop"]);

        let log = f.orchestrator.controller().recent_transitions();
        assert!(log
            .iter()
            .any(|r| r.accepted && r.from == AppState::Recording && r.to == AppState::Processing));
    }

    #[tokio::test]
    async fn test_late_completion_after_cancel_is_discarded() {
        let f = fixture(MockCaptureBackend::new(), MockOutcome::Text("ghost".into()));
        f.orchestrator.handle_trigger().await;
        f.orchestrator.handle_trigger().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Processing);

        f.orchestrator.handle_cancel().await;
        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);

        // The completion was already queued when the cancel landed.
        let path = f._dir.path().join("late.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        f.orchestrator.handle_recording_completed(path.clone()).await;

        assert_eq!(f.orchestrator.controller().current(), AppState::Idle);
        assert!(f.injector.injected().is_empty());
        assert!(!path.exists());
    }
}
