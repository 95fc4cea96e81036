//! Application state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for the dictation lifecycle:
//! - Idle -> Recording (trigger pressed)
//! - Recording -> Processing (trigger pressed again, stopping capture)
//! - Processing -> Transcribing (recording file ready)
//! - Transcribing -> Complete (transcript delivered)
//! - Complete -> Idle (display window elapsed)
//! - Recording -> Idle (cancel recording)
//! - any -> Error (failure anywhere)
//! - Error -> Idle (auto-recovery)

use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use hushtype_core::types::FocusHandle;

/// Number of transition records retained for diagnostics.
const TRANSITION_LOG_CAPACITY: usize = 100;

/// Operational state of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Nothing in progress. Ready to record.
    Idle,
    /// Actively capturing audio from the microphone.
    Recording,
    /// Capture stopped; waiting for the recording file to be finalized.
    Processing,
    /// The recording is being transcribed by the remote service.
    Transcribing,
    /// Transcript delivered; shown briefly before returning to idle.
    Complete,
    /// Something failed; shown briefly before auto-recovery to idle.
    Error,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Idle => write!(f, "Idle"),
            AppState::Recording => write!(f, "Recording"),
            AppState::Processing => write!(f, "Processing"),
            AppState::Transcribing => write!(f, "Transcribing"),
            AppState::Complete => write!(f, "Complete"),
            AppState::Error => write!(f, "Error"),
        }
    }
}

impl AppState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &AppState) -> bool {
        matches!(
            (self, target),
            (AppState::Idle, AppState::Recording)
                | (AppState::Recording, AppState::Processing)
                | (AppState::Processing, AppState::Transcribing)
                | (AppState::Transcribing, AppState::Complete)
                | (AppState::Complete, AppState::Idle)
                // Cancel recording
                | (AppState::Recording, AppState::Idle)
                // Failure is reachable from anywhere
                | (_, AppState::Error)
                | (AppState::Error, AppState::Idle)
        )
    }
}

/// One entry in the bounded transition diagnostic log.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub from: AppState,
    pub to: AppState,
    pub accepted: bool,
    pub context: Option<String>,
    pub timestamp: DateTime<Utc>,
}

type StateObserver = Arc<dyn Fn(AppState) + Send + Sync>;

struct ControllerInner {
    state: AppState,
    previous_focus: Option<FocusHandle>,
    log: VecDeque<TransitionRecord>,
}

impl ControllerInner {
    fn record(&mut self, from: AppState, to: AppState, accepted: bool, context: Option<&str>) {
        if self.log.len() == TRANSITION_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(TransitionRecord {
            from,
            to,
            accepted,
            context: context.map(str::to_string),
            timestamp: Utc::now(),
        });
    }
}

/// Thread-safe controller for the application state machine.
///
/// All reads and writes go through a single mutex; transition evaluation
/// and commit happen atomically under it. Observers are notified after the
/// lock is released, so an observer may itself request a transition without
/// deadlocking.
pub struct StateController {
    inner: Mutex<ControllerInner>,
    observers: Mutex<Vec<StateObserver>>,
}

impl Default for StateController {
    fn default() -> Self {
        Self::new()
    }
}

impl StateController {
    /// Create a new controller initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ControllerInner {
                state: AppState::Idle,
                previous_focus: None,
                log: VecDeque::with_capacity(TRANSITION_LOG_CAPACITY),
            }),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> AppState {
        self.inner.lock().expect("state mutex poisoned").state
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns whether the transition was legal and applied. Rejected
    /// transitions are not errors; they are expected when events race
    /// (e.g. a trigger press while transcribing) and leave the state
    /// unchanged.
    pub fn try_transition_to(&self, target: AppState) -> bool {
        let accepted = {
            let mut inner = self.inner.lock().expect("state mutex poisoned");
            let from = inner.state;
            let ok = from.can_transition_to(&target);
            inner.record(from, target, ok, None);
            if ok {
                tracing::debug!("State: {} -> {}", from, target);
                inner.state = target;
            } else {
                tracing::debug!("State transition rejected: {} -> {}", from, target);
            }
            ok
        };
        if accepted {
            self.notify(target);
        }
        accepted
    }

    /// Force the state machine back to `Idle`, clearing the stored focus
    /// handle. Always succeeds and always notifies.
    pub fn reset_to_idle(&self) {
        {
            let mut inner = self.inner.lock().expect("state mutex poisoned");
            let from = inner.state;
            tracing::debug!("State reset to Idle from {}", from);
            inner.record(from, AppState::Idle, true, Some("reset"));
            inner.state = AppState::Idle;
            inner.previous_focus = None;
        }
        self.notify(AppState::Idle);
    }

    /// Store the focus handle captured before the recording UI appeared.
    pub fn set_previous_focus(&self, handle: Option<FocusHandle>) {
        self.inner.lock().expect("state mutex poisoned").previous_focus = handle;
    }

    /// The focus handle captured at recording start, if any.
    pub fn previous_focus(&self) -> Option<FocusHandle> {
        self.inner.lock().expect("state mutex poisoned").previous_focus
    }

    /// Register an observer invoked synchronously after every successful
    /// transition. A panicking observer is logged and does not abort
    /// delivery to the rest.
    pub fn subscribe(&self, observer: impl Fn(AppState) + Send + Sync + 'static) {
        self.observers
            .lock()
            .expect("observer mutex poisoned")
            .push(Arc::new(observer));
    }

    /// Snapshot of the bounded transition log, oldest first.
    pub fn recent_transitions(&self) -> Vec<TransitionRecord> {
        self.inner
            .lock()
            .expect("state mutex poisoned")
            .log
            .iter()
            .cloned()
            .collect()
    }

    fn notify(&self, state: AppState) {
        let observers: Vec<StateObserver> = self
            .observers
            .lock()
            .expect("observer mutex poisoned")
            .clone();
        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(state))).is_err() {
                tracing::warn!(state = %state, "State observer panicked");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
