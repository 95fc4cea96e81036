//! Hushtype dictation crate - state machine and orchestration.
//!
//! Owns the application state machine (`StateController`), the collaborator
//! seams for text injection and focus tracking, and the `Orchestrator` that
//! drives a full dictation cycle: trigger, record, transcribe, inject,
//! reset.

pub mod inject;
pub mod orchestrator;
pub mod state;

pub use inject::{
    FocusTracker, MockFocusTracker, MockInjector, NoopFocusTracker, NullInjector, TextInjector,
};
pub use orchestrator::{Orchestrator, OrchestratorTimings};
pub use state::{AppState, StateController, TransitionRecord};
