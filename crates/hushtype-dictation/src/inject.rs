//! Collaborator seams for text injection and focus tracking.
//!
//! The actual typing mechanism and window focus APIs live outside the
//! core; the orchestrator only sees these traits. Logging no-op
//! implementations keep headless runs working, and the mocks record calls
//! for tests.

use std::sync::Mutex;

use hushtype_core::error::Result;
use hushtype_core::types::FocusHandle;

/// Delivers transcribed text to the active application.
pub trait TextInjector: Send + Sync {
    fn inject(&self, text: &str) -> Result<()>;
}

/// Captures and restores which UI context holds focus.
pub trait FocusTracker: Send + Sync {
    /// Handle for the currently focused context, if one can be determined.
    fn current(&self) -> Option<FocusHandle>;

    /// Return focus to a previously captured context.
    fn restore(&self, handle: FocusHandle);
}

/// Injector that only logs the text. Used when no platform injector is
/// wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInjector;

impl TextInjector for NullInjector {
    fn inject(&self, text: &str) -> Result<()> {
        tracing::info!(text_len = text.len(), "Transcript ready (no injector configured)");
        Ok(())
    }
}

/// Focus tracker that tracks nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFocusTracker;

impl FocusTracker for NoopFocusTracker {
    fn current(&self) -> Option<FocusHandle> {
        None
    }

    fn restore(&self, _handle: FocusHandle) {}
}

/// Test injector that records every injected string.
#[derive(Debug, Default)]
pub struct MockInjector {
    texts: Mutex<Vec<String>>,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything injected so far, in order.
    pub fn injected(&self) -> Vec<String> {
        self.texts.lock().expect("texts mutex poisoned").clone()
    }
}

impl TextInjector for MockInjector {
    fn inject(&self, text: &str) -> Result<()> {
        self.texts
            .lock()
            .expect("texts mutex poisoned")
            .push(text.to_string());
        Ok(())
    }
}

/// Test focus tracker with a fixed current handle, recording restores.
#[derive(Debug)]
pub struct MockFocusTracker {
    handle: FocusHandle,
    restored: Mutex<Vec<FocusHandle>>,
}

impl MockFocusTracker {
    pub fn new(handle: FocusHandle) -> Self {
        Self {
            handle,
            restored: Mutex::new(Vec::new()),
        }
    }

    /// Handles passed to `restore` so far.
    pub fn restored(&self) -> Vec<FocusHandle> {
        self.restored.lock().expect("restored mutex poisoned").clone()
    }
}

impl FocusTracker for MockFocusTracker {
    fn current(&self) -> Option<FocusHandle> {
        Some(self.handle)
    }

    fn restore(&self, handle: FocusHandle) {
        self.restored
            .lock()
            .expect("restored mutex poisoned")
            .push(handle);
    }
}
