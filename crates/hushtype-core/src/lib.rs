//! Hushtype core crate - shared error type, configuration, and common types.
//!
//! Everything here is consumed by the audio, transcription, and dictation
//! crates; it carries no behavior of its own beyond config I/O.

pub mod config;
pub mod error;
pub mod types;

pub use config::HushConfig;
pub use error::{HushError, Result};
pub use types::{FocusHandle, LanguageHint, RecordingTimeout};
