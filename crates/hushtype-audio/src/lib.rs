//! Hushtype audio crate - single-session WAV recording with loudness metering.
//!
//! Provides a trait-based seam over the physical input device, a `Recorder`
//! that owns at most one recording session at a time (stop, cancel, and
//! timeout all release the session exactly once), and RMS level computation
//! for VU-style metering. Includes a mock capture backend for testing
//! without real audio hardware.

pub mod capture;
pub mod level;
pub mod recorder;

pub use capture::{BufferSink, CaptureBackend, CaptureStream, MockCaptureBackend, SAMPLE_RATE};
pub use level::rms_level;
pub use recorder::{Recorder, RecorderEvent, RecorderSettings};

#[cfg(target_os = "windows")]
pub use capture::CpalBackend;
