//! Capture backend seam over the physical audio input device.
//!
//! A backend opens the device and delivers 16 kHz mono 16-bit little-endian
//! PCM buffers to a sink callback on the device's own thread. Dropping the
//! returned stream handle stops capture. The real backend uses cpal
//! (Windows WASAPI); `MockCaptureBackend` feeds buffers from test code.

use std::sync::{Arc, Mutex};

use hushtype_core::error::{HushError, Result};

/// Target capture format: 16 kHz mono, 16-bit signed little-endian.
pub const SAMPLE_RATE: u32 = 16_000;

/// Callback receiving raw PCM16-LE bytes from the capture thread.
pub type BufferSink = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Backend that can open an input device and stream buffers to a sink.
pub trait CaptureBackend: Send + Sync {
    /// Open the input device and begin delivering buffers to `sink`.
    ///
    /// `device` is a name substring, or "default" for the system default
    /// input. Fails with `DeviceUnavailable` if the device cannot be opened.
    fn open(&self, device: &str, sink: BufferSink) -> Result<Box<dyn CaptureStream>>;
}

/// Live capture stream handle. Dropping it stops capture and releases the
/// device.
pub trait CaptureStream: Send {}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock capture backend for testing without audio hardware.
///
/// Holds the sink of the currently open stream so tests can push PCM
/// buffers through it with `feed`. Dropping the stream detaches the sink,
/// so buffers fed after a stop are discarded.
#[derive(Clone, Default)]
pub struct MockCaptureBackend {
    fail_open: bool,
    sink: Arc<Mutex<Option<BufferSink>>>,
}

impl MockCaptureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `open` always fails with `DeviceUnavailable`.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            sink: Arc::new(Mutex::new(None)),
        }
    }

    /// Push a PCM buffer into the open stream's sink.
    ///
    /// Returns `false` if no stream is open.
    pub fn feed(&self, bytes: &[u8]) -> bool {
        let mut slot = self.sink.lock().expect("sink mutex poisoned");
        match slot.as_mut() {
            Some(sink) => {
                sink(bytes);
                true
            }
            None => false,
        }
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.sink.lock().expect("sink mutex poisoned").is_some()
    }
}

impl CaptureBackend for MockCaptureBackend {
    fn open(&self, _device: &str, sink: BufferSink) -> Result<Box<dyn CaptureStream>> {
        if self.fail_open {
            return Err(HushError::DeviceUnavailable(
                "mock device unavailable".to_string(),
            ));
        }
        let mut slot = self.sink.lock().expect("sink mutex poisoned");
        if slot.is_some() {
            return Err(HushError::Audio("mock stream already open".to_string()));
        }
        *slot = Some(sink);
        Ok(Box::new(MockStream {
            sink: Arc::clone(&self.sink),
        }))
    }
}

struct MockStream {
    sink: Arc<Mutex<Option<BufferSink>>>,
}

impl CaptureStream for MockStream {}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.sink.lock().expect("sink mutex poisoned").take();
    }
}

// =============================================================================
// Real backend (cpal / WASAPI)
// =============================================================================

/// Wrapper to make `cpal::Stream` usable as a `Send` stream handle.
///
/// `cpal::Stream` on Windows contains a `*mut ()` marker that prevents auto
/// `Send`. The handle is only ever stored to keep the stream alive and
/// dropped to stop capture.
#[cfg(target_os = "windows")]
struct SendStream(#[allow(dead_code)] cpal::Stream);

// SAFETY: SendStream wraps a cpal::Stream which manages its own audio thread.
// 1. The Stream handle is only used to keep capture alive, not to share data
// 2. Audio callbacks run on a separate OS thread managed by cpal
// 3. No mutable shared state between the Stream handle and callbacks
// 4. This is Windows-only; cpal's WASAPI backend is documented as thread-safe
#[cfg(target_os = "windows")]
unsafe impl Send for SendStream {}

#[cfg(target_os = "windows")]
impl CaptureStream for SendStream {}

/// Real capture backend using cpal's WASAPI host.
///
/// Opens the device at its preferred config and downmixes/resamples in the
/// callback to the fixed 16 kHz mono 16-bit target before delivering bytes
/// to the sink.
#[cfg(target_os = "windows")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalBackend;

#[cfg(target_os = "windows")]
impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl CaptureBackend for CpalBackend {
    fn open(&self, device: &str, mut sink: BufferSink) -> Result<Box<dyn CaptureStream>> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use tracing::{debug, info};

        let host = cpal::default_host();

        let selected = if device == "default" {
            host.default_input_device().ok_or_else(|| {
                HushError::DeviceUnavailable("no default input device found".to_string())
            })?
        } else {
            let name_lower = device.to_lowercase();
            host.input_devices()
                .map_err(|e| {
                    HushError::DeviceUnavailable(format!("failed to enumerate devices: {}", e))
                })?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&name_lower))
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    HushError::DeviceUnavailable(format!("audio device '{}' not found", device))
                })?
        };

        let device_name = selected.name().unwrap_or_else(|_| "unknown".to_string());
        debug!(device = %device_name, "Selected audio input device");

        // Query the device's preferred config instead of forcing our own.
        // Many devices don't support arbitrary sample rates / channel counts.
        let stream_config = match selected.default_input_config() {
            Ok(supported) => cpal::StreamConfig {
                channels: supported.channels(),
                sample_rate: supported.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            },
            Err(e) => {
                debug!(error = %e, "Could not query default config, requesting target format");
                cpal::StreamConfig {
                    channels: 1,
                    sample_rate: cpal::SampleRate(SAMPLE_RATE),
                    buffer_size: cpal::BufferSize::Default,
                }
            }
        };

        let device_rate = stream_config.sample_rate.0;
        let device_channels = stream_config.channels;

        let stream = selected
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Step 1: Downmix to mono (average all channels).
                    let mono: Vec<f32> = if device_channels > 1 {
                        let ch = device_channels as usize;
                        data.chunks_exact(ch)
                            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
                            .collect()
                    } else {
                        data.to_vec()
                    };

                    // Step 2: Resample to 16 kHz via linear interpolation.
                    let resampled = if device_rate != SAMPLE_RATE {
                        let ratio = device_rate as f64 / SAMPLE_RATE as f64;
                        let out_len = (mono.len() as f64 / ratio).ceil() as usize;
                        let mut out = Vec::with_capacity(out_len);
                        for i in 0..out_len {
                            let src = i as f64 * ratio;
                            let idx0 = src.floor() as usize;
                            let idx1 = (idx0 + 1).min(mono.len().saturating_sub(1));
                            let frac = (src - idx0 as f64) as f32;
                            out.push(mono[idx0] * (1.0 - frac) + mono[idx1] * frac);
                        }
                        out
                    } else {
                        mono
                    };

                    // Step 3: Quantize to PCM16-LE bytes.
                    let mut bytes = Vec::with_capacity(resampled.len() * 2);
                    for sample in &resampled {
                        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                        bytes.extend_from_slice(&quantized.to_le_bytes());
                    }

                    sink(&bytes);
                },
                move |err| {
                    tracing::error!(error = %err, "Audio stream error");
                },
                None, // No timeout.
            )
            .map_err(|e| {
                HushError::DeviceUnavailable(format!("failed to build audio stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            HushError::DeviceUnavailable(format!("failed to start audio stream: {}", e))
        })?;

        info!(
            device = %device_name,
            device_rate,
            device_channels,
            target_rate = SAMPLE_RATE,
            "Audio capture started"
        );

        Ok(Box::new(SendStream(stream)))
    }
}

// =============================================================================
// Tests
// =============================================================================
