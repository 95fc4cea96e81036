//! RMS loudness computation for level metering.

/// Compute the normalized RMS loudness of a buffer of 16-bit little-endian
/// PCM samples.
///
/// Returns a value in `[0.0, 1.0]` where `0.0` is silence and `1.0` is a
/// buffer at maximum amplitude. A trailing odd byte is ignored; an empty
/// (or single-byte) buffer yields `0.0`.
pub fn rms_level(buffer: &[u8]) -> f32 {
    let sample_count = buffer.len() / 2;
    if sample_count == 0 {
        return 0.0;
    }

    // Sum in f64 to stay exact for the largest buffers cpal delivers.
    let mut sum_squares = 0.0f64;
    for chunk in buffer.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]) as f64;
        sum_squares += sample * sample;
    }

    let rms = (sum_squares / sample_count as f64).sqrt();
    ((rms / i16::MAX as f64) as f32).clamp(0.0, 1.0)
}
