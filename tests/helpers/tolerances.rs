//! Tolerance constants for audio testing.

/// Floating point rounding errors.
/// Float WAV data is copied through untouched, so this is effectively exact.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Meter values computed by summing many squared samples.
pub const METER_EPSILON: f32 = 1e-4;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// 16-bit quantization step size, plus the 32767 vs 32768 scaling mismatch
/// between writing and decoding.
pub const INT16_EPSILON: f32 = 3.0 / 32768.0;
