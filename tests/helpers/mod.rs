//! Test helpers and fixtures for handoff integration tests
//!
//! Fixtures are written as WAV files into a temp directory and loaded
//! through the real loader thread, so every test exercises the full
//! editor -> loader -> audio thread path.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact copies of float WAV data
//! - `INT16_EPSILON` (3/32768): Data that went through 16-bit PCM
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use handoff::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// How long tests wait on the loader thread before giving up.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber so `tracing` output shows up on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Create a processor at the test sample rate.
pub fn test_processor() -> Processor {
    test_processor_with(ProcessorConfig::default())
}

pub fn test_processor_with(config: ProcessorConfig) -> Processor {
    Processor::new(config, TEST_SAMPLE_RATE).expect("Failed to create test processor")
}

/// Options for loading `path` through the WAV decoder.
pub fn wav_options(name: &str, path: &Path) -> SoundOptions {
    SoundOptions::new(name, path, std::sync::Arc::new(WavDecoder))
}

/// Run one audio callback and return the rendered channels.
///
/// Output buffers start filled with a marker value so tests can tell that
/// the processor cleared them.
pub fn render(processor: &mut Processor, channels: usize, frames: usize) -> Vec<Vec<f32>> {
    let mut buffers = vec![vec![9.0f32; frames]; channels];
    let mut outputs: Vec<&mut [f32]> = buffers.iter_mut().map(|b| b.as_mut_slice()).collect();
    processor.process(&mut outputs);
    buffers
}

/// Keep running audio callbacks until `done` holds, returning the block in
/// which it first held.
pub fn render_until(
    processor: &mut Processor,
    channels: usize,
    frames: usize,
    done: impl Fn(&Processor) -> bool,
) -> Option<Vec<Vec<f32>>> {
    let start = Instant::now();
    while start.elapsed() < LOAD_TIMEOUT {
        let block = render(processor, channels, frames);
        if done(processor) {
            return Some(block);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    None
}

/// Render until the sound called `name` is playing.
pub fn render_until_playing(
    processor: &mut Processor,
    name: &str,
    channels: usize,
    frames: usize,
) -> Vec<Vec<f32>> {
    render_until(processor, channels, frames, |p| {
        p.current_sound().is_some_and(|s| s.name() == name)
    })
    .unwrap_or_else(|| panic!("Sound '{}' was never adopted", name))
}

/// Poll `condition` until it holds or [`LOAD_TIMEOUT`] passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < LOAD_TIMEOUT {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

// =============================================================================
// Deterministic Signal Generators
// =============================================================================

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Staircase in [0, 1): sample `i` is `i / num_samples`.
///
/// Every sample is distinct, so a copied block reveals exactly which frames
/// were read.
pub fn generate_staircase(num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| i as f32 / num_samples as f32)
        .collect()
}

/// Generate a DC offset signal (constant value).
pub fn generate_dc(value: f32, num_samples: usize) -> Vec<f32> {
    vec![value; num_samples]
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

// =============================================================================
// Assertion Functions
// =============================================================================

/// Assert two signals are equal within tolerance, with detailed error message.
pub fn assert_signals_equal(a: &[f32], b: &[f32], epsilon: f32, context: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", context);
    if let Some((i, (x, y))) = a
        .iter()
        .zip(b)
        .enumerate()
        .find(|(_, (x, y))| (*x - *y).abs() > epsilon)
    {
        panic!(
            "{}: first mismatch at sample {} ({} vs {}, epsilon {})",
            context, i, x, y, epsilon
        );
    }
}

/// Assert signal is silent within threshold.
pub fn assert_is_silent(samples: &[f32], threshold: f32, context: &str) {
    let max = peak(samples);
    assert!(
        max <= threshold,
        "{}: expected silence, but peak amplitude was {}",
        context,
        max
    );
}

// =============================================================================
// WAV Fixtures
// =============================================================================

/// Fixture directory that lives as long as the returned guard.
pub fn fixture_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create fixture dir")
}

/// Save channels to a 32-bit float WAV file and return its path.
pub fn save_wav_file(dir: &Path, name: &str, channels: &[Vec<f32>], sample_rate: u32) -> PathBuf {
    use hound::{WavSpec, WavWriter};

    let path = dir.join(name);
    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(&path, spec).expect("Failed to create WAV");
    let len = channels.iter().map(Vec::len).min().unwrap_or(0);
    for i in 0..len {
        for channel in channels {
            writer.write_sample(channel[i]).expect("Write error");
        }
    }
    writer.finalize().expect("Failed to finalize WAV");
    path
}

/// Save stereo audio to a 16-bit PCM WAV file and return its path.
pub fn save_wav_file_pcm16(
    dir: &Path,
    name: &str,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> PathBuf {
    use hound::{WavSpec, WavWriter};

    let path = dir.join(name);
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec).expect("Failed to create WAV");
    for (l, r) in left.iter().zip(right) {
        // f32 [-1.0, 1.0] to i16
        writer
            .write_sample((l.clamp(-1.0, 1.0) * 32767.0) as i16)
            .expect("Write error");
        writer
            .write_sample((r.clamp(-1.0, 1.0) * 32767.0) as i16)
            .expect("Write error");
    }
    writer.finalize().expect("Failed to finalize WAV");
    path
}
