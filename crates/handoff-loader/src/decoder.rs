//! Audio file decoding.
//!
//! The loader treats decoding as a black box: path in, [`SampleBuffer`] out.
//! [`WavDecoder`] covers WAV via `hound`; other formats plug in through the
//! [`Decoder`] trait.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Deinterleaved multi-channel audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Build from per-channel sample vectors.
    ///
    /// Channels are truncated to the shortest one so every channel has the
    /// same length.
    pub fn from_channels(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }
        Self {
            channels,
            sample_rate,
        }
    }

    /// Split interleaved samples into `num_channels` channels.
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(samples: &[f32], num_channels: usize, sample_rate: u32) -> Self {
        if num_channels == 0 {
            return Self {
                channels: Vec::new(),
                sample_rate,
            };
        }

        let frames = samples.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in samples.chunks_exact(num_channels) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self {
            channels,
            sample_rate,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    #[inline]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }
}

/// Turns a file into samples. Shared between threads behind an `Arc`.
pub trait Decoder: Send + Sync {
    /// Whether this decoder handles `path` (usually by extension).
    fn can_decode(&self, path: &Path) -> bool;

    fn decode(&self, path: &Path) -> Result<SampleBuffer>;
}

/// WAV decoder backed by `hound`. Integer PCM is scaled to [-1.0, 1.0).
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl Decoder for WavDecoder {
    fn can_decode(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav") || ext.eq_ignore_ascii_case("wave"))
    }

    fn decode(&self, path: &Path) -> Result<SampleBuffer> {
        if !path.is_file() {
            return Err(Error::SampleNotFound(path.to_path_buf()));
        }

        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 * scale))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        let buffer = SampleBuffer::from_interleaved(&samples, spec.channels as usize, spec.sample_rate);
        if buffer.num_channels() == 0 || buffer.is_empty() {
            return Err(Error::EmptyFile(path.to_path_buf()));
        }
        Ok(buffer)
    }
}

/// Picks the first registered decoder that accepts a path.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in decoders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(WavDecoder);
        registry
    }

    pub fn register(&mut self, decoder: impl Decoder + 'static) {
        self.decoders.push(Box::new(decoder));
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("decoders", &self.decoders.len())
            .finish()
    }
}

impl Decoder for DecoderRegistry {
    fn can_decode(&self, path: &Path) -> bool {
        self.decoders.iter().any(|d| d.can_decode(path))
    }

    fn decode(&self, path: &Path) -> Result<SampleBuffer> {
        self.decoders
            .iter()
            .find(|d| d.can_decode(path))
            .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?
            .decode(path)
    }
}
