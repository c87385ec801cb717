//! Decoded sound payload for the loader.

use crate::decoder::{Decoder, SampleBuffer};
use crate::loader::Loadable;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// How to build a [`LoadableSound`].
///
/// `Default` yields options with no decoder, which build an invalid sound.
#[derive(Clone, Default)]
pub struct SoundOptions {
    pub name: String,
    pub path: PathBuf,
    pub decoder: Option<Arc<dyn Decoder>>,
}

impl SoundOptions {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            decoder: Some(decoder),
        }
    }
}

impl fmt::Debug for SoundOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundOptions")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("has_decoder", &self.decoder.is_some())
            .finish()
    }
}

/// A fully decoded sound, built off the audio thread.
///
/// A sound whose file was missing or unreadable is still returned, but
/// [`is_valid`](Self::is_valid) is `false` and it holds no samples.
#[derive(Debug, Clone, Default)]
pub struct LoadableSound {
    name: String,
    buffer: SampleBuffer,
    valid: bool,
}

impl LoadableSound {
    /// Decode the file described by `options`.
    pub fn new(options: &SoundOptions) -> Self {
        let invalid = || Self {
            name: options.name.clone(),
            buffer: SampleBuffer::default(),
            valid: false,
        };

        let Some(decoder) = options.decoder.as_ref() else {
            warn!(sound = %options.name, "No decoder provided");
            return invalid();
        };

        match decoder.decode(&options.path) {
            Ok(buffer) => {
                debug!(
                    sound = %options.name,
                    channels = buffer.num_channels(),
                    samples = buffer.num_samples(),
                    "Decoded sound"
                );
                Self {
                    name: options.name.clone(),
                    buffer,
                    valid: true,
                }
            }
            Err(e) => {
                warn!(sound = %options.name, path = %options.path.display(), "Failed to decode: {}", e);
                invalid()
            }
        }
    }

    /// Wrap already decoded samples.
    pub fn from_buffer(name: impl Into<String>, buffer: SampleBuffer) -> Self {
        let valid = !buffer.is_empty();
        Self {
            name: name.into(),
            buffer,
            valid,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    pub fn num_samples(&self) -> usize {
        self.buffer.num_samples()
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// View of up to `len` frames starting at `start`.
    ///
    /// `start` is clamped to the last frame and `len` to the frames left
    /// after it, so a position past the end still yields one frame. An empty
    /// sound yields an empty block. Never allocates.
    pub fn block(&self, start: usize, len: usize) -> SampleBlock<'_> {
        let total = self.num_samples();
        if total == 0 {
            return SampleBlock {
                buffer: &self.buffer,
                start: 0,
                len: 0,
            };
        }

        let start = start.min(total - 1);
        let len = len.min(total - start);
        SampleBlock {
            buffer: &self.buffer,
            start,
            len,
        }
    }
}

impl Loadable for LoadableSound {
    type Options = SoundOptions;

    fn load(options: &SoundOptions) -> Self {
        Self::new(options)
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Borrowed window into a [`LoadableSound`].
#[derive(Debug, Clone, Copy)]
pub struct SampleBlock<'a> {
    buffer: &'a SampleBuffer,
    start: usize,
    len: usize,
}

impl<'a> SampleBlock<'a> {
    #[inline]
    pub fn num_channels(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.buffer.num_channels()
        }
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frames of one channel, or `None` past the last channel.
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&'a [f32]> {
        if self.len == 0 {
            return None;
        }
        self.buffer
            .channel(index)
            .map(|c| &c[self.start..self.start + self.len])
    }
}
