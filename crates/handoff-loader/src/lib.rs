//! Background construction and destruction of heavyweight objects.
//!
//! Decoding a file or freeing a large buffer can take milliseconds, which is
//! far too long for an audio callback. A [`Loader`] moves both jobs onto its
//! own thread and hands finished objects back through lock-free SPSC queues.
//!
//! # Features
//!
//! - **Build requests**: [`Loader::submit`] queues [`Loadable::Options`]
//! - **Backlog policy**: build every request, or only the newest ([`LoadPolicy`])
//! - **Hand-off**: [`Loader::try_take_finished`] / [`Loader::drain_finished`] on the audio thread
//! - **Reclamation**: [`Loader::try_retire`] sends superseded objects back to be dropped
//! - **Metrics**: queue overflow and build counters ([`LoaderMetricsSnapshot`])
//! - **Sounds**: [`LoadableSound`] decoded through a shared [`Decoder`]
//!
//! # Example
//!
//! ```ignore
//! use handoff_loader::{Loader, LoaderConfig, LoadableSound, SoundOptions, WavDecoder};
//! use std::sync::Arc;
//!
//! let loader = Loader::<LoadableSound>::spawn(LoaderConfig::named("sounds").latest_only())?;
//! loader.submit(SoundOptions::new("kick", "kick.wav", Arc::new(WavDecoder)));
//!
//! // later, on the audio thread
//! if let Some(sound) = loader.try_take_finished() {
//!     // play it; retire it when replaced
//! }
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{LoadPolicy, LoaderConfig, WakeMode, WorkerPriority};

mod metrics;
pub use metrics::{LoaderMetrics, LoaderMetricsSnapshot};

mod loader;
pub use loader::{Loadable, Loader};

pub mod decoder;
pub use decoder::{Decoder, DecoderRegistry, SampleBuffer, WavDecoder};

mod sound;
pub use sound::{LoadableSound, SampleBlock, SoundOptions};
