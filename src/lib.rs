//! # Handoff - Real-time Safe Thread Handoff
//!
//! Lock-free queues and a background loader for moving data between an
//! audio thread and the threads around it.
//!
//! ## Architecture
//!
//! Handoff is an umbrella crate that coordinates:
//! - **handoff-core** - SPSC [`AsyncFifo`], drain helpers, audio-thread telemetry records
//! - **handoff-loader** - [`Loader`] worker thread, [`LoadableSound`], WAV decoding
//!
//! On top of those it provides a small sound player: [`Processor`] runs on
//! the audio thread and [`EditorHandle`] on a UI thread.
//!
//! ## Quick Start
//!
//! ```ignore
//! use handoff::prelude::*;
//! use std::sync::Arc;
//!
//! let mut processor = Processor::new(ProcessorConfig::default(), 48000.0)?;
//! let mut editor = processor.editor();
//!
//! editor.queue_sound_load(SoundOptions::new("loop", "loop.wav", Arc::new(WavDecoder)));
//!
//! // audio callback
//! processor.process(&mut outputs);
//!
//! // UI timer
//! editor.drain_waveform(|sample| waveform_view.push(sample));
//! let meters = editor.refresh();
//! editor.forward_logs();
//! ```

/// Re-export of handoff-core for direct access
pub use handoff_core as core;

pub use handoff_core::{
    capacity_for_rate, drain_all, drain_keep_last, AsyncFifo, FifoConsumer, FifoProducer,
    LogLevel, LogMessage, MeterKind, MeterReading,
};

/// Re-export of handoff-loader for direct access
pub use handoff_loader as loader;

pub use handoff_loader::{
    Decoder, DecoderRegistry, LoadPolicy, Loadable, LoadableSound, Loader, LoaderConfig,
    LoaderMetricsSnapshot, SampleBlock, SampleBuffer, SoundOptions, WakeMode, WavDecoder,
    WorkerPriority,
};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::ProcessorConfig;

mod editor;
mod processor;

pub use editor::{EditorHandle, MeterSnapshot};
pub use processor::Processor;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{EditorHandle, MeterSnapshot, Processor, ProcessorConfig};

    pub use crate::core::{AsyncFifo, LogLevel, LogMessage, MeterReading};

    pub use crate::loader::{
        Loadable, LoadableSound, Loader, LoaderConfig, SoundOptions, WavDecoder,
    };
}
