//! Audio-thread side of the sound player.
//!
//! [`Processor::process`] is the audio callback body. It adopts sounds
//! finished by the loader, plays the current one in a loop, and publishes
//! waveform samples, peak/RMS meters and log records for the editor. It
//! never blocks, locks or allocates.

use crate::config::{validate_sample_rate, ProcessorConfig};
use crate::editor::EditorHandle;
use crate::Result;
use handoff_core::{capacity_for_rate, AsyncFifo, LogLevel, LogMessage, MeterReading};
use handoff_loader::{LoadableSound, Loader};
use std::sync::Arc;
use tracing::{error, warn};

/// Real-time sound player feeding an editor through SPSC FIFOs.
///
/// Queue roles:
///
/// | FIFO            | producer      | consumer      |
/// |-----------------|---------------|---------------|
/// | waveform        | audio thread  | editor thread |
/// | meters          | audio thread  | editor thread |
/// | logs            | audio thread  | editor thread |
/// | loader requests | editor thread | loader thread |
/// | loader finished | loader thread | audio thread  |
/// | loader retired  | audio thread  | loader thread |
///
/// Retiring a sound wakes the loader. When the worker is parked that wake is
/// a syscall on the audio thread. It never blocks, but it is not free.
pub struct Processor {
    waveform: Arc<AsyncFifo<f32>>,
    meters: Arc<AsyncFifo<MeterReading>>,
    logs: Arc<AsyncFifo<LogMessage>>,
    loader: Arc<Loader<LoadableSound>>,

    loaded: Option<Box<LoadableSound>>,
    /// Superseded sound waiting for room in the retire queue.
    pending_retire: Option<Box<LoadableSound>>,
    position: usize,

    rms_history: Vec<Vec<f32>>,
    rms_position: usize,

    sample_rate: f64,
    config: ProcessorConfig,
}

impl Processor {
    /// Allocate all queues and start the sound loader.
    pub fn new(config: ProcessorConfig, sample_rate: f64) -> Result<Self> {
        config.validate()?;
        validate_sample_rate(sample_rate)?;

        let loader = Loader::spawn(config.loader.clone())?;
        Ok(Self::with_loader(config, sample_rate, loader))
    }

    fn with_loader(config: ProcessorConfig, sample_rate: f64, loader: Loader<LoadableSound>) -> Self {
        Self {
            waveform: Arc::new(AsyncFifo::new(capacity_for_rate(
                sample_rate,
                config.viz_refresh_hz,
            ))),
            meters: Arc::new(AsyncFifo::new(config.meter_capacity)),
            logs: Arc::new(AsyncFifo::new(config.log_capacity)),
            loader: Arc::new(loader),
            loaded: None,
            pending_retire: None,
            position: 0,
            rms_history: vec![vec![0.0; config.rms_window_samples(sample_rate)]; config.rms_channels],
            rms_position: 0,
            sample_rate,
            config,
        }
    }

    /// Handle for the editor thread.
    ///
    /// Only one editor may drain the telemetry FIFOs and submit loads at a
    /// time; hand the handle to a single thread.
    pub fn editor(&self) -> EditorHandle {
        EditorHandle::new(
            Arc::clone(&self.waveform),
            Arc::clone(&self.meters),
            Arc::clone(&self.logs),
            Arc::clone(&self.loader),
            self.config.peak_decay,
        )
    }

    /// Re-size buffers for a new sample rate. Call while audio is stopped.
    ///
    /// The waveform FIFO can only be resized while no editor handle exists;
    /// otherwise it keeps its capacity.
    pub fn prepare(&mut self, sample_rate: f64) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;

        let capacity = capacity_for_rate(sample_rate, self.config.viz_refresh_hz);
        match Arc::get_mut(&mut self.waveform) {
            Some(waveform) => waveform.resize(capacity),
            None => warn!(
                capacity = self.waveform.capacity(),
                "Editor attached, keeping waveform FIFO capacity"
            ),
        }

        let window = self.config.rms_window_samples(sample_rate);
        for channel in &mut self.rms_history {
            channel.clear();
            channel.resize(window, 0.0);
        }
        self.rms_position = 0;
        Ok(())
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Currently playing sound, if any.
    pub fn current_sound(&self) -> Option<&LoadableSound> {
        self.loaded.as_deref()
    }

    /// Play position within the current sound, in frames.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Render one block into `outputs` (one slice per channel).
    ///
    /// Channels past the sound's channel count repeat its first channel.
    pub fn process(&mut self, outputs: &mut [&mut [f32]]) {
        let num_samples = outputs.iter().map(|c| c.len()).min().unwrap_or(0);
        for channel in outputs.iter_mut() {
            channel.fill(0.0);
        }

        self.retry_pending_retire();
        self.adopt_finished();
        self.play(outputs, num_samples);

        let peak = outputs
            .iter()
            .flat_map(|c| c[..num_samples].iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        self.meters.push(MeterReading::peak(peak));

        self.record_rms_history(outputs, num_samples);
        self.meters.push(MeterReading::rms(self.history_rms()));
    }

    fn adopt_finished(&mut self) {
        let loader = Arc::clone(&self.loader);
        loader.drain_finished(|sound| self.adopt(sound));
    }

    /// Make `sound` current and retire the one it replaces.
    ///
    /// A rejected retire is parked in `pending_retire`. If that slot is
    /// taken, the older parked sound is freed here.
    fn adopt(&mut self, sound: Box<LoadableSound>) {
        if !sound.is_valid() {
            self.logs
                .push(LogMessage::new(LogLevel::Warn, "Adopted an invalid sound"));
        }
        self.logs.push(LogMessage::with_value(
            LogLevel::Info,
            "Adopted sound with frames",
            sound.num_samples() as f64,
        ));

        if let Some(old) = self.loaded.replace(sound) {
            if let Err(old) = self.loader.try_retire(old) {
                if let Some(dropped) = self.pending_retire.replace(old) {
                    self.logs.push(LogMessage::new(
                        LogLevel::Error,
                        "Retire queue full, freeing sound on audio thread",
                    ));
                    drop(dropped);
                }
            }
        }
        self.position = 0;
    }

    fn retry_pending_retire(&mut self) {
        if let Some(old) = self.pending_retire.take() {
            if let Err(old) = self.loader.try_retire(old) {
                self.pending_retire = Some(old);
            }
        }
    }

    fn play(&mut self, outputs: &mut [&mut [f32]], num_samples: usize) {
        let Some(sound) = self.loaded.as_deref() else {
            return;
        };
        let total = sound.num_samples();
        if total == 0 || num_samples == 0 {
            return;
        }

        let block = sound.block(self.position, num_samples);
        let read = block.num_samples();
        for (index, output) in outputs.iter_mut().enumerate() {
            let Some(source) = block.channel(index).or_else(|| block.channel(0)) else {
                continue;
            };
            output[..read].copy_from_slice(source);
            if index == 0 {
                for &sample in source {
                    self.waveform.push(sample);
                }
            }
        }

        self.position += num_samples;
        if self.position >= total {
            self.position = 0;
        }
    }

    fn record_rms_history(&mut self, outputs: &[&mut [f32]], num_samples: usize) {
        let window = self.rms_history.first().map_or(0, Vec::len);
        if window == 0 || outputs.is_empty() {
            return;
        }

        let channels = self.rms_history.len().min(outputs.len());
        // Only the newest `window` samples can survive.
        let skip = num_samples.saturating_sub(window);
        let mut pos = (self.rms_position + skip) % window;
        for i in skip..num_samples {
            for (history, output) in self.rms_history.iter_mut().zip(outputs.iter()).take(channels) {
                history[pos] = output[i];
            }
            pos += 1;
            if pos == window {
                pos = 0;
            }
        }
        self.rms_position = pos;
    }

    fn history_rms(&self) -> f32 {
        let Some(history) = self.rms_history.first() else {
            return 0.0;
        };
        if history.is_empty() {
            return 0.0;
        }
        let sum: f32 = history.iter().map(|s| s * s).sum();
        (sum / history.len() as f32).sqrt()
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        if let Err(e) = self.loader.stop() {
            error!("Sound loader shutdown failed: {}", e);
        }
    }
}
