//! Editor-thread side of the sound player.

use handoff_core::{AsyncFifo, LogMessage, MeterKind, MeterReading};
use handoff_loader::{LoadableSound, Loader, LoaderMetricsSnapshot, SoundOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Meter values as the editor displays them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    /// Latest block peak
    pub peak: f32,
    /// Decaying peak hold
    pub peak_hold: f32,
    /// Latest RMS over the history window
    pub rms: f32,
}

/// Consumer end of the processor's telemetry FIFOs and producer end of the
/// loader's request queue.
///
/// Obtained from [`Processor::editor`](crate::Processor::editor). Drive
/// it from one thread, typically a UI timer.
pub struct EditorHandle {
    waveform: Arc<AsyncFifo<f32>>,
    meters: Arc<AsyncFifo<MeterReading>>,
    logs: Arc<AsyncFifo<LogMessage>>,
    loader: Arc<Loader<LoadableSound>>,
    peak_decay: f32,
    snapshot: MeterSnapshot,
}

impl EditorHandle {
    pub(crate) fn new(
        waveform: Arc<AsyncFifo<f32>>,
        meters: Arc<AsyncFifo<MeterReading>>,
        logs: Arc<AsyncFifo<LogMessage>>,
        loader: Arc<Loader<LoadableSound>>,
        peak_decay: f32,
    ) -> Self {
        Self {
            waveform,
            meters,
            logs,
            loader,
            peak_decay,
            snapshot: MeterSnapshot::default(),
        }
    }

    /// Ask the loader to decode a sound. Returns `false` if the request
    /// queue is full.
    pub fn queue_sound_load(&self, options: SoundOptions) -> bool {
        debug!(sound = %options.name, path = %options.path.display(), "Queueing sound load");
        self.loader.submit(options)
    }

    /// Hand every pending waveform sample to `callback`, oldest first.
    pub fn drain_waveform(&self, callback: impl FnMut(f32)) -> usize {
        self.waveform.drain_all(callback)
    }

    /// Hand every pending meter reading to `callback` without touching the
    /// peak hold.
    pub fn drain_meters(&self, callback: impl FnMut(MeterReading)) -> usize {
        self.meters.drain_all(callback)
    }

    /// Discard all pending meter readings except the newest and pass that
    /// one to `callback`. Returns `false` if nothing was pending.
    pub fn latest_meter(&self, callback: impl FnOnce(MeterReading)) -> bool {
        self.meters.drain_keep_last(callback)
    }

    /// One display refresh: decay the peak hold, then fold in every pending
    /// meter reading.
    pub fn refresh(&mut self) -> MeterSnapshot {
        let snapshot = &mut self.snapshot;
        snapshot.peak_hold *= self.peak_decay;

        self.meters.drain_all(|reading| match reading.kind {
            MeterKind::Peak => {
                snapshot.peak = reading.value;
                snapshot.peak_hold = snapshot.peak_hold.max(reading.value);
            }
            MeterKind::Rms => snapshot.rms = reading.value,
        });

        self.snapshot
    }

    /// Last values computed by [`refresh`](Self::refresh).
    pub fn meters(&self) -> MeterSnapshot {
        self.snapshot
    }

    /// Emit every pending audio-thread log record through `tracing`.
    pub fn forward_logs(&self) -> usize {
        self.logs.drain_all(|message| message.emit())
    }

    /// Hand every pending audio-thread log record to `callback`.
    pub fn drain_logs(&self, callback: impl FnMut(LogMessage)) -> usize {
        self.logs.drain_all(callback)
    }

    pub fn loader_metrics(&self) -> LoaderMetricsSnapshot {
        self.loader.metrics()
    }

    /// Whether the sound loader thread is still running. Turns `false` once
    /// the owning [`Processor`](crate::Processor) has been dropped.
    pub fn loader_running(&self) -> bool {
        self.loader.is_running()
    }
}
