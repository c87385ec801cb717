//! Processor configuration.

use crate::{Error, Result};
use handoff_loader::{LoadPolicy, LoaderConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Queue sizes and timing for a [`Processor`](crate::Processor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Waveform view refresh rate; sizes the waveform FIFO (default: 60 Hz)
    pub viz_refresh_hz: f64,
    /// Meter FIFO capacity (default: 128)
    pub meter_capacity: usize,
    /// Log FIFO capacity (default: 64)
    pub log_capacity: usize,
    /// RMS history length in seconds (default: 0.3)
    pub rms_window_seconds: f64,
    /// Channels kept in the RMS history (default: 2)
    pub rms_channels: usize,
    /// Peak-hold decay per editor refresh (default: 0.9)
    pub peak_decay: f32,
    /// Sound loader settings (default: capacity 5, latest-only)
    pub loader: LoaderConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            viz_refresh_hz: 60.0,
            meter_capacity: 128,
            log_capacity: 64,
            rms_window_seconds: 0.3,
            rms_channels: 2,
            peak_decay: 0.9,
            loader: LoaderConfig::named("sound-loader")
                .with_capacity(5)
                .with_policy(LoadPolicy::LatestOnly)
                .with_shutdown_timeout(Duration::from_millis(2000)),
        }
    }
}

impl ProcessorConfig {
    pub fn with_viz_refresh_hz(mut self, hz: f64) -> Self {
        self.viz_refresh_hz = hz;
        self
    }

    pub fn with_meter_capacity(mut self, capacity: usize) -> Self {
        self.meter_capacity = capacity;
        self
    }

    pub fn with_rms_window_seconds(mut self, seconds: f64) -> Self {
        self.rms_window_seconds = seconds;
        self
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    /// RMS history length in samples at `sample_rate` (minimum 1).
    pub fn rms_window_samples(&self, sample_rate: f64) -> usize {
        ((self.rms_window_seconds * sample_rate) as usize).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.viz_refresh_hz.is_finite() && self.viz_refresh_hz > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "viz_refresh_hz must be positive, got {}",
                self.viz_refresh_hz
            )));
        }
        if !(self.rms_window_seconds.is_finite() && self.rms_window_seconds > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "rms_window_seconds must be positive, got {}",
                self.rms_window_seconds
            )));
        }
        if self.rms_channels == 0 {
            return Err(Error::InvalidConfig("rms_channels must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.peak_decay) {
            return Err(Error::InvalidConfig(format!(
                "peak_decay must be within 0..=1, got {}",
                self.peak_decay
            )));
        }
        Ok(())
    }
}

/// Check a host-provided sample rate.
pub(crate) fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )))
    }
}
