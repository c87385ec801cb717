//! Small `Copy` values pushed by the audio thread for display.
//!
//! None of these own heap memory, so pushing them into an
//! [`AsyncFifo`](crate::AsyncFifo) never allocates and dropping a rejected
//! one on the audio thread is free.

use serde::{Deserialize, Serialize};

/// Which level measurement a [`MeterReading`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeterKind {
    /// Absolute peak over one processing block.
    Peak,
    /// Root-mean-square over a trailing history window.
    Rms,
}

/// One meter value, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub kind: MeterKind,
    /// Linear magnitude (1.0 = full scale).
    pub value: f32,
}

impl MeterReading {
    #[inline]
    pub fn peak(value: f32) -> Self {
        Self {
            kind: MeterKind::Peak,
            value,
        }
    }

    #[inline]
    pub fn rms(value: f32) -> Self {
        Self {
            kind: MeterKind::Rms,
            value,
        }
    }

    /// Magnitude in dBFS, floored at -120 dB.
    pub fn to_db(&self) -> f32 {
        if self.value <= 1e-6 {
            -120.0
        } else {
            20.0 * self.value.log10()
        }
    }
}

/// Severity of a [`LogMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Allocation-free log record for the audio thread.
///
/// The audio thread must not format strings or touch a logger, so it pushes
/// one of these (static text plus an optional number) into a FIFO. A
/// non-real-time thread drains the FIFO and calls [`emit`](Self::emit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: &'static str,
    pub value: Option<f64>,
}

impl LogMessage {
    #[inline]
    pub const fn new(level: LogLevel, message: &'static str) -> Self {
        Self {
            level,
            message,
            value: None,
        }
    }

    #[inline]
    pub const fn with_value(level: LogLevel, message: &'static str, value: f64) -> Self {
        Self {
            level,
            message,
            value: Some(value),
        }
    }

    /// Forward to `tracing`. Never call this on the audio thread.
    pub fn emit(&self) {
        match (self.level, self.value) {
            (LogLevel::Debug, Some(v)) => tracing::debug!(value = v, "{}", self.message),
            (LogLevel::Debug, None) => tracing::debug!("{}", self.message),
            (LogLevel::Info, Some(v)) => tracing::info!(value = v, "{}", self.message),
            (LogLevel::Info, None) => tracing::info!("{}", self.message),
            (LogLevel::Warn, Some(v)) => tracing::warn!(value = v, "{}", self.message),
            (LogLevel::Warn, None) => tracing::warn!("{}", self.message),
            (LogLevel::Error, Some(v)) => tracing::error!(value = v, "{}", self.message),
            (LogLevel::Error, None) => tracing::error!("{}", self.message),
        }
    }
}
