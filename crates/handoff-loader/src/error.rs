//! Error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hound error.
    #[error("Hound error: {0}")]
    HoundError(#[from] hound::Error),

    /// Source file does not exist.
    #[error("Sample not found: {0}")]
    SampleNotFound(PathBuf),

    /// No decoder handles this file.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Decoded file has no channels or no frames.
    #[error("Empty audio file: {0}")]
    EmptyFile(PathBuf),

    /// Worker thread could not be spawned.
    #[error("Failed to spawn loader thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Worker thread is already running.
    #[error("Loader '{0}' already started")]
    AlreadyStarted(String),

    /// Worker did not exit within the shutdown timeout.
    #[error("Loader '{name}' did not stop within {timeout:?}")]
    ShutdownTimeout { name: String, timeout: Duration },

    /// Worker thread panicked.
    #[error("Loader '{0}' worker panicked")]
    WorkerPanicked(String),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
