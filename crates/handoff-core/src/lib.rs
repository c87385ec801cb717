//! Lock-free hand-off primitives for real-time audio.
//!
//! # Primary API
//!
//! - [`AsyncFifo`]: bounded single-producer/single-consumer FIFO
//! - [`FifoProducer`] / [`FifoConsumer`]: type-checked halves of a split FIFO
//! - [`drain_all`] / [`drain_keep_last`]: drain helpers shared by every consumer
//! - [`MeterReading`], [`LogMessage`]: telemetry values pushed by the audio thread
//!
//! # Threading contract
//!
//! Every FIFO in this crate is **single producer, single consumer**. Exactly one
//! thread may push and exactly one thread may pop for the lifetime of the FIFO.
//! Pushing from two threads (or popping from two threads) is undefined behavior
//! and is not detected at runtime. Use [`AsyncFifo::split`] when the two sides
//! can own their halves outright; the compiler then enforces the contract.
//!
//! # Example
//!
//! ```
//! use handoff_core::AsyncFifo;
//!
//! let fifo = AsyncFifo::<f32>::new(4);
//! assert!(fifo.push(1.0));
//! assert!(fifo.push(2.0));
//!
//! let mut seen = Vec::new();
//! fifo.drain_all(|v| seen.push(v));
//! assert_eq!(seen, vec![1.0, 2.0]);
//! ```

mod drain;
pub use drain::{drain_all, drain_keep_last};

mod fifo;
pub use fifo::{capacity_for_rate, AsyncFifo, FifoConsumer, FifoProducer};

pub(crate) mod lockfree;
pub use lockfree::AtomicFlag;

pub mod telemetry;
pub use telemetry::{LogLevel, LogMessage, MeterKind, MeterReading};
