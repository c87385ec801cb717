//! Background loader thread.
//!
//! The loader owns three SPSC queues:
//!
//! ```text
//! control thread --submit()------> [requests] --> worker builds T
//! worker ---------publish--------> [finished] --> audio thread (try_take_finished)
//! audio thread ---try_retire()---> [retired]  --> worker drops T
//! ```
//!
//! Each queue has exactly one producer and one consumer thread for its
//! whole lifetime. The worker is the consumer of `requests` and `retired`
//! and the producer of `finished`; the caller must keep the other side of
//! each queue on a single thread too.

use crate::config::{LoadPolicy, LoaderConfig, WakeMode, WorkerPriority};
use crate::error::{Error, Result};
use crate::metrics::{LoaderMetrics, LoaderMetricsSnapshot};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use handoff_core::{AsyncFifo, AtomicFlag};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;
use tracing::{debug, error, info, warn};

/// Retry interval of the blocking [`Loader::retire`].
const RETIRE_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// A heavyweight object the loader can build from lightweight options.
pub trait Loadable: Send + 'static {
    /// Cheap description of how to build `Self`.
    type Options: Clone + Default + Send + 'static;

    /// Build the object. Runs on the loader thread and may block on I/O.
    ///
    /// Failure should produce an object whose [`is_valid`](Self::is_valid)
    /// returns `false` rather than panicking.
    fn load(options: &Self::Options) -> Self;

    fn is_valid(&self) -> bool {
        true
    }
}

/// State shared between the loader handle and its worker thread.
struct Shared<T: Loadable> {
    requests: AsyncFifo<T::Options>,
    finished: AsyncFifo<Box<T>>,
    retired: AsyncFifo<Box<T>>,
    running: AtomicFlag,
    metrics: LoaderMetrics,
    policy: LoadPolicy,
}

impl<T: Loadable> Shared<T> {
    /// One worker cycle: build pending requests, then destroy retired objects.
    fn load_and_destroy(&self, name: &str) {
        match self.policy {
            LoadPolicy::AllRequests => {
                self.requests.drain_all(|options| self.build(&options, name));
            }
            LoadPolicy::LatestOnly => {
                let mut skipped = 0u64;
                let mut latest = None;
                self.requests.drain_all(|options| {
                    if latest.replace(options).is_some() {
                        skipped += 1;
                    }
                });
                if skipped > 0 {
                    self.metrics.record_collapsed(skipped);
                    debug!(loader = name, skipped, "Collapsed request backlog");
                }
                if let Some(options) = latest {
                    self.build(&options, name);
                }
            }
        }

        let destroyed = self.retired.drain_all(drop);
        if destroyed > 0 {
            self.metrics.record_destroyed(destroyed as u64);
            debug!(loader = name, destroyed, "Destroyed retired objects");
        }
    }

    fn build(&self, options: &T::Options, name: &str) {
        let object = Box::new(T::load(options));
        let valid = object.is_valid();
        self.metrics.record_built(valid);
        if !valid {
            warn!(loader = name, "Built object is invalid");
        }

        if self.finished.try_push(object).is_err() {
            self.metrics.record_finished_dropped();
            warn!(loader = name, "Finished queue full, dropping built object");
        }
    }
}

/// Worker-side ends of the wake and exit channels, held until `start()`.
struct WorkerChannels {
    wake_rx: Receiver<()>,
    exit_tx: Sender<()>,
}

/// Builds `T` values from options on a dedicated thread and destroys
/// retired ones there too, keeping both off the audio thread.
///
/// # Example
///
/// ```ignore
/// let loader = Loader::<LoadableSound>::new(LoaderConfig::named("sounds").latest_only());
/// loader.start()?;
///
/// // control thread
/// loader.submit(SoundOptions::new("kick", "kick.wav", decoder));
///
/// // audio thread, once per block
/// loader.drain_finished(|sound| {
///     if let Some(old) = current.replace(sound) {
///         let _ = loader.try_retire(old);
///     }
/// });
///
/// loader.stop()?;
/// ```
pub struct Loader<T: Loadable> {
    shared: Arc<Shared<T>>,
    wake_tx: Sender<()>,
    exit_rx: Receiver<()>,
    worker: Mutex<Option<WorkerChannels>>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    config: LoaderConfig,
}

impl<T: Loadable> Loader<T> {
    /// Create a loader. The worker does not run until [`start`](Self::start).
    ///
    /// Requests submitted before `start` are queued and handled by the
    /// first worker cycle.
    pub fn new(config: LoaderConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (wake_tx, wake_rx) = bounded(1);
        let (exit_tx, exit_rx) = bounded(1);

        Self {
            shared: Arc::new(Shared {
                requests: AsyncFifo::new(capacity),
                finished: AsyncFifo::new(capacity),
                retired: AsyncFifo::new(capacity),
                running: AtomicFlag::new(false),
                metrics: LoaderMetrics::new(),
                policy: config.policy,
            }),
            wake_tx,
            exit_rx,
            worker: Mutex::new(Some(WorkerChannels { wake_rx, exit_tx })),
            thread_handle: Mutex::new(None),
            config,
        }
    }

    /// Create and start a loader.
    pub fn spawn(config: LoaderConfig) -> Result<Self> {
        let loader = Self::new(config);
        loader.start()?;
        Ok(loader)
    }

    pub fn start(&self) -> Result<()> {
        let Some(channels) = self.worker.lock().take() else {
            return Err(Error::AlreadyStarted(self.config.name.clone()));
        };

        self.shared.running.set(true);

        let shared = Arc::clone(&self.shared);
        let name = self.config.name.clone();
        let wake = self.config.wake;
        let priority = self.config.priority;

        let spawned = thread::Builder::new()
            .name(self.config.name.clone())
            .spawn(move || {
                apply_priority(priority, &name);
                worker_loop(&shared, &channels.wake_rx, wake, &name);
                let _ = channels.exit_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                info!(loader = %self.config.name, policy = ?self.config.policy, "Loader started");
                *self.thread_handle.lock() = Some(handle);
                Ok(())
            }
            Err(source) => {
                self.shared.running.set(false);
                Err(Error::Spawn {
                    name: self.config.name.clone(),
                    source,
                })
            }
        }
    }

    /// Ask the worker to exit and wait up to `shutdown_timeout` for it.
    ///
    /// The worker finishes its current cycle first; it is never interrupted
    /// mid-build. On timeout the thread is left running and
    /// [`Error::ShutdownTimeout`] is returned. Calling `stop` on a loader that
    /// never started, or already stopped, is a no-op.
    pub fn stop(&self) -> Result<()> {
        let mut slot = self.thread_handle.lock();
        let Some(handle) = slot.take() else {
            return Ok(());
        };

        self.shared.running.set(false);
        self.notify();

        let timeout = self.config.shutdown_timeout;
        match self.exit_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                error!(loader = %self.config.name, ?timeout, "Loader did not stop in time");
                *slot = Some(handle);
                return Err(Error::ShutdownTimeout {
                    name: self.config.name.clone(),
                    timeout,
                });
            }
        }

        handle
            .join()
            .map_err(|_| Error::WorkerPanicked(self.config.name.clone()))?;
        info!(loader = %self.config.name, "Loader stopped");
        Ok(())
    }

    /// Whether the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.shared.running.get() && self.thread_handle.lock().is_some()
    }

    /// Wake the worker without queueing anything.
    #[inline]
    pub fn notify(&self) {
        // Full means a wake is already pending.
        let _ = self.wake_tx.try_send(());
    }

    /// Queue a build request. Control thread only.
    ///
    /// Returns `false` if the request queue is full; the request is dropped
    /// and the caller may retry later.
    pub fn submit(&self, options: T::Options) -> bool {
        let accepted = self.shared.requests.push(options);
        if accepted {
            self.shared.metrics.record_submitted();
        } else {
            self.shared.metrics.record_rejected();
        }
        self.notify();
        accepted
    }

    /// Hand an object to the worker for destruction without blocking.
    ///
    /// Never blocks or frees. If the retire queue is full the object is
    /// handed back so the caller never ends up freeing it by accident. The
    /// wake signal may unpark a sleeping worker, which costs one syscall on
    /// the calling thread.
    pub fn try_retire(&self, object: Box<T>) -> std::result::Result<(), Box<T>> {
        match self.shared.retired.try_push(object) {
            Ok(()) => {
                self.shared.metrics.record_retired();
                self.notify();
                Ok(())
            }
            Err(object) => {
                self.shared.metrics.record_retire_rejected();
                self.notify();
                Err(object)
            }
        }
    }

    /// Hand an object to the worker for destruction, waiting for queue space.
    ///
    /// Not real-time safe: sleeps while the retire queue is full. If the
    /// worker is not running the object is dropped on the calling thread.
    pub fn retire(&self, object: Box<T>) {
        let mut object = object;
        loop {
            match self.shared.retired.try_push(object) {
                Ok(()) => {
                    self.shared.metrics.record_retired();
                    self.notify();
                    return;
                }
                Err(rejected) => {
                    if !self.is_running() {
                        debug!(loader = %self.config.name, "Loader not running, dropping retired object in place");
                        return;
                    }
                    object = rejected;
                    self.notify();
                    thread::sleep(RETIRE_RETRY_INTERVAL);
                }
            }
        }
    }

    /// Take one finished object. Real-time safe.
    #[inline]
    pub fn try_take_finished(&self) -> Option<Box<T>> {
        self.shared.finished.pop()
    }

    /// Pass every finished object to `callback`, oldest first. Real-time safe.
    #[inline]
    pub fn drain_finished(&self, callback: impl FnMut(Box<T>)) -> usize {
        self.shared.finished.drain_all(callback)
    }

    /// Get loader metrics.
    pub fn metrics(&self) -> LoaderMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }
}

impl<T: Loadable> Drop for Loader<T> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            // The worker still holds its own Arc to the queues, so detaching
            // leaves it with valid state.
            error!("Detaching loader thread: {}", e);
        }
    }
}

fn apply_priority(priority: WorkerPriority, name: &str) {
    let result = match priority {
        WorkerPriority::Normal => return,
        WorkerPriority::Min => thread_priority::set_current_thread_priority(ThreadPriority::Min),
        WorkerPriority::Max => thread_priority::set_current_thread_priority(ThreadPriority::Max),
    };
    if let Err(e) = result {
        warn!(loader = name, ?priority, "Failed to set thread priority: {:?}", e);
    }
}

/// Loader thread main loop.
fn worker_loop<T: Loadable>(shared: &Shared<T>, wake_rx: &Receiver<()>, wake: WakeMode, name: &str) {
    loop {
        if !shared.running.get() {
            break;
        }

        shared.load_and_destroy(name);

        if !shared.running.get() {
            break;
        }

        let woke = match wake {
            WakeMode::OnNotify => wake_rx.recv().is_ok(),
            WakeMode::Poll(interval) => {
                !matches!(wake_rx.recv_timeout(interval), Err(RecvTimeoutError::Disconnected))
            }
        };
        if !woke {
            break;
        }
    }
    debug!(loader = name, "Loader worker exiting");
}
