//! Loader thread configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the worker treats a backlog of build requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadPolicy {
    /// Build one object per request, in submission order.
    #[default]
    AllRequests,
    /// Discard all but the newest request and build only that one.
    LatestOnly,
}

/// When the worker wakes up to drain its queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WakeMode {
    /// Sleep until `submit`, `retire` or `notify` wakes the worker.
    #[default]
    OnNotify,
    /// Also wake on a fixed interval, even without a notification.
    Poll(Duration),
}

/// Scheduling priority requested for the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerPriority {
    /// Leave the OS default untouched.
    #[default]
    Normal,
    Min,
    Max,
}

/// Configuration for a [`Loader`](crate::Loader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Worker thread name (default: "loader")
    pub name: String,
    /// Capacity of each of the three queues (default: 25)
    pub capacity: usize,
    /// Backlog policy (default: all requests)
    pub policy: LoadPolicy,
    /// Wake strategy (default: on notify)
    pub wake: WakeMode,
    /// Maximum time `stop()` waits for the worker to exit (default: 2s)
    pub shutdown_timeout: Duration,
    /// Worker thread priority (default: OS default)
    pub priority: WorkerPriority,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            name: "loader".to_string(),
            capacity: 25,
            policy: LoadPolicy::AllRequests,
            wake: WakeMode::OnNotify,
            shutdown_timeout: Duration::from_millis(2000),
            priority: WorkerPriority::Normal,
        }
    }
}

impl LoaderConfig {
    /// Create config with a custom thread name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Queue capacity (minimum 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for [`LoadPolicy::LatestOnly`].
    pub fn latest_only(self) -> Self {
        self.with_policy(LoadPolicy::LatestOnly)
    }

    pub fn with_wake(mut self, wake: WakeMode) -> Self {
        self.wake = wake;
        self
    }

    /// Poll every `interval` in addition to explicit wakes.
    pub fn with_poll_interval(self, interval: Duration) -> Self {
        self.with_wake(WakeMode::Poll(interval))
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_priority(mut self, priority: WorkerPriority) -> Self {
        self.priority = priority;
        self
    }
}
