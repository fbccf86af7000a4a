//! Background task primitives
//!
//! Long-running work (loading an archive, extracting files) runs on tokio's
//! blocking pool. The caller keeps a [`TaskHandle`] with a cancellation
//! token and a watch channel carrying the latest progress value.

use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cooperative cancellation flag shared between a task and its owner
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Result of a task that may stop early on request
#[derive(Debug)]
pub enum TaskOutcome<T> {
    /// The task ran to completion
    Completed(T),
    /// The task observed its cancellation token and stopped
    Cancelled,
}

impl<T> TaskOutcome<T> {
    /// The completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    /// Whether the task was cancelled
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Item-level progress of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Items handled so far, including skipped and failed ones
    pub completed: usize,
    /// Items in the batch
    pub total: usize,
}

impl Progress {
    /// Completion in percent, 100 for an empty batch
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = self.completed.min(self.total) * 100 / self.total;
        u8::try_from(percent).unwrap_or(100)
    }
}

/// Handle to a task running on the blocking pool
#[derive(Debug)]
pub struct TaskHandle<T, P> {
    token: CancellationToken,
    progress: watch::Receiver<P>,
    join: JoinHandle<Result<T>>,
}

impl<T, P> TaskHandle<T, P>
where
    T: Send + 'static,
    P: Clone + Send + Sync + 'static,
{
    /// Spawn `work` on the blocking pool
    ///
    /// `work` receives the task's cancellation token and a sender for
    /// progress updates. Must be called from within a tokio runtime.
    pub fn spawn<F>(initial: P, work: F) -> Self
    where
        F: FnOnce(CancellationToken, watch::Sender<P>) -> Result<T> + Send + 'static,
    {
        let token = CancellationToken::new();
        let (sender, progress) = watch::channel(initial);
        let worker_token = token.clone();
        let join = tokio::task::spawn_blocking(move || work(worker_token, sender));
        Self {
            token,
            progress,
            join,
        }
    }

    /// Request cancellation; the task stops at its next check
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The task's cancellation token
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Latest progress value
    pub fn progress(&self) -> P {
        self.progress.borrow().clone()
    }

    /// Receiver for progress updates
    pub fn subscribe(&self) -> watch::Receiver<P> {
        self.progress.clone()
    }

    /// Whether the worker has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task's result
    pub async fn join(self) -> Result<T> {
        self.join.await?
    }
}
