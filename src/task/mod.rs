//! Deadline and cooperative cancellation for collaborator calls
//!
//! Every external call of a crawl (chapter discovery, page content, markdown)
//! runs through [`TimedTask::run`]. When the deadline passes first, the task
//! is told to stop through its [`TaskContext`] and gets a short grace period
//! to release what it holds before the wrapper gives up on it.

use crate::CollaboratorError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default deadline for one collaborator call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default teardown allowance after cancellation
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Handle given to a running task
///
/// Long-running collaborators should check [`is_cancelled`](Self::is_cancelled)
/// between steps, or race their I/O against [`cancelled`](Self::cancelled).
#[derive(Debug, Clone)]
pub struct TaskContext {
    cancel: watch::Receiver<bool>,
    deadline: Instant,
}

impl TaskContext {
    /// A context that is never cancelled
    pub fn detached() -> Self {
        let (tx, cancel) = watch::channel(false);
        // Dropping the sender leaves the flag at false forever
        drop(tx);
        Self {
            cancel,
            deadline: Instant::now() + Duration::from_secs(365 * 24 * 60 * 60),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation is requested; pends forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Deadline wrapper applied around collaborator calls
#[derive(Debug, Clone, Copy)]
pub struct TimedTask {
    pub timeout: Duration,
    pub grace: Duration,
}

impl Default for TimedTask {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            grace: DEFAULT_GRACE,
        }
    }
}

impl TimedTask {
    pub fn new(timeout: Duration, grace: Duration) -> Self {
        Self { timeout, grace }
    }

    /// Runs `task` under the deadline
    ///
    /// # Arguments
    ///
    /// * `label` - Name used in logs and in the timeout error
    /// * `task` - Builds the future from the context it should observe
    ///
    /// # Returns
    ///
    /// The task's own outcome if it settles first, otherwise
    /// `CollaboratorError::Timeout` once the grace period has been spent
    pub async fn run<T, F, Fut>(&self, label: &str, task: F) -> Result<T, CollaboratorError>
    where
        F: FnOnce(TaskContext) -> Fut,
        Fut: Future<Output = Result<T, CollaboratorError>>,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let deadline = Instant::now() + self.timeout;
        let ctx = TaskContext {
            cancel: cancel_rx,
            deadline,
        };

        let fut = task(ctx);
        tokio::pin!(fut);

        tokio::select! {
            biased;
            result = &mut fut => return result,
            _ = tokio::time::sleep_until(deadline) => {}
        }

        warn!("{} timed out after {:?}, cancelling", label, self.timeout);
        let _ = cancel_tx.send(true);

        match tokio::time::timeout(self.grace, &mut fut).await {
            Ok(_) => debug!("{} released its resources after cancellation", label),
            Err(_) => warn!(
                "{} did not finish tearing down within {:?}",
                label, self.grace
            ),
        }

        Err(CollaboratorError::Timeout {
            task: label.to_string(),
            after: self.timeout,
        })
    }
}
