//! Trailing-edge debouncing for interactive text input.
//!
//! Each submission schedules its action after the configured delay and
//! aborts whatever was pending, so only the latest action in a burst runs.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Schedules at most one pending action at a time.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `action` to run after the delay, cancelling any previously
    /// scheduled action that has not fired yet.
    pub fn submit<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action().await;
        });
        if let Some(previous) = self.lock_pending().replace(handle) {
            previous.abort();
        }
    }

    /// Cancels the pending action, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.lock_pending().take() {
            pending.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
