use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Single-slot cancellable timer.
///
/// At most one task is pending: scheduling again aborts the previous timer
/// before arming a new one. Dropping the debouncer aborts the pending task.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    timer: Option<JoinHandle<()>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            timer: None,
        }
    }

    /// Run `task` once `delay` has passed without another `schedule` call.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let rescheduled = self.cancel();
        tracing::debug!(rescheduled, delay = ?self.delay, "debounce armed");
        let delay = self.delay;
        self.timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Abort the pending task, if any. Returns whether one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                let pending = !timer.is_finished();
                timer.abort();
                pending
            }
            None => false,
        }
    }

    /// Abort the pending task and wait until it has stopped running.
    pub async fn cancel_and_wait(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                let pending = !timer.is_finished();
                timer.abort();
                // A cancelled task resolves to a JoinError; either way it is gone.
                let _ = timer.await;
                pending
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
