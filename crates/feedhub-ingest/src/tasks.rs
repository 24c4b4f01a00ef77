//! Supervised fire-and-forget tasks.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::task::TaskTracker;

/// Spawns detached tasks, logs their panics instead of losing them, and lets
/// the owner wait for everything still running.
#[derive(Debug, Clone, Default)]
pub struct TaskGroup {
    tracker: TaskTracker,
}

impl TaskGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task`. A panic inside it is caught at the task boundary and
    /// logged with `label`.
    pub fn spawn<F>(&self, label: String, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(payload) = AssertUnwindSafe(task).catch_unwind().await {
                tracing::error!(
                    task = %label,
                    panic = %panic_message(payload.as_ref()),
                    "tasks: task panicked"
                );
            }
        });
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stops accepting new tasks and waits for the running ones.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
