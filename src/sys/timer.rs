use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Timer;

impl Timer {
    pub async fn sleep(duration: Duration) { tokio::time::sleep(duration).await }
}

/// A single replaceable deferred task. Submitting supersedes any pending
/// run; only the most recent submission fires.
#[derive(Default)]
pub struct Debounce {
    task: Option<JoinHandle<()>>,
}

impl Debounce {
    pub fn new() -> Self { Debounce { task: None } }

    /// Run `f` after `delay`, cancelling whatever was pending.
    ///
    /// Must be called from within a `LocalSet` (see [`super::executor`]).
    pub fn submit(&mut self, delay: Duration, f: impl FnOnce() + 'static) {
        self.cancel();
        self.task = Some(tokio::task::spawn_local(async move {
            Timer::sleep(delay).await;
            f();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Debounce {
    fn drop(&mut self) { self.cancel() }
}
