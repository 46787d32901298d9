//! Per-worker single-threaded executor.
//!
//! Each long-lived worker (main, discovery, animator logic) runs its actors
//! on a current-thread runtime with a `LocalSet`, so actors may hold
//! non-`Send` state and use `spawn_local` for deferred work.

use std::future::Future;

use tokio::runtime::Builder;
use tokio::task::LocalSet;

pub struct Executor;

impl Executor {
    /// Drive `future` to completion on this thread.
    pub fn run<F: Future>(future: F) -> F::Output {
        let rt = Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("failed to build worker runtime");
        let local = LocalSet::new();
        local.block_on(&rt, future)
    }
}
