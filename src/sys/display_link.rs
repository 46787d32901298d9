//! Display-refresh tick driver for the animator.
//!
//! On macOS this wraps a CVDisplayLink so ticks land at the display's
//! vertical sync. When the link cannot be created (or off macOS) a plain
//! timer thread at 60 Hz stands in; the animator cannot tell the
//! difference.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const FALLBACK_FRAME: Duration = Duration::from_micros(16_667);

pub struct DisplayDriver {
    running: Arc<AtomicBool>,
    #[cfg(target_os = "macos")]
    link: Option<crate::sys::mac::display_link::LinkHandle>,
}

impl DisplayDriver {
    pub fn new() -> Self {
        DisplayDriver {
            running: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "macos")]
            link: None,
        }
    }

    pub fn is_running(&self) -> bool { self.running.load(Ordering::SeqCst) }

    /// Begin delivering ticks. No-op while already running.
    pub fn start(&mut self, on_frame: Arc<dyn Fn() + Send + Sync>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        #[cfg(target_os = "macos")]
        {
            match crate::sys::mac::display_link::start(on_frame.clone()) {
                Ok(link) => {
                    tracing::debug!("display link started");
                    self.link = Some(link);
                    return;
                }
                Err(err) => tracing::warn!("display link unavailable ({err}); using timer ticks"),
            }
        }

        self.spawn_fallback(on_frame);
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        #[cfg(target_os = "macos")]
        {
            self.link = None;
        }
    }

    fn spawn_fallback(&self, on_frame: Arc<dyn Fn() + Send + Sync>) {
        let running = self.running.clone();
        thread::Builder::new()
            .name("tatami-tick".into())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    on_frame();
                    thread::sleep(FALLBACK_FRAME);
                }
            })
            .expect("failed to spawn tick thread");
    }
}

impl Drop for DisplayDriver {
    fn drop(&mut self) { self.stop() }
}
