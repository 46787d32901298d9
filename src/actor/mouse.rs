//! Mouse-up monitor.
//!
//! Layout changes are suppressed while the user drags a window around;
//! a left-button release schedules a catch-up layout pass shortly after,
//! unless a window throw owns the transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::actor::{self, reactor};
use crate::common::config::MOUSE_UP_DELAY;
use crate::sys::timer::Debounce;

pub type Sender = actor::Sender<Request>;
type Receiver = actor::Receiver<Request>;

#[derive(Debug)]
pub enum Request {
    LeftMouseUp,
}

pub struct Mouse {
    reactor_tx: reactor::Sender,
    throwing: Arc<AtomicBool>,
    receiver: Receiver,
    deferred: Debounce,
}

impl Mouse {
    pub fn new(reactor_tx: reactor::Sender, throwing: Arc<AtomicBool>) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Mouse {
            reactor_tx,
            throwing,
            receiver,
            deferred: Debounce::new(),
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, request)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_request(request);
        }
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::LeftMouseUp => {
                if self.throwing.load(Ordering::SeqCst) {
                    trace!("mouse up during a throw; not scheduling a layout");
                    return;
                }
                let reactor_tx = self.reactor_tx.clone();
                self.deferred.submit(MOUSE_UP_DELAY, move || {
                    reactor_tx.send(reactor::Event::ApplyLayout);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;

    use super::*;
    use crate::sys::executor::Executor;
    use crate::sys::timer::Timer;

    #[test]
    fn mouse_up_defers_the_layout_pass() {
        Executor::run(async {
            let (reactor_tx, mut reactor_rx) = actor::channel();
            let throwing = Arc::new(AtomicBool::new(false));
            let (mut mouse, _tx) = Mouse::new(reactor_tx, throwing);

            mouse.handle_request(Request::LeftMouseUp);
            assert!(reactor_rx.try_recv().is_err(), "nothing before the delay");

            Timer::sleep(Duration::from_millis(250)).await;
            assert!(matches!(reactor_rx.try_recv().unwrap().1, reactor::Event::ApplyLayout));
        });
    }

    #[test]
    fn repeated_releases_coalesce() {
        Executor::run(async {
            let (reactor_tx, mut reactor_rx) = actor::channel();
            let throwing = Arc::new(AtomicBool::new(false));
            let (mut mouse, _tx) = Mouse::new(reactor_tx, throwing);

            mouse.handle_request(Request::LeftMouseUp);
            Timer::sleep(Duration::from_millis(100)).await;
            mouse.handle_request(Request::LeftMouseUp);
            Timer::sleep(Duration::from_millis(250)).await;

            assert!(reactor_rx.try_recv().is_ok());
            assert!(reactor_rx.try_recv().is_err(), "one layout for both releases");
        });
    }

    #[test]
    fn throws_inhibit_the_mouse_trigger() {
        Executor::run(async {
            let (reactor_tx, mut reactor_rx) = actor::channel();
            let throwing = Arc::new(AtomicBool::new(true));
            let (mut mouse, _tx) = Mouse::new(reactor_tx, throwing);

            mouse.handle_request(Request::LeftMouseUp);
            Timer::sleep(Duration::from_millis(250)).await;
            assert!(reactor_rx.try_recv().is_err());
        });
    }
}
