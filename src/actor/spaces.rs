//! The space manager owns transitions between virtual desktops and the
//! "throw window to space" gesture.
//!
//! Space switches are OS-mediated; all this actor can do is synthesize the
//! keystrokes and then clean up after the transition: suppress animations,
//! flush the target cache, and burst-scan until the compositor's visibility
//! reports settle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument};

use crate::actor::{self, animator, discovery, reactor};
use crate::common::config::SPACE_SWITCH_SUPPRESSION;
use crate::model::window::WindowRecord;
use crate::sys::system::WindowSystem;

pub type Sender = actor::Sender<Request>;
type Receiver = actor::Receiver<Request>;

#[derive(Debug)]
pub enum Request {
    /// The OS reported a space change that we did not initiate.
    SpaceChanged,
    SwitchTo(u8),
    NextSpace,
    PreviousSpace,
    /// Throw the focused window onto another space.
    MoveWindowTo(u8),
}

pub struct SpaceManager {
    system: Arc<dyn WindowSystem>,
    throwing: Arc<AtomicBool>,
    discovery_tx: discovery::Sender,
    reactor_tx: reactor::Sender,
    animator_tx: animator::Sender,
    receiver: Receiver,
}

impl SpaceManager {
    pub fn new(
        system: Arc<dyn WindowSystem>,
        throwing: Arc<AtomicBool>,
        discovery_tx: discovery::Sender,
        reactor_tx: reactor::Sender,
        animator_tx: animator::Sender,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = SpaceManager {
            system,
            throwing,
            discovery_tx,
            reactor_tx,
            animator_tx,
            receiver,
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, request)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_request(request);
        }
    }

    #[instrument(name = "spaces::handle_request", skip(self))]
    pub fn handle_request(&mut self, request: Request) {
        match request {
            Request::SpaceChanged => self.after_transition(),
            Request::SwitchTo(index) => {
                info!(index, "switching space");
                switch_space(SpaceTarget::Index(index));
                self.after_transition();
            }
            Request::NextSpace => {
                switch_space(SpaceTarget::Next);
                self.after_transition();
            }
            Request::PreviousSpace => {
                switch_space(SpaceTarget::Previous);
                self.after_transition();
            }
            Request::MoveWindowTo(index) => self.throw_focused(index),
        }
    }

    fn throw_focused(&mut self, index: u8) {
        let Some(record) = discovery::focused_window(&*self.system) else {
            debug!("no focused window to throw");
            return;
        };
        info!(id = %record.id, index, "throwing window to space");

        self.throwing.store(true, Ordering::SeqCst);
        throw_window(&record, index);
        self.throwing.store(false, Ordering::SeqCst);

        self.after_transition();
    }

    /// The compositor lies about visibility for a while after a switch;
    /// write windows straight into place and rescan until it settles.
    fn after_transition(&mut self) {
        self.animator_tx.send(animator::Request::Suppress(SPACE_SWITCH_SUPPRESSION));
        self.reactor_tx.send(reactor::Event::ResetCache);
        self.discovery_tx.send(discovery::Request::BurstScan);
    }
}

enum SpaceTarget {
    Index(u8),
    Next,
    Previous,
}

#[cfg(target_os = "macos")]
fn switch_space(target: SpaceTarget) {
    match target {
        SpaceTarget::Index(index) => crate::sys::mac::hid::post_space_switch_digit(index),
        SpaceTarget::Next => crate::sys::mac::hid::post_space_switch_arrow(true),
        SpaceTarget::Previous => crate::sys::mac::hid::post_space_switch_arrow(false),
    }
}

#[cfg(not(target_os = "macos"))]
fn switch_space(_target: SpaceTarget) {
    tracing::warn!("space switching is only available on macOS");
}

#[cfg(target_os = "macos")]
fn throw_window(record: &WindowRecord, index: u8) {
    crate::sys::mac::hid::throw_window_to_space(record, index);
}

#[cfg(not(target_os = "macos"))]
fn throw_window(record: &WindowRecord, _index: u8) {
    tracing::warn!(id = %record.id, "window throwing is only available on macOS");
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::testing::FakeSystem;

    struct Harness {
        manager: SpaceManager,
        discovery_rx: actor::Receiver<discovery::Request>,
        reactor_rx: actor::Receiver<reactor::Event>,
        animator_rx: actor::Receiver<animator::Request>,
        throwing: Arc<AtomicBool>,
    }

    fn setup(system: &Arc<FakeSystem>) -> Harness {
        let (discovery_tx, discovery_rx) = actor::channel();
        let (reactor_tx, reactor_rx) = actor::channel();
        let (animator_tx, animator_rx) = actor::channel();
        let throwing = Arc::new(AtomicBool::new(false));
        let sys: Arc<dyn WindowSystem> = system.clone();
        let (manager, _tx) =
            SpaceManager::new(sys, throwing.clone(), discovery_tx, reactor_tx, animator_tx);
        Harness {
            manager,
            discovery_rx,
            reactor_rx,
            animator_rx,
            throwing,
        }
    }

    #[test]
    fn a_space_change_suppresses_flushes_and_bursts() {
        let system = FakeSystem::new();
        let mut h = setup(&system);

        h.manager.handle_request(Request::SpaceChanged);

        assert!(matches!(
            h.animator_rx.try_recv().unwrap().1,
            animator::Request::Suppress(d) if d == SPACE_SWITCH_SUPPRESSION
        ));
        assert!(matches!(h.reactor_rx.try_recv().unwrap().1, reactor::Event::ResetCache));
        assert!(matches!(h.discovery_rx.try_recv().unwrap().1, discovery::Request::BurstScan));
    }

    #[test]
    fn throwing_flags_the_transition_and_cleans_up() {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        let w = system.add_window(1, "doc", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        system.set_focused(Some(w.identity()));
        let mut h = setup(&system);

        h.manager.handle_request(Request::MoveWindowTo(2));

        assert!(!h.throwing.load(Ordering::SeqCst), "flag cleared after the throw");
        assert!(h.animator_rx.try_recv().is_ok());
        assert!(h.reactor_rx.try_recv().is_ok());
        assert!(h.discovery_rx.try_recv().is_ok());
    }

    #[test]
    fn throwing_without_focus_is_a_no_op() {
        let system = FakeSystem::new();
        let mut h = setup(&system);

        h.manager.handle_request(Request::MoveWindowTo(2));

        assert!(h.animator_rx.try_recv().is_err());
        assert!(h.discovery_rx.try_recv().is_err());
    }
}
