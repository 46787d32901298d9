//! Routing for the status-item menu.
//!
//! The platform side (the `NSStatusItem` and its menu) only posts events
//! here; this actor owns what the items actually do.

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::actor::{self, discovery, reactor};

pub type Sender = actor::Sender<Event>;
type Receiver = actor::Receiver<Event>;

#[derive(Debug, Clone, Copy)]
pub enum Event {
    ApplyLayout,
    Rescan,
    Quit,
}

pub struct MenuBar {
    reactor_tx: reactor::Sender,
    discovery_tx: discovery::Sender,
    shutdown: CancellationToken,
    receiver: Receiver,
}

impl MenuBar {
    pub fn new(
        reactor_tx: reactor::Sender,
        discovery_tx: discovery::Sender,
        shutdown: CancellationToken,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = MenuBar {
            reactor_tx,
            discovery_tx,
            shutdown,
            receiver,
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, event)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::ApplyLayout => self.reactor_tx.send(reactor::Event::ApplyLayout),
            Event::Rescan => self.discovery_tx.send(discovery::Request::ScanNow),
            Event::Quit => {
                info!("quit selected from the menu");
                self.shutdown.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_items_reach_their_components() {
        let (reactor_tx, mut reactor_rx) = actor::channel();
        let (discovery_tx, mut discovery_rx) = actor::channel();
        let shutdown = CancellationToken::new();
        let (mut menu, _tx) = MenuBar::new(reactor_tx, discovery_tx, shutdown.clone());

        menu.handle_event(Event::ApplyLayout);
        assert!(matches!(reactor_rx.try_recv().unwrap().1, reactor::Event::ApplyLayout));

        menu.handle_event(Event::Rescan);
        assert!(matches!(discovery_rx.try_recv().unwrap().1, discovery::Request::ScanNow));

        menu.handle_event(Event::Quit);
        assert!(shutdown.is_cancelled());
    }
}
