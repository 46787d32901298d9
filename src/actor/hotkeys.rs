//! Routes hotkey actions to the components that handle them.
//!
//! The platform event tap translates key chords into [`Action`] values;
//! this actor is the switchboard. Focus actions are accepted but dropped:
//! focus management belongs to the OS, not the tiler.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::actor::{self, discovery, reactor, spaces};
use crate::layout_engine::Direction;

pub type Sender = actor::Sender<Action>;
type Receiver = actor::Receiver<Action>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    FocusLeft,
    FocusRight,
    FocusUp,
    FocusDown,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Workspace(u8),
    MoveToWorkspace(u8),
    NextWorkspace,
    PreviousWorkspace,
    Reload,
    Quit,
}

/// Default chords, alt-based in the Hyprland tradition. `shift` doubles as
/// the "move" layer.
pub const DEFAULT_BINDINGS: &[(&str, bool, Action)] = &[
    ("h", false, Action::FocusLeft),
    ("l", false, Action::FocusRight),
    ("k", false, Action::FocusUp),
    ("j", false, Action::FocusDown),
    ("h", true, Action::MoveLeft),
    ("l", true, Action::MoveRight),
    ("k", true, Action::MoveUp),
    ("j", true, Action::MoveDown),
    ("1", false, Action::Workspace(1)),
    ("2", false, Action::Workspace(2)),
    ("3", false, Action::Workspace(3)),
    ("4", false, Action::Workspace(4)),
    ("5", false, Action::Workspace(5)),
    ("1", true, Action::MoveToWorkspace(1)),
    ("2", true, Action::MoveToWorkspace(2)),
    ("3", true, Action::MoveToWorkspace(3)),
    ("4", true, Action::MoveToWorkspace(4)),
    ("5", true, Action::MoveToWorkspace(5)),
    ("right", false, Action::NextWorkspace),
    ("left", false, Action::PreviousWorkspace),
    ("r", true, Action::Reload),
    ("q", true, Action::Quit),
];

pub fn action_for(key: &str, shifted: bool) -> Option<Action> {
    DEFAULT_BINDINGS
        .iter()
        .find(|(k, s, _)| *k == key && *s == shifted)
        .map(|(_, _, action)| *action)
}

pub struct HotkeyDispatcher {
    reactor_tx: reactor::Sender,
    spaces_tx: spaces::Sender,
    discovery_tx: discovery::Sender,
    shutdown: CancellationToken,
    receiver: Receiver,
}

impl HotkeyDispatcher {
    pub fn new(
        reactor_tx: reactor::Sender,
        spaces_tx: spaces::Sender,
        discovery_tx: discovery::Sender,
        shutdown: CancellationToken,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = HotkeyDispatcher {
            reactor_tx,
            spaces_tx,
            discovery_tx,
            shutdown,
            receiver,
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, action)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_action(action);
        }
    }

    #[instrument(name = "hotkeys::handle_action", skip(self))]
    pub fn handle_action(&mut self, action: Action) {
        use Action::*;
        match action {
            FocusLeft | FocusRight | FocusUp | FocusDown => {
                debug!("focus is not managed; ignoring");
            }
            MoveLeft => self.reactor_tx.send(reactor::Event::MoveFocused(Direction::Left)),
            MoveRight => self.reactor_tx.send(reactor::Event::MoveFocused(Direction::Right)),
            MoveUp => self.reactor_tx.send(reactor::Event::MoveFocused(Direction::Up)),
            MoveDown => self.reactor_tx.send(reactor::Event::MoveFocused(Direction::Down)),
            Workspace(i) => self.spaces_tx.send(spaces::Request::SwitchTo(i)),
            MoveToWorkspace(i) => self.spaces_tx.send(spaces::Request::MoveWindowTo(i)),
            NextWorkspace => self.spaces_tx.send(spaces::Request::NextSpace),
            PreviousWorkspace => self.spaces_tx.send(spaces::Request::PreviousSpace),
            Reload => {
                info!("reload requested; rescanning");
                self.discovery_tx.send(discovery::Request::ScanNow);
            }
            Quit => {
                info!("quit requested");
                self.shutdown.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_resolve_both_layers() {
        assert_eq!(action_for("h", false), Some(Action::FocusLeft));
        assert_eq!(action_for("h", true), Some(Action::MoveLeft));
        assert_eq!(action_for("3", true), Some(Action::MoveToWorkspace(3)));
        assert_eq!(action_for("x", false), None);
    }

    #[test]
    fn move_actions_reach_the_reactor() {
        let (reactor_tx, mut reactor_rx) = crate::actor::channel();
        let (spaces_tx, mut spaces_rx) = crate::actor::channel();
        let (discovery_tx, mut discovery_rx) = crate::actor::channel();
        let shutdown = CancellationToken::new();
        let (mut dispatcher, _tx) =
            HotkeyDispatcher::new(reactor_tx, spaces_tx, discovery_tx, shutdown.clone());

        dispatcher.handle_action(Action::MoveLeft);
        assert!(matches!(
            reactor_rx.try_recv().unwrap().1,
            reactor::Event::MoveFocused(Direction::Left)
        ));

        dispatcher.handle_action(Action::Workspace(2));
        assert!(matches!(spaces_rx.try_recv().unwrap().1, spaces::Request::SwitchTo(2)));

        dispatcher.handle_action(Action::Reload);
        assert!(matches!(discovery_rx.try_recv().unwrap().1, discovery::Request::ScanNow));

        dispatcher.handle_action(Action::FocusLeft);
        assert!(reactor_rx.try_recv().is_err(), "focus actions are dropped");

        dispatcher.handle_action(Action::Quit);
        assert!(shutdown.is_cancelled());
    }
}
