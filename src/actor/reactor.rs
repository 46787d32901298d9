//! The reactor keeps the model coherent with what discovery reports and
//! tells the animator where windows belong.
//!
//! It owns the managed list, the zombie tombstones, and the target-frame
//! cache; every mutation of those happens on the main worker, driven by
//! events from discovery and the collaborators.

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, instrument, trace};

use crate::actor::{self, animator, discovery};
use crate::common::collections::HashMap;
use crate::common::config::{
    APPLY_LAYOUT_DEBOUNCE, MOVEMENT_DEAD_ZONE, NEW_WINDOW_SETTLE, Settings, ZOMBIE_TTL,
};
use crate::layout_engine::{Direction, master_stack};
use crate::model::window::{WindowId, WindowRecord};
use crate::model::ManagedList;
use crate::sys::geometry::Rect;
use crate::sys::system::WindowSystem;
use crate::sys::timer::Debounce;

pub type Sender = actor::Sender<Event>;
type Receiver = actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    /// A fresh discovery snapshot.
    Snapshot(Vec<WindowRecord>),
    /// Recompute and dispatch the layout now.
    ApplyLayout,
    /// Recompute after the coalescing window; used by rapid-fire external
    /// triggers such as the move/resize observers.
    ApplyLayoutDebounced,
    /// Reorder the focused window.
    MoveFocused(Direction),
    /// Move a window to the master slot.
    PromoteToMaster(WindowId),
    /// Drop every cached target so the next pass rewrites all windows.
    ResetCache,
}

pub struct Reactor {
    system: Arc<dyn WindowSystem>,
    settings: Settings,
    animator_tx: animator::Sender,
    sender: Sender,
    receiver: Receiver,
    managed: ManagedList,
    targets: HashMap<WindowId, Rect>,
    /// Set by the space manager while a window throw is in flight.
    throwing: Arc<AtomicBool>,
    settle: Debounce,
    debounce: Debounce,
}

impl Reactor {
    pub fn new(
        system: Arc<dyn WindowSystem>,
        settings: Settings,
        animator_tx: animator::Sender,
        throwing: Arc<AtomicBool>,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Reactor {
            system,
            settings,
            animator_tx,
            sender: sender.clone(),
            receiver,
            managed: ManagedList::new(),
            targets: HashMap::default(),
            throwing,
            settle: Debounce::new(),
            debounce: Debounce::new(),
        };
        (this, sender)
    }

    pub async fn run(mut self) {
        while let Some((span, event)) = self.receiver.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self))]
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Snapshot(snapshot) => self.update(snapshot),
            Event::ApplyLayout => self.apply_layout(),
            Event::ApplyLayoutDebounced => {
                let sender = self.sender.clone();
                self.debounce.submit(APPLY_LAYOUT_DEBOUNCE, move || {
                    sender.send(Event::ApplyLayout);
                });
            }
            Event::MoveFocused(direction) => self.move_focused(direction),
            Event::PromoteToMaster(id) => {
                if self.managed.promote(id) {
                    self.apply_layout();
                }
            }
            Event::ResetCache => {
                debug!("clearing target frame cache");
                self.targets.clear();
            }
        }
    }

    fn update(&mut self, snapshot: Vec<WindowRecord>) {
        self.update_at(Instant::now(), snapshot)
    }

    fn update_at(&mut self, now: Instant, snapshot: Vec<WindowRecord>) {
        let summary = self.managed.reconcile(snapshot, now, ZOMBIE_TTL);
        trace!(
            managed = self.managed.len(),
            new = summary.new_windows,
            evicted = summary.evicted,
            "reconciled snapshot"
        );
        if summary.new_windows > 0 {
            // Give brand-new windows a beat to publish a real frame, so
            // they don't animate out of the middle of the screen.
            let sender = self.sender.clone();
            self.settle.submit(NEW_WINDOW_SETTLE, move || {
                sender.send(Event::ApplyLayout);
            });
        } else {
            self.apply_layout();
        }
    }

    fn move_focused(&mut self, direction: Direction) {
        let Some(focused) = discovery::focused_window(&*self.system) else {
            return;
        };
        if self.managed.index_of(focused.id).is_none() {
            debug!(id = %focused.id, "focused window is not managed");
            return;
        }
        let changed = match direction {
            Direction::Left => self.managed.promote(focused.id),
            Direction::Right => self.managed.move_to_index(focused.id, 1),
            Direction::Up => self.managed.swap_neighbor(focused.id, -1),
            Direction::Down => self.managed.swap_neighbor(focused.id, 1),
        };
        if changed {
            self.apply_layout();
        }
    }

    fn apply_layout(&mut self) {
        if self.throwing.load(Ordering::SeqCst) {
            debug!("window throw in progress; skipping layout");
            return;
        }
        let screens = self.system.screens();
        if screens.is_empty() {
            return;
        }

        for (index, screen) in screens.iter().enumerate() {
            let bounds = screen.inset(self.settings.gap);
            let windows: Vec<&WindowRecord> = self
                .managed
                .tileable()
                .filter(|r| screen_index_for(&r.frame, &screens) == index)
                .collect();
            let rects = master_stack(bounds, &windows, self.settings.gap);

            for (record, (id, target)) in windows.iter().zip(&rects) {
                if let Some(previous) = self.targets.get(id) {
                    if target.approx_eq(previous, MOVEMENT_DEAD_ZONE) {
                        continue;
                    }
                }
                let Some(handle) = record.handle.clone() else {
                    debug!(id = %id, "window has no accessibility handle; not animating");
                    continue;
                };
                self.targets.insert(*id, *target);
                self.animator_tx.send(animator::Request::Schedule {
                    handle,
                    target: *target,
                });
            }
        }
    }

    #[cfg(test)]
    fn pump(&mut self) {
        while let Ok((_span, event)) = self.receiver.try_recv() {
            self.handle_event(event);
        }
    }
}

/// The screen a window belongs to: the one its last-known frame overlaps
/// most, defaulting to the primary screen.
fn screen_index_for(frame: &Rect, screens: &[Rect]) -> usize {
    let mut best = 0;
    let mut best_area = 0.0;
    for (index, screen) in screens.iter().enumerate() {
        let area = screen.overlap_area(frame);
        if area > best_area {
            best = index;
            best_area = area;
        }
    }
    best
}
