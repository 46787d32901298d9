use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use test_log::test;

use super::*;
use crate::actor::discovery::scan;
use crate::sys::executor::Executor;
use crate::sys::testing::FakeSystem;
use crate::sys::timer::Timer;

type AnimatorRx = actor::Receiver<animator::Request>;

fn setup(system: &Arc<FakeSystem>) -> (Reactor, AnimatorRx, Arc<AtomicBool>) {
    let (animator_tx, animator_rx) = actor::channel();
    let throwing = Arc::new(AtomicBool::new(false));
    let sys: Arc<dyn WindowSystem> = system.clone();
    let (reactor, _tx) = Reactor::new(sys, Settings::default(), animator_tx, throwing.clone());
    (reactor, animator_rx, throwing)
}

/// Drain scheduled animations as (handle identity, target).
fn scheduled(rx: &mut AnimatorRx) -> Vec<(u64, Rect)> {
    let mut out = Vec::new();
    while let Ok((_span, request)) = rx.try_recv() {
        if let animator::Request::Schedule { handle, target } = request {
            out.push((handle.identity(), target));
        }
    }
    out
}

/// Feed a snapshot and wait out the new-window settle delay.
async fn feed(reactor: &mut Reactor, system: &FakeSystem, force_visible: bool) {
    reactor.handle_event(Event::Snapshot(scan(system, force_visible)));
    Timer::sleep(Duration::from_millis(80)).await;
    reactor.pump();
}

#[test]
fn two_windows_get_master_and_stack_rects() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_app(2, "Terminal");
        let a = system.add_window(1, "doc", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let b = system.add_window(2, "shell", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;

        let targets = scheduled(&mut rx);
        assert_eq!(targets, vec![
            (a.identity(), Rect::new(12.0, 12.0, 708.0, 876.0)),
            (b.identity(), Rect::new(732.0, 12.0, 696.0, 876.0)),
        ]);
    });
}

#[test]
fn promoting_the_stack_window_swaps_rectangles() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_app(2, "Terminal");
        let a = system.add_window(1, "doc", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let b = system.add_window(2, "shell", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);

        reactor.handle_event(Event::PromoteToMaster(WindowId::new(2)));
        assert_eq!(reactor.managed.index_of(WindowId::new(2)), Some(0));

        let targets = scheduled(&mut rx);
        assert_eq!(targets, vec![
            (b.identity(), Rect::new(12.0, 12.0, 708.0, 876.0)),
            (a.identity(), Rect::new(732.0, 12.0, 696.0, 876.0)),
        ]);
    });
}

#[test]
fn zombies_keep_their_slot_but_not_their_tile() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        let a = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let b = system.add_window(1, "b", Rect::new(400.0, 0.0, 400.0, 400.0), Some(2));
        let c = system.add_window(1, "c", Rect::new(800.0, 0.0, 400.0, 400.0), Some(3));
        let _ = (a, c);
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);

        // B vanishes from the snapshot but stays in the list as a zombie.
        system.remove_window(b.identity());
        let now = Instant::now();
        reactor.update_at(now, scan(&*system, false));

        let ids: Vec<u32> = reactor.managed.records().iter().map(|r| r.id.as_u32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(reactor.managed.is_zombie(WindowId::new(2)));

        // Layout treats the survivors as a two-window case.
        let targets = scheduled(&mut rx);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].1, Rect::new(12.0, 12.0, 708.0, 876.0));
        assert_eq!(targets[1].1, Rect::new(732.0, 12.0, 696.0, 876.0));

        // Still missing 2.5 s later: evicted for good.
        reactor.update_at(now + Duration::from_millis(2500), scan(&*system, false));
        let ids: Vec<u32> = reactor.managed.records().iter().map(|r| r.id.as_u32()).collect();
        assert_eq!(ids, vec![1, 3]);
    });
}

#[test]
fn apply_layout_is_idempotent() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        system.add_window(1, "b", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        assert_eq!(scheduled(&mut rx).len(), 2);

        reactor.handle_event(Event::ApplyLayout);
        assert_eq!(scheduled(&mut rx), vec![], "unchanged targets issue no writes");
    });
}

#[test]
fn reset_cache_forces_rewrites_for_every_window() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        system.add_window(1, "b", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);

        reactor.handle_event(Event::ResetCache);
        reactor.handle_event(Event::ApplyLayout);
        assert_eq!(scheduled(&mut rx).len(), 2);
    });
}

#[test]
fn promote_then_move_right_round_trips() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let w = system.add_window(1, "w", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        system.set_focused(Some(w.identity()));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);

        reactor.handle_event(Event::PromoteToMaster(WindowId::new(2)));
        assert_eq!(reactor.managed.index_of(WindowId::new(2)), Some(0));

        reactor.handle_event(Event::MoveFocused(Direction::Right));
        assert_eq!(reactor.managed.index_of(WindowId::new(2)), Some(1));
    });
}

#[test]
fn moves_of_unmanaged_windows_are_ignored() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);

        // A window that appeared after the last snapshot is focused but not
        // yet managed.
        let late = system.add_window(1, "late", Rect::new(0.0, 0.0, 500.0, 500.0), Some(9));
        system.set_focused(Some(late.identity()));

        reactor.handle_event(Event::MoveFocused(Direction::Up));
        let ids: Vec<u32> = reactor.managed.records().iter().map(|r| r.id.as_u32()).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(scheduled(&mut rx), vec![]);
    });
}

#[test]
fn a_throw_in_progress_skips_dispatch() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let (mut reactor, mut rx, throwing) = setup(&system);

        throwing.store(true, std::sync::atomic::Ordering::SeqCst);
        feed(&mut reactor, &system, false).await;
        assert_eq!(scheduled(&mut rx), vec![]);

        throwing.store(false, std::sync::atomic::Ordering::SeqCst);
        reactor.handle_event(Event::ApplyLayout);
        assert_eq!(scheduled(&mut rx).len(), 1);
    });
}

#[test]
fn new_windows_defer_layout_by_the_settle_delay() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let (mut reactor, mut rx, _) = setup(&system);

        reactor.handle_event(Event::Snapshot(scan(&*system, false)));
        reactor.pump();
        assert_eq!(scheduled(&mut rx), vec![], "layout deferred while the window settles");

        Timer::sleep(Duration::from_millis(80)).await;
        reactor.pump();
        assert_eq!(scheduled(&mut rx).len(), 1);

        // A snapshot with no new ids applies immediately.
        reactor.handle_event(Event::ResetCache);
        reactor.handle_event(Event::Snapshot(scan(&*system, false)));
        assert_eq!(scheduled(&mut rx).len(), 1);
    });
}

#[test]
fn external_triggers_coalesce_through_the_debounce() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;
        scheduled(&mut rx);
        reactor.handle_event(Event::ResetCache);

        reactor.handle_event(Event::ApplyLayoutDebounced);
        Timer::sleep(Duration::from_millis(200)).await;
        reactor.pump();
        // Second trigger restarts the window.
        reactor.handle_event(Event::ApplyLayoutDebounced);
        Timer::sleep(Duration::from_millis(250)).await;
        reactor.pump();
        assert_eq!(scheduled(&mut rx), vec![], "still inside the debounce window");

        Timer::sleep(Duration::from_millis(350)).await;
        reactor.pump();
        assert_eq!(scheduled(&mut rx).len(), 1, "one layout for both triggers");
    });
}

#[test]
fn windows_partition_across_screens() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.set_screens(vec![
            Rect::new(0.0, 0.0, 1440.0, 900.0),
            Rect::new(1440.0, 0.0, 1440.0, 900.0),
        ]);
        system.add_app(1, "TextEdit");
        let a = system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let b = system.add_window(1, "b", Rect::new(700.0, 0.0, 700.0, 700.0), Some(2));
        let c = system.add_window(1, "c", Rect::new(1500.0, 0.0, 700.0, 700.0), Some(3));
        let _ = (a, b);
        let (mut reactor, mut rx, _) = setup(&system);

        // Forced visibility marks the secondary-screen window on screen.
        feed(&mut reactor, &system, true).await;

        let targets = scheduled(&mut rx);
        assert_eq!(targets.len(), 3);
        // The two primary-screen windows share that screen.
        assert_eq!(targets[0].1, Rect::new(12.0, 12.0, 708.0, 876.0));
        assert_eq!(targets[1].1, Rect::new(732.0, 12.0, 696.0, 876.0));
        // The secondary window fills its own screen's bounds.
        assert_eq!(targets[2], (c.identity(), Rect::new(1452.0, 12.0, 1416.0, 876.0)));
    });
}

#[test]
fn offscreen_windows_stay_managed_but_untiled() {
    Executor::run(async {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        system.add_window(1, "a", Rect::new(0.0, 0.0, 700.0, 700.0), Some(1));
        let far = system.add_window(1, "far", Rect::new(5000.0, 5000.0, 700.0, 700.0), Some(2));
        let _ = far;
        let (mut reactor, mut rx, _) = setup(&system);

        feed(&mut reactor, &system, false).await;

        assert_eq!(reactor.managed.len(), 2);
        let targets = scheduled(&mut rx);
        assert_eq!(targets.len(), 1, "only the on-screen window is tiled");
        assert_eq!(targets[0].1, Rect::new(12.0, 12.0, 1416.0, 876.0));
    });
}
