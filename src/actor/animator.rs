//! The animator drives each window from where it is to where the layout
//! wants it.
//!
//! Accessibility writes are synchronous and can take tens of milliseconds,
//! so interpolation state lives on a logic worker and the writes themselves
//! on a dedicated write worker. A window with a write still in flight
//! simply skips ticks (the `busy` set) instead of queueing frames behind a
//! slow sink; the final write always lands exactly on the target.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::actor;
use crate::common::collections::{HashMap, HashSet};
use crate::common::config::{ANIMATION_DEAD_ZONE, Settings};
use crate::sys::display_link::DisplayDriver;
use crate::sys::geometry::Rect;
use crate::sys::system::{WindowHandle, WindowSystem};

pub type Sender = actor::Sender<Request>;
type Receiver = actor::Receiver<Request>;

#[derive(Debug)]
pub enum Request {
    /// Animate a window toward `target`, replacing any in-flight job with a
    /// different destination.
    Schedule { handle: WindowHandle, target: Rect },
    /// Replace animations with direct writes until `duration` elapses.
    Suppress(Duration),
    /// Abandon any job and pin the window at `rect` immediately.
    ForceIntoPlace { handle: WindowHandle, rect: Rect },
    /// One display-refresh frame.
    Tick,
    /// The write worker finished the in-flight write for a handle.
    WriteFinished(u64),
}

#[derive(Debug)]
struct Job {
    handle: WindowHandle,
    start: Rect,
    target: Rect,
    started_at: Instant,
    duration: Duration,
}

struct WriteCommand {
    handle: WindowHandle,
    rect: Rect,
    /// Report back so the busy set can be cleared.
    notify: bool,
    /// Write a second time shortly after, to beat OS repositioning races.
    repeat: bool,
}

pub struct Animator {
    system: Arc<dyn WindowSystem>,
    settings: Settings,
    sender: Sender,
    receiver: Receiver,
    jobs: HashMap<u64, Job>,
    last_applied: HashMap<u64, Rect>,
    busy: HashSet<u64>,
    suppress_until: Option<Instant>,
    driver: DisplayDriver,
    writer: crossbeam_channel::Sender<WriteCommand>,
}

impl Animator {
    pub fn new(system: Arc<dyn WindowSystem>, settings: Settings) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let writer = spawn_write_worker(system.clone(), sender.clone());
        let this = Animator {
            system,
            settings,
            sender: sender.clone(),
            receiver,
            jobs: HashMap::default(),
            last_applied: HashMap::default(),
            busy: HashSet::default(),
            suppress_until: None,
            driver: DisplayDriver::new(),
            writer,
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
            Request::Schedule { handle, target } => self.schedule(handle, target),
            Request::Suppress(duration) => {
                debug!(?duration, "suppressing animations");
                self.suppress_until = Some(Instant::now() + duration);
            }
            Request::ForceIntoPlace { handle, rect } => self.force_into_place(handle, rect),
            Request::Tick => self.tick(),
            Request::WriteFinished(identity) => {
                self.busy.remove(&identity);
            }
        }
    }

    fn schedule(&mut self, handle: WindowHandle, target: Rect) {
        let identity = handle.identity();

        if !self.settings.animate || self.suppressed() {
            self.jobs.remove(&identity);
            self.write_direct(handle, target, false);
            return;
        }

        let target = target.round();
        if let Some(job) = self.jobs.get(&identity) {
            if job.target == target {
                // Same destination already in flight.
                return;
            }
        }

        let current = match self.system.frame(&handle) {
            Ok(frame) => frame,
            Err(_) => target,
        };

        if current.chebyshev_distance(&target) < ANIMATION_DEAD_ZONE {
            self.jobs.remove(&identity);
            self.write_direct(handle, target, false);
            return;
        }

        trace!(identity, ?current, ?target, "starting animation");
        self.jobs.insert(identity, Job {
            handle,
            start: current,
            target,
            started_at: Instant::now(),
            duration: self.settings.animation_duration,
        });
        self.ensure_driver();
    }

    fn tick(&mut self) {
        if self.jobs.is_empty() {
            self.driver.stop();
            return;
        }

        let now = Instant::now();
        let exponent = self.settings.ease_exponent;
        let mut completed = Vec::new();
        let mut writes = Vec::new();

        for (&identity, job) in &self.jobs {
            if self.busy.contains(&identity) {
                // Previous write has not returned; drop this frame.
                continue;
            }

            let t = (now.duration_since(job.started_at).as_secs_f64()
                / job.duration.as_secs_f64())
            .clamp(0.0, 1.0);
            if t >= 1.0 {
                completed.push(identity);
                continue;
            }

            let rect = job.start.lerp(&job.target, ease_out(t, exponent)).round();
            if self.last_applied.get(&identity) == Some(&rect) {
                continue;
            }
            writes.push((identity, job.handle.clone(), rect));
        }

        for (identity, handle, rect) in writes {
            self.last_applied.insert(identity, rect);
            self.busy.insert(identity);
            _ = self.writer.send(WriteCommand {
                handle,
                rect,
                notify: true,
                repeat: false,
            });
        }

        for identity in completed {
            let job = match self.jobs.remove(&identity) {
                Some(job) => job,
                None => continue,
            };
            // Land exactly on the target to defeat sub-point drift.
            self.write_direct(job.handle, job.target, false);
        }
    }

    fn force_into_place(&mut self, handle: WindowHandle, rect: Rect) {
        let identity = handle.identity();
        self.jobs.remove(&identity);
        self.busy.remove(&identity);
        self.last_applied.remove(&identity);
        _ = self.writer.send(WriteCommand {
            handle,
            rect,
            notify: false,
            repeat: true,
        });
    }

    fn write_direct(&mut self, handle: WindowHandle, rect: Rect, repeat: bool) {
        self.last_applied.insert(handle.identity(), rect);
        _ = self.writer.send(WriteCommand {
            handle,
            rect,
            notify: false,
            repeat,
        });
    }

    fn suppressed(&self) -> bool {
        self.suppress_until.is_some_and(|deadline| Instant::now() < deadline)
    }

    fn ensure_driver(&mut self) {
        if self.driver.is_running() {
            return;
        }
        let tx = self.sender.clone();
        self.driver.start(Arc::new(move || tx.send(Request::Tick)));
    }

    #[cfg(test)]
    fn pump(&mut self) {
        while let Ok((_span, request)) = self.receiver.try_recv() {
            self.handle_request(request);
        }
    }

    #[cfg(test)]
    fn active_jobs(&self) -> usize { self.jobs.len() }
}

fn ease_out(t: f64, exponent: u32) -> f64 { 1.0 - (1.0 - t).powi(exponent as i32) }

/// The write worker owns no state; it performs each write (size before
/// position, so an edge-clamped move cannot defeat the resize) and reports
/// completion back to the logic worker.
fn spawn_write_worker(
    system: Arc<dyn WindowSystem>,
    events: Sender,
) -> crossbeam_channel::Sender<WriteCommand> {
    let (tx, rx) = crossbeam_channel::unbounded::<WriteCommand>();
    std::thread::Builder::new()
        .name("tatami-ax-write".into())
        .spawn(move || {
            for command in rx {
                apply_write(&*system, &command.handle, command.rect);
                if command.repeat {
                    std::thread::sleep(Duration::from_millis(10));
                    apply_write(&*system, &command.handle, command.rect);
                }
                if command.notify {
                    events.send(Request::WriteFinished(command.handle.identity()));
                }
            }
        })
        .expect("failed to spawn write worker");
    tx
}

fn apply_write(system: &dyn WindowSystem, handle: &WindowHandle, rect: Rect) {
    if let Err(err) = system.set_size(handle, rect.size) {
        warn!(identity = handle.identity(), %err, "size write failed");
    }
    if let Err(err) = system.set_position(handle, rect.origin) {
        warn!(identity = handle.identity(), %err, "position write failed");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::sys::testing::{FakeSystem, WriteOp};

    const WAIT: Duration = Duration::from_millis(60);

    fn animator(system: &Arc<FakeSystem>) -> Animator {
        let sys: Arc<dyn WindowSystem> = system.clone();
        Animator::new(sys, Settings::default()).0
    }

    fn assert_size_before_position(system: &FakeSystem) {
        let writes = system.writes();
        assert!(writes.len() % 2 == 0, "writes come in size/position pairs");
        for pair in writes.chunks(2) {
            assert_eq!(pair[0].identity, pair[1].identity);
            assert!(matches!(pair[0].op, WriteOp::Size(_)));
            assert!(matches!(pair[1].op, WriteOp::Position(_)));
        }
    }

    #[test]
    fn below_threshold_target_is_written_directly() {
        let system = FakeSystem::new();
        system.add_app(1, "TextEdit");
        let handle = system.add_window(1, "doc", Rect::new(100.0, 100.0, 400.0, 400.0), Some(10));
        let mut anim = animator(&system);

        anim.handle_request(Request::Schedule {
            handle,
            target: Rect::new(100.3, 100.7, 400.1, 400.2),
        });
        assert_eq!(anim.active_jobs(), 0);

        std::thread::sleep(WAIT);
        assert_eq!(system.applied_rects(1), vec![Rect::new(100.0, 101.0, 400.0, 400.0)]);
        assert_size_before_position(&system);
    }

    #[test]
    fn same_destination_in_flight_is_ignored() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let mut anim = animator(&system);

        let target = Rect::new(500.0, 300.0, 600.0, 500.0);
        anim.handle_request(Request::Schedule { handle: handle.clone(), target });
        assert_eq!(anim.active_jobs(), 1);
        let started = anim.jobs.values().next().unwrap().started_at;

        anim.handle_request(Request::Schedule { handle, target });
        assert_eq!(anim.active_jobs(), 1);
        assert_eq!(anim.jobs.values().next().unwrap().started_at, started);
    }

    #[test]
    fn a_new_destination_replaces_the_job() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let mut anim = animator(&system);

        anim.handle_request(Request::Schedule {
            handle: handle.clone(),
            target: Rect::new(500.0, 300.0, 600.0, 500.0),
        });
        anim.handle_request(Request::Schedule {
            handle,
            target: Rect::new(700.0, 100.0, 500.0, 400.0),
        });
        assert_eq!(anim.active_jobs(), 1);
        assert_eq!(
            anim.jobs.values().next().unwrap().target,
            Rect::new(700.0, 100.0, 500.0, 400.0)
        );
    }

    #[test]
    fn animation_lands_exactly_on_the_target() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let mut anim = animator(&system);

        let target = Rect::new(500.0, 300.0, 600.0, 500.0);
        anim.handle_request(Request::Schedule { handle, target });

        let deadline = Instant::now() + Duration::from_secs(2);
        while anim.active_jobs() > 0 {
            assert!(Instant::now() < deadline, "animation did not converge");
            anim.handle_request(Request::Tick);
            std::thread::sleep(Duration::from_millis(15));
            anim.pump();
        }
        std::thread::sleep(WAIT);

        let applied = system.applied_rects(1);
        assert!(!applied.is_empty());
        assert_eq!(*applied.last().unwrap(), target);
        assert_size_before_position(&system);
    }

    #[test]
    fn busy_windows_skip_ticks_but_still_converge() {
        let system = FakeSystem::new();
        let slow = system.add_window(1, "slow", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let fast = system.add_window(1, "fast", Rect::new(0.0, 500.0, 400.0, 300.0), Some(2));
        system.set_write_delay(slow.identity(), Duration::from_millis(25));
        let mut anim = animator(&system);

        let slow_target = Rect::new(600.0, 0.0, 500.0, 400.0);
        let fast_target = Rect::new(600.0, 500.0, 500.0, 300.0);
        anim.handle_request(Request::Schedule { handle: slow.clone(), target: slow_target });
        anim.handle_request(Request::Schedule { handle: fast.clone(), target: fast_target });

        let deadline = Instant::now() + Duration::from_secs(5);
        while anim.active_jobs() > 0 && Instant::now() < deadline {
            anim.handle_request(Request::Tick);
            std::thread::sleep(Duration::from_millis(10));
            anim.pump();
        }
        std::thread::sleep(Duration::from_millis(200));
        anim.pump();

        let slow_writes = system.applied_rects(slow.identity());
        let fast_writes = system.applied_rects(fast.identity());
        assert_eq!(*slow_writes.last().unwrap(), slow_target);
        assert_eq!(*fast_writes.last().unwrap(), fast_target);
        // The slow sink held its window busy across most ticks.
        assert!(fast_writes.len() > slow_writes.len());
    }

    #[test]
    fn suppression_replaces_animation_with_direct_writes() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let mut anim = animator(&system);

        anim.handle_request(Request::Suppress(Duration::from_millis(250)));
        let target = Rect::new(800.0, 200.0, 500.0, 600.0);
        anim.handle_request(Request::Schedule { handle: handle.clone(), target });
        assert_eq!(anim.active_jobs(), 0);

        std::thread::sleep(WAIT);
        assert_eq!(system.applied_rects(1), vec![target]);

        // After the deadline passes animations resume.
        std::thread::sleep(Duration::from_millis(250));
        anim.handle_request(Request::Schedule {
            handle,
            target: Rect::new(0.0, 0.0, 400.0, 400.0),
        });
        assert_eq!(anim.active_jobs(), 1);
    }

    #[test]
    fn force_into_place_writes_twice_and_clears_state() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        let mut anim = animator(&system);

        anim.handle_request(Request::Schedule {
            handle: handle.clone(),
            target: Rect::new(900.0, 0.0, 400.0, 400.0),
        });
        let rect = Rect::new(50.0, 60.0, 700.0, 800.0);
        anim.handle_request(Request::ForceIntoPlace { handle: handle.clone(), rect });
        assert_eq!(anim.active_jobs(), 0);
        assert!(!anim.busy.contains(&handle.identity()));
        assert!(!anim.last_applied.contains_key(&handle.identity()));

        std::thread::sleep(WAIT);
        assert_eq!(system.applied_rects(1), vec![rect, rect]);
    }

    #[test]
    fn unreadable_frame_falls_back_to_a_direct_write() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        system.remove_window(handle.identity());
        let mut anim = animator(&system);

        anim.handle_request(Request::Schedule {
            handle,
            target: Rect::new(500.0, 0.0, 400.0, 400.0),
        });
        assert_eq!(anim.active_jobs(), 0);
        std::thread::sleep(WAIT);
        // The write was still attempted, in order.
        assert_size_before_position(&system);
    }

    #[test]
    fn failed_writes_are_not_retried_by_the_worker() {
        let system = FakeSystem::new();
        let handle = system.add_window(1, "a", Rect::new(0.0, 0.0, 400.0, 400.0), Some(1));
        system.set_write_fails(handle.identity());
        let mut anim = animator(&system);

        anim.handle_request(Request::Schedule {
            handle: handle.clone(),
            target: Rect::new(600.0, 0.0, 500.0, 400.0),
        });
        anim.handle_request(Request::Tick);
        std::thread::sleep(WAIT);
        anim.pump();

        // The worker reported completion despite the failure, so the busy
        // set cannot wedge.
        assert!(!anim.busy.contains(&handle.identity()));
        assert!(system.writes().is_empty());
    }
}
