//! Discovery enumerates candidate tileable windows.
//!
//! Two oracles disagree about what is on screen: the compositor's list is
//! accurate but lags during space transitions, geometry intersection is
//! immediate but optimistic. Normal scans trust the compositor; burst scans
//! after a space switch force the geometric answer until the compositor
//! catches up.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::actor::{self, reactor};
use crate::common::collections::HashSet;
use crate::common::config::{BROWSER_WHITELIST, BURST_COUNT, BURST_INTERVAL, Settings};
use crate::model::window::{WindowId, WindowRecord};
use crate::sys::geometry::Rect;
use crate::sys::system::{AppHandle, WindowHandle, WindowSystem};
use crate::sys::timer::Timer;

pub type Sender = actor::Sender<Request>;
type Receiver = actor::Receiver<Request>;

const AX_WINDOW_ROLE: &str = "AXWindow";
const NON_TILEABLE_SUBROLES: &[&str] = &["AXSystemDialog", "AXFloatingWindow", "AXDialog"];
const MIN_DIMENSION: f64 = 50.0;

#[derive(Debug)]
pub enum Request {
    /// Produce one snapshot as soon as possible.
    ScanNow,
    /// Produce seven forced-visibility snapshots 200 ms apart.
    BurstScan,
}

pub struct Discovery {
    system: Arc<dyn WindowSystem>,
    settings: Settings,
    events_tx: reactor::Sender,
    receiver: Receiver,
    cancel: CancellationToken,
    /// Handle identities that already carry a move/resize observer.
    watched: HashSet<u64>,
}

impl Discovery {
    pub fn new(
        system: Arc<dyn WindowSystem>,
        settings: Settings,
        events_tx: reactor::Sender,
        cancel: CancellationToken,
    ) -> (Self, Sender) {
        let (sender, receiver) = actor::channel();
        let this = Discovery {
            system,
            settings,
            events_tx,
            receiver,
            cancel,
            watched: HashSet::default(),
        };
        (this, sender)
    }

    /// Periodic scan loop; also serves explicit scan requests.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = Timer::sleep(self.settings.discovery_period) => {
                    self.scan_and_publish(false);
                }
                request = self.receiver.recv() => match request {
                    Some((span, Request::ScanNow)) => {
                        let _guard = span.enter();
                        self.scan_and_publish(false);
                    }
                    Some((span, Request::BurstScan)) => {
                        let _guard = span.enter();
                        for i in 0..BURST_COUNT {
                            self.scan_and_publish(true);
                            if i + 1 < BURST_COUNT {
                                Timer::sleep(BURST_INTERVAL).await;
                            }
                        }
                    }
                    None => break,
                },
            }
        }
    }

    fn scan_and_publish(&mut self, force_visible: bool) {
        let snapshot = scan(&*self.system, force_visible);
        trace!(windows = snapshot.len(), force_visible, "discovery scan");
        self.install_observers(&snapshot);
        self.events_tx.send(reactor::Event::Snapshot(snapshot));
    }

    /// Watch every on-screen window for moves and resizes; observer events
    /// feed the reactor's debounced layout trigger.
    fn install_observers(&mut self, snapshot: &[WindowRecord]) {
        for record in snapshot.iter().filter(|r| r.on_screen) {
            let Some(handle) = &record.handle else { continue };
            if !self.watched.insert(handle.identity()) {
                continue;
            }
            let events_tx = self.events_tx.clone();
            let result = self.system.watch_frame_changes(
                handle,
                record.pid,
                Arc::new(move || events_tx.send(reactor::Event::ApplyLayoutDebounced)),
            );
            if let Err(err) = result {
                debug!(id = %record.id, %err, "could not observe window");
                self.watched.remove(&handle.identity());
            }
        }
    }
}

/// One snapshot of every candidate tileable window.
///
/// Missing accessibility trust or a failed compositor query yields the
/// empty list, never a partial one; individual unreadable windows are
/// silently rejected.
pub fn scan(system: &dyn WindowSystem, force_visible: bool) -> Vec<WindowRecord> {
    if !system.is_trusted() {
        warn!("accessibility trust missing; emitting empty snapshot");
        return Vec::new();
    }
    let screens = system.screens();
    let Some(primary) = screens.first().copied() else {
        return Vec::new();
    };

    let compositor: Option<HashSet<u32>> = if force_visible {
        None
    } else {
        match system.onscreen_window_ids() {
            Ok(ids) => Some(ids.into_iter().collect()),
            Err(err) => {
                warn!(%err, "window server query failed; emitting empty snapshot");
                return Vec::new();
            }
        }
    };

    let mut records = Vec::new();
    for app in system.running_apps() {
        let Ok(handles) = system.app_windows(app.pid) else {
            continue;
        };
        for handle in handles {
            if let Some(record) =
                probe_window(system, &app, handle, force_visible, primary, &screens, compositor.as_ref())
            {
                records.push(record);
            }
        }
    }
    records
}

fn probe_window(
    system: &dyn WindowSystem,
    app: &AppHandle,
    handle: WindowHandle,
    force_visible: bool,
    primary: Rect,
    screens: &[Rect],
    compositor: Option<&HashSet<u32>>,
) -> Option<WindowRecord> {
    if system.role(&handle).ok()? != AX_WINDOW_ROLE {
        return None;
    }
    let subrole = system.subrole(&handle).ok()?;
    if NON_TILEABLE_SUBROLES.contains(&subrole.as_str()) {
        return None;
    }
    if system.is_minimized(&handle).ok()? {
        return None;
    }
    // Empty-titled windows are invisible helpers.
    if system.title(&handle).ok()?.is_empty() {
        return None;
    }
    // Non-resizable windows are splash screens.
    if !system.is_size_settable(&handle).ok()? {
        return None;
    }
    let frame = system.frame(&handle).ok()?;
    if frame.size.width < MIN_DIMENSION || frame.size.height < MIN_DIMENSION {
        return None;
    }

    let number = system.window_number(&handle).filter(|n| *n != 0);

    let mut on_screen = primary.intersects(&frame);
    if force_visible {
        if screens.iter().any(|s| s.intersects(&frame)) {
            on_screen = true;
        }
    } else if let (Some(compositor), Some(number)) = (compositor, number) {
        if !BROWSER_WHITELIST.contains(&app.name.as_str()) {
            on_screen = on_screen && compositor.contains(&number);
        }
    }

    let id = match number {
        Some(n) => WindowId::new(n),
        None => WindowId::surrogate(handle.identity()),
    };

    Some(WindowRecord {
        id,
        pid: app.pid,
        app_name: app.name.clone(),
        bundle_id: app.bundle_id.clone(),
        frame,
        on_screen,
        handle: Some(handle),
    })
}

/// Read the focused application's focused window without touching any
/// internal state.
pub fn focused_window(system: &dyn WindowSystem) -> Option<WindowRecord> {
    let (pid, handle) = system.focused_window()?;
    let frame = system.frame(&handle).ok()?;
    let app = system.running_apps().into_iter().find(|a| a.pid == pid);
    let id = match system.window_number(&handle).filter(|n| *n != 0) {
        Some(n) => WindowId::new(n),
        None => WindowId::surrogate(handle.identity()),
    };
    Some(WindowRecord {
        id,
        pid,
        app_name: app.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
        bundle_id: app.and_then(|a| a.bundle_id),
        frame,
        on_screen: true,
        handle: Some(handle),
    })
}
