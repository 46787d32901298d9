//! A scriptable, recording window system for unit tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::common::collections::{HashMap, HashSet};
use crate::model::window::Pid;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::system::{AppHandle, SystemError, WindowHandle, WindowSystem};

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub identity: u64,
    pub pid: Pid,
    pub role: String,
    pub subrole: String,
    pub title: String,
    pub minimized: bool,
    pub size_settable: bool,
    pub frame: Rect,
    pub window_number: Option<u32>,
    /// Whether the compositor lists this window on screen at layer 0.
    pub on_compositor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Size(Size),
    Position(Point),
}

#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub identity: u64,
    pub op: WriteOp,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    trusted: bool,
    apps: Vec<AppHandle>,
    windows: Vec<FakeWindow>,
    screens: Vec<Rect>,
    focused: Option<u64>,
    oracle_fails: bool,
    writes: Vec<WriteRecord>,
    applied: Vec<(u64, Rect)>,
    write_delay: HashMap<u64, Duration>,
    fail_writes: HashSet<u64>,
    watched: Vec<u64>,
    watch_callbacks: Vec<(u64, Arc<dyn Fn() + Send + Sync>)>,
}

pub struct FakeSystem {
    state: Mutex<State>,
    next_identity: Mutex<u64>,
}

impl FakeSystem {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeSystem {
            state: Mutex::new(State {
                trusted: true,
                screens: vec![Rect::new(0.0, 0.0, 1440.0, 900.0)],
                ..State::default()
            }),
            next_identity: Mutex::new(1),
        })
    }

    pub fn handle(&self, identity: u64) -> WindowHandle {
        WindowHandle::new(identity, Arc::new(()))
    }

    pub fn set_trusted(&self, trusted: bool) { self.state.lock().trusted = trusted }

    pub fn set_screens(&self, screens: Vec<Rect>) { self.state.lock().screens = screens }

    pub fn set_oracle_fails(&self, fails: bool) { self.state.lock().oracle_fails = fails }

    pub fn set_focused(&self, identity: Option<u64>) { self.state.lock().focused = identity }

    pub fn set_write_delay(&self, identity: u64, delay: Duration) {
        self.state.lock().write_delay.insert(identity, delay);
    }

    pub fn set_write_fails(&self, identity: u64) {
        self.state.lock().fail_writes.insert(identity);
    }

    pub fn add_app(&self, pid: Pid, name: &str) {
        self.state.lock().apps.push(AppHandle {
            pid,
            name: name.to_owned(),
            bundle_id: None,
        });
    }

    /// Add a standard, tileable window and return its handle.
    pub fn add_window(&self, pid: Pid, title: &str, frame: Rect, number: Option<u32>) -> WindowHandle {
        let identity = {
            let mut next = self.next_identity.lock();
            let id = *next;
            *next += 1;
            id
        };
        self.state.lock().windows.push(FakeWindow {
            identity,
            pid,
            role: "AXWindow".into(),
            subrole: "AXStandardWindow".into(),
            title: title.to_owned(),
            minimized: false,
            size_settable: true,
            frame,
            window_number: number,
            on_compositor: true,
        });
        self.handle(identity)
    }

    pub fn remove_window(&self, identity: u64) {
        self.state.lock().windows.retain(|w| w.identity != identity);
    }

    pub fn with_window<R>(&self, identity: u64, f: impl FnOnce(&mut FakeWindow) -> R) -> R {
        let mut state = self.state.lock();
        let win = state
            .windows
            .iter_mut()
            .find(|w| w.identity == identity)
            .expect("no such fake window");
        f(win)
    }

    pub fn writes(&self) -> Vec<WriteRecord> { self.state.lock().writes.clone() }

    /// Rects in the order they were fully applied (size then position).
    pub fn applied_rects(&self, identity: u64) -> Vec<Rect> {
        self.state
            .lock()
            .applied
            .iter()
            .filter(|(id, _)| *id == identity)
            .map(|(_, r)| *r)
            .collect()
    }

    pub fn clear_writes(&self) {
        let mut state = self.state.lock();
        state.writes.clear();
        state.applied.clear();
    }

    pub fn watched(&self) -> Vec<u64> { self.state.lock().watched.clone() }

    pub fn fire_frame_change(&self, identity: u64) {
        let callbacks: Vec<_> = self
            .state
            .lock()
            .watch_callbacks
            .iter()
            .filter(|(id, _)| *id == identity)
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in callbacks {
            cb();
        }
    }

    fn read<R>(&self, handle: &WindowHandle, f: impl FnOnce(&FakeWindow) -> R) -> Result<R, SystemError> {
        self.state
            .lock()
            .windows
            .iter()
            .find(|w| w.identity == handle.identity())
            .map(f)
            .ok_or(SystemError::InvalidHandle)
    }

    fn write_prelude(&self, handle: &WindowHandle, attr: &'static str) -> Result<(), SystemError> {
        let delay = {
            let state = self.state.lock();
            if state.fail_writes.contains(&handle.identity()) {
                return Err(SystemError::AttributeWrite(attr));
            }
            state.write_delay.get(&handle.identity()).copied()
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        Ok(())
    }
}

impl WindowSystem for FakeSystem {
    fn is_trusted(&self) -> bool { self.state.lock().trusted }

    fn running_apps(&self) -> Vec<AppHandle> { self.state.lock().apps.clone() }

    fn app_windows(&self, pid: Pid) -> Result<Vec<WindowHandle>, SystemError> {
        Ok(self
            .state
            .lock()
            .windows
            .iter()
            .filter(|w| w.pid == pid)
            .map(|w| self.handle(w.identity))
            .collect())
    }

    fn role(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        self.read(handle, |w| w.role.clone())
    }

    fn subrole(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        self.read(handle, |w| w.subrole.clone())
    }

    fn title(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        self.read(handle, |w| w.title.clone())
    }

    fn is_minimized(&self, handle: &WindowHandle) -> Result<bool, SystemError> {
        self.read(handle, |w| w.minimized)
    }

    fn is_size_settable(&self, handle: &WindowHandle) -> Result<bool, SystemError> {
        self.read(handle, |w| w.size_settable)
    }

    fn frame(&self, handle: &WindowHandle) -> Result<Rect, SystemError> {
        self.read(handle, |w| w.frame)
    }

    fn window_number(&self, handle: &WindowHandle) -> Option<u32> {
        self.read(handle, |w| w.window_number).ok().flatten()
    }

    fn focused_window(&self) -> Option<(Pid, WindowHandle)> {
        let state = self.state.lock();
        let identity = state.focused?;
        let win = state.windows.iter().find(|w| w.identity == identity)?;
        Some((win.pid, self.handle(identity)))
    }

    fn onscreen_window_ids(&self) -> Result<Vec<u32>, SystemError> {
        let state = self.state.lock();
        if state.oracle_fails {
            return Err(SystemError::WindowServer);
        }
        Ok(state
            .windows
            .iter()
            .filter(|w| w.on_compositor)
            .filter_map(|w| w.window_number)
            .collect())
    }

    fn screens(&self) -> Vec<Rect> { self.state.lock().screens.clone() }

    fn set_size(&self, handle: &WindowHandle, size: Size) -> Result<(), SystemError> {
        self.write_prelude(handle, "AXSize")?;
        let mut state = self.state.lock();
        let identity = handle.identity();
        if let Some(win) = state.windows.iter_mut().find(|w| w.identity == identity) {
            win.frame.size = size;
        }
        state.writes.push(WriteRecord {
            identity,
            op: WriteOp::Size(size),
            at: Instant::now(),
        });
        Ok(())
    }

    fn set_position(&self, handle: &WindowHandle, position: Point) -> Result<(), SystemError> {
        self.write_prelude(handle, "AXPosition")?;
        let mut state = self.state.lock();
        let identity = handle.identity();
        let mut applied = None;
        if let Some(win) = state.windows.iter_mut().find(|w| w.identity == identity) {
            win.frame.origin = position;
            applied = Some(win.frame);
        }
        state.writes.push(WriteRecord {
            identity,
            op: WriteOp::Position(position),
            at: Instant::now(),
        });
        if let Some(rect) = applied {
            state.applied.push((identity, rect));
        }
        Ok(())
    }

    fn watch_frame_changes(
        &self,
        handle: &WindowHandle,
        _pid: Pid,
        callback: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<(), SystemError> {
        let mut state = self.state.lock();
        state.watched.push(handle.identity());
        state.watch_callbacks.push((handle.identity(), callback));
        Ok(())
    }
}
