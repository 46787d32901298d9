//! macOS implementation of the window-system interface.

pub mod accessibility;
pub mod axuielement;
pub mod display_link;
pub mod event_tap;
pub mod hid;
pub mod notifications;
pub mod observer;
pub mod screen;
pub mod status_item;
pub mod window_server;

use std::sync::Arc;

use objc2_app_kit::{NSApplicationActivationPolicy, NSWorkspace};
use objc2_foundation::MainThreadMarker;
use parking_lot::Mutex;

use crate::model::window::Pid;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::system::{AppHandle, SystemError, WindowHandle, WindowSystem};
use axuielement::AxElement;

/// The production window system.
///
/// Screen frames are cached here because `NSScreen` is main-thread-only;
/// the notification watcher refreshes the cache whenever screen parameters
/// change.
pub struct MacSystem {
    screens: Mutex<Vec<Rect>>,
    observers: observer::ObserverRegistry,
}

impl MacSystem {
    pub fn new(mtm: MainThreadMarker) -> Arc<Self> {
        Arc::new(MacSystem {
            screens: Mutex::new(screen::screen_frames(mtm)),
            observers: observer::ObserverRegistry::new(),
        })
    }

    /// Re-read screen geometry. Main thread only.
    pub fn refresh_screens(&self, mtm: MainThreadMarker) {
        *self.screens.lock() = screen::screen_frames(mtm);
    }

    fn element(handle: &WindowHandle) -> Result<&AxElement, SystemError> {
        handle.payload::<AxElement>().ok_or(SystemError::InvalidHandle)
    }
}

impl WindowSystem for MacSystem {
    fn is_trusted(&self) -> bool { accessibility::is_trusted() }

    fn running_apps(&self) -> Vec<AppHandle> {
        let workspace = unsafe { NSWorkspace::sharedWorkspace() };
        unsafe { workspace.runningApplications() }
            .into_iter()
            .filter(|app| {
                unsafe { app.activationPolicy() } == NSApplicationActivationPolicy::Regular
                    && !unsafe { app.isHidden() }
            })
            .map(|app| AppHandle {
                pid: unsafe { app.processIdentifier() },
                name: unsafe { app.localizedName() }
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                bundle_id: unsafe { app.bundleIdentifier() }.map(|b| b.to_string()),
            })
            .collect()
    }

    fn app_windows(&self, pid: Pid) -> Result<Vec<WindowHandle>, SystemError> {
        let app = AxElement::application(pid);
        let windows = app.windows()?;
        Ok(windows.into_iter().map(AxElement::into_handle).collect())
    }

    fn role(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        Self::element(handle)?.string_attribute("AXRole")
    }

    fn subrole(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        Self::element(handle)?.string_attribute("AXSubrole")
    }

    fn title(&self, handle: &WindowHandle) -> Result<String, SystemError> {
        Self::element(handle)?.string_attribute("AXTitle")
    }

    fn is_minimized(&self, handle: &WindowHandle) -> Result<bool, SystemError> {
        Self::element(handle)?.bool_attribute("AXMinimized")
    }

    fn is_size_settable(&self, handle: &WindowHandle) -> Result<bool, SystemError> {
        Ok(Self::element(handle)?.is_settable("AXSize"))
    }

    fn frame(&self, handle: &WindowHandle) -> Result<Rect, SystemError> {
        Self::element(handle)?.frame()
    }

    fn window_number(&self, handle: &WindowHandle) -> Option<u32> {
        Self::element(handle).ok()?.window_number()
    }

    fn focused_window(&self) -> Option<(Pid, WindowHandle)> {
        let workspace = unsafe { NSWorkspace::sharedWorkspace() };
        let app = unsafe { workspace.frontmostApplication() }?;
        let pid = unsafe { app.processIdentifier() };
        let focused = AxElement::application(pid).focused_window()?;
        Some((pid, focused.into_handle()))
    }

    fn onscreen_window_ids(&self) -> Result<Vec<u32>, SystemError> {
        window_server::onscreen_window_ids()
    }

    fn screens(&self) -> Vec<Rect> { self.screens.lock().clone() }

    fn set_size(&self, handle: &WindowHandle, size: Size) -> Result<(), SystemError> {
        Self::element(handle)?.set_size(size)
    }

    fn set_position(&self, handle: &WindowHandle, position: Point) -> Result<(), SystemError> {
        Self::element(handle)?.set_position(position)
    }

    fn watch_frame_changes(
        &self,
        _handle: &WindowHandle,
        pid: Pid,
        callback: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<(), SystemError> {
        // Moved/resized notifications are registered per application; one
        // observer covers every window the app owns.
        self.observers.watch_app(pid, callback);
        Ok(())
    }
}
