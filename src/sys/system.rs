//! The window-system interface consumed by the core.
//!
//! Everything the daemon knows about windows flows through this trait: the
//! per-application accessibility trees, the compositor's on-screen list,
//! screen geometry, and the position/size write path. The production
//! implementation lives in [`crate::sys::mac`]; tests substitute a
//! recording fake.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::model::window::Pid;
use crate::sys::geometry::{Point, Rect, Size};

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("accessibility permission not granted")]
    NotTrusted,
    #[error("attribute {0:?} could not be read")]
    AttributeRead(&'static str),
    #[error("attribute {0:?} could not be written")]
    AttributeWrite(&'static str),
    #[error("window handle is no longer valid")]
    InvalidHandle,
    #[error("window server query failed")]
    WindowServer,
}

/// A running application eligible for management.
#[derive(Debug, Clone)]
pub struct AppHandle {
    pub pid: Pid,
    pub name: String,
    pub bundle_id: Option<String>,
}

/// Opaque reference to a single window's accessibility element.
///
/// Equality and hashing use the platform-supplied identity, which is stable
/// for the lifetime of the underlying window. Cloning is cheap.
#[derive(Clone)]
pub struct WindowHandle {
    identity: u64,
    raw: Arc<dyn Any + Send + Sync>,
}

impl WindowHandle {
    pub fn new(identity: u64, raw: Arc<dyn Any + Send + Sync>) -> Self {
        WindowHandle { identity, raw }
    }

    /// Stable identity token; also the seed for surrogate window ids.
    pub fn identity(&self) -> u64 { self.identity }

    /// Access the platform payload. Implementations downcast to their own
    /// element type.
    pub fn payload<T: 'static>(&self) -> Option<&T> { self.raw.downcast_ref::<T>() }
}

impl PartialEq for WindowHandle {
    fn eq(&self, other: &Self) -> bool { self.identity == other.identity }
}

impl Eq for WindowHandle {}

impl Hash for WindowHandle {
    fn hash<H: Hasher>(&self, state: &mut H) { self.identity.hash(state) }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandle({:#x})", self.identity)
    }
}

/// Platform operations required by discovery and the animator.
///
/// Every read may fail at any time; a window can disappear between any two
/// calls. Callers treat failures as "window not eligible" rather than as
/// errors to surface.
pub trait WindowSystem: Send + Sync {
    /// Whether the process holds accessibility trust.
    fn is_trusted(&self) -> bool;

    /// Applications with a regular activation policy that are not hidden.
    fn running_apps(&self) -> Vec<AppHandle>;

    /// The accessibility window list of one application.
    fn app_windows(&self, pid: Pid) -> Result<Vec<WindowHandle>, SystemError>;

    fn role(&self, handle: &WindowHandle) -> Result<String, SystemError>;
    fn subrole(&self, handle: &WindowHandle) -> Result<String, SystemError>;
    fn title(&self, handle: &WindowHandle) -> Result<String, SystemError>;
    fn is_minimized(&self, handle: &WindowHandle) -> Result<bool, SystemError>;
    fn is_size_settable(&self, handle: &WindowHandle) -> Result<bool, SystemError>;
    fn frame(&self, handle: &WindowHandle) -> Result<Rect, SystemError>;

    /// The compositor's window number, when the window has one.
    fn window_number(&self, handle: &WindowHandle) -> Option<u32>;

    /// The focused window of the frontmost application, with its pid.
    fn focused_window(&self) -> Option<(Pid, WindowHandle)>;

    /// Window numbers the compositor reports on screen at layer 0.
    fn onscreen_window_ids(&self) -> Result<Vec<u32>, SystemError>;

    /// Screen frames, primary display first.
    fn screens(&self) -> Vec<Rect>;

    fn set_size(&self, handle: &WindowHandle, size: Size) -> Result<(), SystemError>;
    fn set_position(&self, handle: &WindowHandle, position: Point) -> Result<(), SystemError>;

    /// Subscribe to moved/resized notifications for one window. The
    /// callback may fire on any thread the platform chooses.
    fn watch_frame_changes(
        &self,
        handle: &WindowHandle,
        pid: Pid,
        callback: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<(), SystemError>;
}
