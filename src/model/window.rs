use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::Serialize;

use crate::sys::geometry::Rect;
use crate::sys::system::WindowHandle;

pub type Pid = i32;

/// Stable identifier for a window across its lifetime.
///
/// Normally the compositor's window number. Windows the compositor does not
/// know get a surrogate derived from their handle identity; surrogates have
/// the high bit set so the two ranges cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WindowId(pub u32);

impl WindowId {
    pub fn new(id: u32) -> Self { WindowId(id) }

    pub fn surrogate(handle_identity: u64) -> Self {
        let mut hasher = FxHasher::default();
        handle_identity.hash(&mut hasher);
        let h = hasher.finish();
        WindowId(0x8000_0000 | (h as u32 ^ (h >> 32) as u32))
    }

    pub fn as_u32(self) -> u32 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Snapshot-time description of one candidate tileable window.
///
/// Two records refer to the same window iff their ids are equal.
#[derive(Debug, Clone, Serialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub pid: Pid,
    pub app_name: String,
    pub bundle_id: Option<String>,
    pub frame: Rect,
    pub on_screen: bool,
    /// Absent when the window is known only through the compositor's list.
    #[serde(skip)]
    pub handle: Option<WindowHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrogate_ids_are_stable_and_marked() {
        let a = WindowId::surrogate(0xdead_beef);
        let b = WindowId::surrogate(0xdead_beef);
        assert_eq!(a, b);
        assert_ne!(a, WindowId::surrogate(0xdead_beea));
        assert!(a.as_u32() & 0x8000_0000 != 0);
    }
}
