//! Screen geometry in accessibility coordinates.
//!
//! `NSScreen` reports frames with a bottom-left origin while the AX and
//! window-server APIs use top-left; everything we hand to the rest of the
//! daemon is converted to top-left against the primary screen.

use objc2_app_kit::NSScreen;
use objc2_foundation::MainThreadMarker;

use crate::sys::geometry::Rect;

/// Usable screen frames (menu bar and dock excluded), primary first, in
/// top-left coordinates. Main thread only.
pub fn screen_frames(mtm: MainThreadMarker) -> Vec<Rect> {
    let screens = NSScreen::screens(mtm);
    let Some(primary) = screens.iter().next() else {
        return Vec::new();
    };
    let primary_height = primary.frame().size.height;

    screens
        .iter()
        .map(|screen| {
            let visible = screen.visibleFrame();
            let top_left_y = primary_height - visible.origin.y - visible.size.height;
            Rect::new(
                visible.origin.x,
                top_left_y,
                visible.size.width,
                visible.size.height,
            )
        })
        .collect()
}
