//! Synthesized HID events for space switching and window throwing.
//!
//! Mission Control owns space transitions; the only way to drive them is
//! the same way the user would, via ctrl-digit / ctrl-arrow keystrokes.
//! Throwing a window is a held titlebar drag across such a switch.

use std::thread;
use std::time::Duration;

use objc2_core_foundation::CGPoint;
use objc2_core_graphics::{
    CGEvent, CGEventFlags, CGEventTapLocation, CGEventType, CGMouseButton,
};
use tracing::warn;

use crate::model::window::WindowRecord;

/// Virtual keycodes for the digit row, 1 through 9.
const DIGIT_KEYCODES: [u16; 9] = [18, 19, 20, 21, 23, 22, 26, 28, 25];
const KEYCODE_LEFT_ARROW: u16 = 123;
const KEYCODE_RIGHT_ARROW: u16 = 124;

/// Delay for Mission Control to pick up a held drag before and after the
/// space switch.
const THROW_GRAB_DELAY: Duration = Duration::from_millis(50);
const THROW_TRANSITION_DELAY: Duration = Duration::from_millis(400);

pub fn post_space_switch_digit(index: u8) {
    let Some(&keycode) = (index as usize)
        .checked_sub(1)
        .and_then(|i| DIGIT_KEYCODES.get(i))
    else {
        warn!(index, "space index out of range");
        return;
    };
    post_chord(keycode, CGEventFlags::MaskControl);
}

pub fn post_space_switch_arrow(next: bool) {
    let keycode = if next { KEYCODE_RIGHT_ARROW } else { KEYCODE_LEFT_ARROW };
    post_chord(keycode, CGEventFlags::MaskControl);
}

/// Grab the window by its titlebar, switch spaces with the drag held, and
/// release. The throw-in-progress flag around this call keeps the layout
/// engine from fighting the drag.
pub fn throw_window_to_space(record: &WindowRecord, index: u8) {
    let grab = CGPoint::new(
        record.frame.origin.x + record.frame.size.width / 2.0,
        record.frame.origin.y + 8.0,
    );

    post_mouse(CGEventType::LeftMouseDown, grab);
    thread::sleep(THROW_GRAB_DELAY);
    post_space_switch_digit(index);
    thread::sleep(THROW_TRANSITION_DELAY);
    post_mouse(CGEventType::LeftMouseUp, grab);
}

fn post_chord(keycode: u16, flags: CGEventFlags) {
    for key_down in [true, false] {
        let Some(event) = (unsafe { CGEvent::new_keyboard_event(None, keycode, key_down) }) else {
            warn!(keycode, "could not synthesize keyboard event");
            return;
        };
        CGEvent::set_flags(Some(&event), flags);
        CGEvent::post(CGEventTapLocation::HIDEventTap, Some(&event));
    }
}

fn post_mouse(event_type: CGEventType, location: CGPoint) {
    let Some(event) = (unsafe {
        CGEvent::new_mouse_event(None, event_type, location, CGMouseButton::Left)
    }) else {
        warn!(?event_type, "could not synthesize mouse event");
        return;
    };
    CGEvent::post(CGEventTapLocation::HIDEventTap, Some(&event));
}
