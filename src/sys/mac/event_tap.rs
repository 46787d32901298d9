//! Listen-only CGEvent taps feeding the hotkey and mouse actors.

use std::ffi::c_void;

use objc2_core_foundation::{
    CFMachPort, CFRetained, CFRunLoop, CFRunLoopSource, kCFRunLoopDefaultMode,
};
use objc2_core_graphics as ocg;
use ocg::{
    CGEvent, CGEventField, CGEventFlags, CGEventMask, CGEventTapLocation as CGTapLoc,
    CGEventTapOptions as CGTapOpt, CGEventTapPlacement as CGTapPlace, CGEventType,
};

use crate::actor::{hotkeys, mouse};

pub type TapCallback = Option<
    unsafe extern "C-unwind" fn(
        ocg::CGEventTapProxy,
        CGEventType,
        core::ptr::NonNull<ocg::CGEvent>,
        *mut c_void,
    ) -> *mut ocg::CGEvent,
>;

pub struct EventTap {
    port: CFRetained<CFMachPort>,
    source: CFRetained<CFRunLoopSource>,
    user_info: *mut c_void,
    drop_ctx: Option<unsafe fn(*mut c_void)>,
}

impl EventTap {
    /// Install a listen-only tap on the current thread's run loop.
    pub unsafe fn new_listen_only(
        mask: CGEventMask,
        callback: TapCallback,
        user_info: *mut c_void,
        drop_ctx: Option<unsafe fn(*mut c_void)>,
    ) -> Option<Self> {
        let port = unsafe {
            ocg::CGEvent::tap_create(
                CGTapLoc::SessionEventTap,
                CGTapPlace::HeadInsertEventTap,
                CGTapOpt::ListenOnly,
                mask,
                callback,
                user_info,
            )?
        };

        let source = CFMachPort::new_run_loop_source(None, Some(&port), 0)?;
        if let Some(rl) = CFRunLoop::current() {
            unsafe { rl.add_source(Some(&source), kCFRunLoopDefaultMode) };
        }
        unsafe { ocg::CGEvent::tap_enable(&port, true) };

        Some(Self {
            port,
            source,
            user_info,
            drop_ctx,
        })
    }
}

impl Drop for EventTap {
    fn drop(&mut self) {
        unsafe { ocg::CGEvent::tap_enable(&self.port, false) };
        if let Some(rl) = CFRunLoop::current() {
            unsafe { rl.remove_source(Some(&self.source), kCFRunLoopDefaultMode) };
        }
        if let Some(dropper) = self.drop_ctx {
            unsafe { dropper(self.user_info) };
        }
    }
}

fn key_name(keycode: u16) -> Option<&'static str> {
    Some(match keycode {
        4 => "h",
        38 => "j",
        40 => "k",
        37 => "l",
        15 => "r",
        12 => "q",
        18 => "1",
        19 => "2",
        20 => "3",
        21 => "4",
        23 => "5",
        123 => "left",
        124 => "right",
        _ => return None,
    })
}

unsafe fn drop_hotkey_ctx(ptr: *mut c_void) {
    unsafe { drop(Box::from_raw(ptr as *mut hotkeys::Sender)) };
}

unsafe extern "C-unwind" fn hotkey_callback(
    _proxy: ocg::CGEventTapProxy,
    event_type: CGEventType,
    event: core::ptr::NonNull<ocg::CGEvent>,
    user_info: *mut c_void,
) -> *mut ocg::CGEvent {
    if event_type == CGEventType::KeyDown && !user_info.is_null() {
        let event_ref = unsafe { event.as_ref() };
        let flags = CGEvent::flags(Some(event_ref));
        if flags.contains(CGEventFlags::MaskAlternate) {
            let keycode =
                CGEvent::integer_value_field(Some(event_ref), CGEventField::KeyboardEventKeycode)
                    as u16;
            let shifted = flags.contains(CGEventFlags::MaskShift);
            if let Some(action) =
                key_name(keycode).and_then(|name| hotkeys::action_for(name, shifted))
            {
                let tx = unsafe { &*(user_info as *const hotkeys::Sender) };
                tx.send(action);
            }
        }
    }
    event.as_ptr()
}

/// Tap alt-chords and translate them into actions. Current thread's run
/// loop; keep the returned tap alive.
pub fn install_hotkey_tap(actions_tx: hotkeys::Sender) -> Option<EventTap> {
    let mask: CGEventMask = 1u64 << (CGEventType::KeyDown.0 as u64);
    let ctx = Box::into_raw(Box::new(actions_tx)) as *mut c_void;
    let tap = unsafe {
        EventTap::new_listen_only(mask, Some(hotkey_callback), ctx, Some(drop_hotkey_ctx))
    };
    if tap.is_none() {
        unsafe { drop(Box::from_raw(ctx as *mut hotkeys::Sender)) };
    }
    tap
}

unsafe fn drop_mouse_ctx(ptr: *mut c_void) {
    unsafe { drop(Box::from_raw(ptr as *mut mouse::Sender)) };
}

unsafe extern "C-unwind" fn mouse_callback(
    _proxy: ocg::CGEventTapProxy,
    event_type: CGEventType,
    event: core::ptr::NonNull<ocg::CGEvent>,
    user_info: *mut c_void,
) -> *mut ocg::CGEvent {
    if event_type == CGEventType::LeftMouseUp && !user_info.is_null() {
        let tx = unsafe { &*(user_info as *const mouse::Sender) };
        tx.send(mouse::Request::LeftMouseUp);
    }
    event.as_ptr()
}

/// Tap left-button releases for the deferred layout trigger.
pub fn install_mouse_tap(mouse_tx: mouse::Sender) -> Option<EventTap> {
    let mask: CGEventMask = 1u64 << (CGEventType::LeftMouseUp.0 as u64);
    let ctx = Box::into_raw(Box::new(mouse_tx)) as *mut c_void;
    let tap =
        unsafe { EventTap::new_listen_only(mask, Some(mouse_callback), ctx, Some(drop_mouse_ctx)) };
    if tap.is_none() {
        unsafe { drop(Box::from_raw(ctx as *mut mouse::Sender)) };
    }
    tap
}
