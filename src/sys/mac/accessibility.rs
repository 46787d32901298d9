use std::ffi::c_void;

use objc2::rc::autoreleasepool;
use objc2::runtime::AnyObject;
use objc2::{class, msg_send};
use tracing::info;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;

    static kAXTrustedCheckOptionPrompt: *const c_void;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    static kCFBooleanTrue: *const c_void;
}

#[inline]
pub fn is_trusted() -> bool { unsafe { AXIsProcessTrusted() } }

#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn prompt_trust_dialog() {
    autoreleasepool(|_| {
        let keys: [*mut AnyObject; 1] = [kAXTrustedCheckOptionPrompt as *mut AnyObject];
        let vals: [*mut AnyObject; 1] = [kCFBooleanTrue as *mut AnyObject];

        let dict: *mut AnyObject = msg_send![
            class!(NSDictionary),
            dictionaryWithObjects: vals.as_ptr(),
            forKeys:              keys.as_ptr(),
            count:                1usize
        ];

        let _ = AXIsProcessTrustedWithOptions(dict.cast());
    });
}

/// Prompt for accessibility trust and exit if it has not been granted.
/// macOS only applies a new grant to freshly launched processes, so there
/// is no point continuing without it.
pub fn ensure_accessibility_permission() {
    if is_trusted() {
        return;
    }

    info!("accessibility permission is not granted; prompting user for permission now");

    unsafe { prompt_trust_dialog() };

    println!("grant accessibility permission to tatami in System Settings, then restart it");

    std::process::exit(1);
}
