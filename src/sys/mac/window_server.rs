//! Compositor-side visibility oracle.

use std::ffi::c_void;
use std::ptr::NonNull;

use objc2_core_foundation::{CFArray, CFDictionary, CFNumber, CFNumberType, CFRetained, CFString};
use objc2_core_graphics::{CGWindowListCopyWindowInfo, CGWindowListOption, kCGNullWindowID};

use crate::sys::system::SystemError;

/// Window numbers the compositor reports on screen at the normal window
/// layer (0). Windows on other spaces are absent from this list, which is
/// exactly what makes it a better visibility source than geometry.
pub fn onscreen_window_ids() -> Result<Vec<u32>, SystemError> {
    objc2::rc::autoreleasepool(|_| {
        let options =
            CGWindowListOption::OptionOnScreenOnly | CGWindowListOption::ExcludeDesktopElements;
        let Some(list) = CGWindowListCopyWindowInfo(options, kCGNullWindowID) else {
            return Err(SystemError::WindowServer);
        };

        let count = CFArray::count(&list);
        let mut ids = Vec::with_capacity(count as usize);
        for index in 0..count {
            let ptr = unsafe { CFArray::value_at_index(&list, index) }.cast::<CFDictionary>();
            let Some(dict) = retain_dictionary(ptr) else {
                continue;
            };
            if dictionary_number(&dict, "kCGWindowLayer") != Some(0) {
                continue;
            }
            let Some(number) = dictionary_number(&dict, "kCGWindowNumber") else {
                continue;
            };
            if number > 0 {
                ids.push(number as u32);
            }
        }
        Ok(ids)
    })
}

fn retain_dictionary(ptr: *const CFDictionary) -> Option<CFRetained<CFDictionary>> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CFRetained::retain(NonNull::from(&*ptr)) })
    }
}

fn dictionary_number(dict: &CFDictionary, key: &str) -> Option<i64> {
    let key = CFString::from_str(key);
    let key_ref = key.as_ref() as *const CFString;
    if !unsafe { CFDictionary::contains_ptr_key(dict, key_ref.cast()) } {
        return None;
    }
    let value = unsafe { CFDictionary::value(dict, key_ref.cast()) }.cast::<CFNumber>();
    if value.is_null() {
        return None;
    }
    let mut out: i64 = 0;
    unsafe {
        CFNumber::value(&*value, CFNumberType::SInt64Type, (&raw mut out).cast::<c_void>());
    }
    Some(out)
}
