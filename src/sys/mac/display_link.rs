//! CVDisplayLink-backed vsync callbacks.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use objc2_core_video::{CVDisplayLink, CVOptionFlags, CVReturn, CVTimeStamp, kCVReturnSuccess};

/// A running display link. Stops on drop.
pub struct LinkHandle {
    link: NonNull<CVDisplayLink>,
    _callback: Box<Arc<dyn Fn() + Send + Sync>>,
}

unsafe impl Send for LinkHandle {}
unsafe impl Sync for LinkHandle {}

impl Drop for LinkHandle {
    #[allow(deprecated)]
    fn drop(&mut self) {
        unsafe {
            self.link.as_ref().stop();
        }
    }
}

unsafe extern "C-unwind" fn link_callback(
    _link: NonNull<CVDisplayLink>,
    _in_now: NonNull<CVTimeStamp>,
    _in_output_time: NonNull<CVTimeStamp>,
    _flags_in: CVOptionFlags,
    _flags_out: NonNull<CVOptionFlags>,
    user_data: *mut c_void,
) -> CVReturn {
    if !user_data.is_null() {
        let callback = unsafe { &*(user_data as *const Arc<dyn Fn() + Send + Sync>) };
        callback();
    }
    kCVReturnSuccess
}

/// Start a display link firing `callback` on every vertical sync.
#[allow(deprecated)]
pub fn start(callback: Arc<dyn Fn() + Send + Sync>) -> Result<LinkHandle, &'static str> {
    let mut link: *mut CVDisplayLink = std::ptr::null_mut();
    let link_ptr =
        NonNull::new(&raw mut link).ok_or("null display link out-pointer")?;
    let result = unsafe { CVDisplayLink::create_with_active_cg_displays(link_ptr) };
    if result != kCVReturnSuccess || link.is_null() {
        return Err("could not create CVDisplayLink");
    }
    let link = unsafe { NonNull::new_unchecked(link) };

    let callback = Box::new(callback);
    let callback_ptr = &raw const *callback as *mut c_void;

    let result = unsafe { link.as_ref().set_output_callback(Some(link_callback), callback_ptr) };
    if result != kCVReturnSuccess {
        return Err("could not set CVDisplayLink callback");
    }

    let result = unsafe { link.as_ref().start() };
    if result != kCVReturnSuccess {
        return Err("could not start CVDisplayLink");
    }

    Ok(LinkHandle {
        link,
        _callback: callback,
    })
}
