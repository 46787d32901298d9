//! Per-application move/resize observers.
//!
//! One `AXObserver` per pid, registered on the main run loop, firing for
//! every window the application owns. Observers and their callbacks live
//! for the rest of the process; applications come and go but the cost of a
//! dead observer is nil.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use dispatch2::DispatchQueue;
use objc2_application_services::{AXObserver, AXUIElement};
use objc2_core_foundation::{CFRunLoop, CFString, kCFRunLoopDefaultMode};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::axuielement::AxElement;
use crate::common::collections::HashSet;
use crate::model::window::Pid;

type RawAXError = objc2_application_services::AXError;

const WATCHED_NOTIFICATIONS: &[&str] = &["AXMoved", "AXResized"];

pub struct ObserverRegistry {
    watched: Mutex<HashSet<Pid>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        ObserverRegistry {
            watched: Mutex::new(HashSet::default()),
        }
    }

    /// Observe moved/resized notifications for every window of `pid`.
    /// Registration happens on the main queue because the observer's run
    /// loop source must live on a run loop that actually runs.
    pub fn watch_app(&self, pid: Pid, callback: Arc<dyn Fn() + Send + Sync>) {
        if !self.watched.lock().insert(pid) {
            return;
        }
        DispatchQueue::main().exec_async(move || {
            if let Err(code) = register(pid, callback) {
                warn!(pid, ?code, "could not register AX observer");
            }
        });
    }
}

unsafe extern "C-unwind" fn observer_callback(
    _observer: NonNull<AXObserver>,
    _element: NonNull<AXUIElement>,
    _notification: NonNull<CFString>,
    refcon: *mut c_void,
) {
    if refcon.is_null() {
        return;
    }
    let callback = unsafe { &*(refcon as *const Arc<dyn Fn() + Send + Sync>) };
    callback();
}

fn register(pid: Pid, callback: Arc<dyn Fn() + Send + Sync>) -> Result<(), RawAXError> {
    let mut observer: *mut AXObserver = std::ptr::null_mut();
    let observer_ptr = match NonNull::new(&mut observer as *mut *mut AXObserver) {
        Some(ptr) => ptr,
        None => return Err(RawAXError::Failure),
    };
    let res = unsafe { AXObserver::create(pid, Some(observer_callback), observer_ptr) };
    if res != RawAXError::Success {
        return Err(res);
    }
    let observer = match NonNull::new(unsafe { *observer_ptr.as_ptr() }) {
        Some(ptr) => unsafe { objc2_core_foundation::CFRetained::from_raw(ptr) },
        None => return Err(RawAXError::Failure),
    };

    let source = unsafe { observer.run_loop_source() };
    let Some(run_loop) = CFRunLoop::main() else {
        return Err(RawAXError::Failure);
    };
    run_loop.add_source(Some(&source), unsafe { kCFRunLoopDefaultMode });

    // The refcon outlives the observer by design; both are process-lived.
    let refcon = Box::into_raw(Box::new(callback)) as *mut c_void;
    let app = AxElement::application(pid);
    for name in WATCHED_NOTIFICATIONS {
        let notification = CFString::from_static_str(name);
        let res = unsafe { observer.add_notification(app.raw(), &notification, refcon) };
        if res != RawAXError::Success && res != RawAXError::NotificationAlreadyRegistered {
            warn!(pid, name, ?res, "could not subscribe notification");
        }
    }

    debug!(pid, "observing window moves and resizes");
    std::mem::forget(observer);
    Ok(())
}
