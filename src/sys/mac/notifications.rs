//! Workspace notification subscriptions.
//!
//! Tells the space manager when the user changes spaces behind our back and
//! refreshes the cached screen geometry when displays are rearranged.

use std::sync::Arc;

use objc2::rc::{Allocated, Retained};
use objc2::{AnyThread, ClassType, DeclaredClass, Encode, Encoding, define_class, msg_send, sel};
use objc2_app_kit::{NSApplication, NSWorkspace};
use objc2_foundation::{
    MainThreadMarker, NSNotification, NSNotificationCenter, NSObject,
};
use tracing::debug;

use super::MacSystem;
use crate::actor::spaces;

#[repr(C)]
struct Instance {
    system: Arc<MacSystem>,
    spaces_tx: spaces::Sender,
}

unsafe impl Encode for Instance {
    const ENCODING: Encoding = Encoding::Object;
}

define_class! {
    // SAFETY:
    // - The superclass NSObject does not have any subclassing requirements.
    // - `NotificationHandler` does not implement `Drop`.
    #[unsafe(super(NSObject))]
    #[ivars = Box<Instance>]
    struct NotificationHandler;

    // SAFETY: Each of these method signatures must match their invocations.
    impl NotificationHandler {
        #[unsafe(method_id(initWith:))]
        fn init(this: Allocated<Self>, instance: Instance) -> Option<Retained<Self>> {
            let this = this.set_ivars(Box::new(instance));
            unsafe { msg_send![super(this), init] }
        }

        #[unsafe(method(recvSpaceChanged:))]
        fn recv_space_changed(&self, _notif: &NSNotification) {
            debug!("active space changed");
            self.ivars().spaces_tx.send(spaces::Request::SpaceChanged);
        }

        #[unsafe(method(recvScreenParamsChanged:))]
        fn recv_screen_params_changed(&self, _notif: &NSNotification) {
            // Delivered on the main thread, where NSScreen may be read.
            if let Some(mtm) = MainThreadMarker::new() {
                debug!("screen parameters changed; refreshing cache");
                self.ivars().system.refresh_screens(mtm);
            }
        }
    }
}

pub struct NotificationCenter {
    _handler: Retained<NotificationHandler>,
}

impl NotificationCenter {
    pub fn install(mtm: MainThreadMarker, system: Arc<MacSystem>, spaces_tx: spaces::Sender) -> Self {
        let instance = Instance { system, spaces_tx };
        let handler: Retained<NotificationHandler> =
            unsafe { msg_send![NotificationHandler::alloc(), initWith: instance] };

        let workspace = unsafe { NSWorkspace::sharedWorkspace() };
        let workspace_center = unsafe { workspace.notificationCenter() };
        let default_center = unsafe { NSNotificationCenter::defaultCenter() };
        let shared_app = NSApplication::sharedApplication(mtm);

        unsafe {
            use objc2_app_kit::{
                NSApplicationDidChangeScreenParametersNotification,
                NSWorkspaceActiveSpaceDidChangeNotification,
            };
            workspace_center.addObserver_selector_name_object(
                &handler,
                sel!(recvSpaceChanged:),
                Some(NSWorkspaceActiveSpaceDidChangeNotification),
                Some(&workspace),
            );
            default_center.addObserver_selector_name_object(
                &handler,
                sel!(recvScreenParamsChanged:),
                Some(NSApplicationDidChangeScreenParametersNotification),
                Some(&shared_app),
            );
        }

        NotificationCenter { _handler: handler }
    }
}
