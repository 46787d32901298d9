//! The status bar item and its menu.

use objc2::rc::{Allocated, Retained};
use objc2::runtime::AnyObject;
use objc2::{ClassType, DeclaredClass, Encode, Encoding, define_class, msg_send, sel};
use objc2_app_kit::{NSMenu, NSMenuItem, NSStatusBar, NSStatusItem, NSVariableStatusItemLength};
use objc2_foundation::{MainThreadMarker, NSObject, NSString};
use tracing::debug;

use crate::actor::menu_bar;

#[repr(C)]
struct Ivars {
    events_tx: menu_bar::Sender,
}

unsafe impl Encode for Ivars {
    const ENCODING: Encoding = Encoding::Object;
}

define_class! {
    // SAFETY:
    // - The superclass NSObject does not have any subclassing requirements.
    // - `MenuTarget` does not implement `Drop`.
    #[unsafe(super(NSObject))]
    #[ivars = Box<Ivars>]
    struct MenuTarget;

    // SAFETY: Each of these method signatures must match their invocations.
    impl MenuTarget {
        #[unsafe(method_id(initWith:))]
        fn init(this: Allocated<Self>, ivars: Ivars) -> Option<Retained<Self>> {
            let this = this.set_ivars(Box::new(ivars));
            unsafe { msg_send![super(this), init] }
        }

        #[unsafe(method(applyLayout:))]
        fn apply_layout(&self, _sender: &NSObject) {
            self.ivars().events_tx.send(menu_bar::Event::ApplyLayout);
        }

        #[unsafe(method(rescanWindows:))]
        fn rescan_windows(&self, _sender: &NSObject) {
            self.ivars().events_tx.send(menu_bar::Event::Rescan);
        }

        #[unsafe(method(quit:))]
        fn quit(&self, _sender: &NSObject) {
            self.ivars().events_tx.send(menu_bar::Event::Quit);
        }
    }
}

impl MenuTarget {
    fn new(events_tx: menu_bar::Sender) -> Retained<Self> {
        use objc2::AnyThread;
        let ivars = Ivars { events_tx };
        unsafe { msg_send![Self::alloc(), initWith: ivars] }
    }
}

pub struct StatusIcon {
    status_item: Retained<NSStatusItem>,
    _target: Retained<MenuTarget>,
}

impl StatusIcon {
    pub fn new(mtm: MainThreadMarker, events_tx: menu_bar::Sender) -> Self {
        let target = MenuTarget::new(events_tx);

        let status_bar = NSStatusBar::systemStatusBar();
        let status_item = status_bar.statusItemWithLength(NSVariableStatusItemLength);
        if let Some(button) = status_item.button(mtm) {
            button.setTitle(&NSString::from_str("tatami"));
            status_item.setVisible(true);
        }

        let menu = NSMenu::new(mtm);
        let items: [(&str, objc2::runtime::Sel); 3] = [
            ("Apply Layout", sel!(applyLayout:)),
            ("Rescan Windows", sel!(rescanWindows:)),
            ("Quit tatami", sel!(quit:)),
        ];
        for (title, action) in items {
            let item = unsafe {
                NSMenuItem::initWithTitle_action_keyEquivalent(
                    mtm.alloc(),
                    &NSString::from_str(title),
                    Some(action),
                    &NSString::from_str(""),
                )
            };
            let target_ref: &AnyObject = &target;
            unsafe { item.setTarget(Some(target_ref)) };
            menu.addItem(&item);
        }
        status_item.setMenu(Some(&menu));

        StatusIcon {
            status_item,
            _target: target,
        }
    }
}

impl Drop for StatusIcon {
    fn drop(&mut self) {
        debug!("removing status bar item");
        let status_bar = NSStatusBar::systemStatusBar();
        status_bar.removeStatusItem(&self.status_item);
    }
}
