//! Thin wrapper over `AXUIElement`.
//!
//! Every accessor is a synchronous IPC call into the target application and
//! can fail or hang at any moment; callers must treat errors as "window is
//! not eligible right now".

use std::ptr::NonNull;
use std::sync::Arc;

use objc2_application_services::{AXUIElement, AXValue, AXValueType};
use objc2_core_foundation::{
    CFArray, CFBoolean, CFHash, CFRetained, CFString, CFType, CGPoint, CGSize,
};
use objc2_core_graphics::CGWindowID;

use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::system::{SystemError, WindowHandle};

type RawAXError = objc2_application_services::AXError;

/// A retained accessibility element.
///
/// AXUIElement operations are IPC calls to the accessibility server and are
/// safe to issue from any thread.
pub struct AxElement(CFRetained<AXUIElement>);

unsafe impl Send for AxElement {}
unsafe impl Sync for AxElement {}

impl AxElement {
    pub fn application(pid: i32) -> Self {
        Self(unsafe { AXUIElement::new_application(pid) })
    }

    /// Stable identity of the underlying element, independent of which
    /// copy of the wrapper we hold.
    pub fn identity(&self) -> u64 { CFHash(Some(&self.0)) as u64 }

    pub fn into_handle(self) -> WindowHandle {
        let identity = self.identity();
        WindowHandle::new(identity, Arc::new(self))
    }

    pub fn windows(&self) -> Result<Vec<AxElement>, SystemError> {
        let array = self.copy_attribute::<CFArray>("AXWindows")?;
        let count = CFArray::count(&array);
        let mut out = Vec::with_capacity(count as usize);
        for index in 0..count {
            let ptr = unsafe { CFArray::value_at_index(&array, index) } as *mut AXUIElement;
            let Some(ptr) = NonNull::new(ptr) else { continue };
            let element = unsafe { CFRetained::retain(ptr) };
            out.push(AxElement(element));
        }
        Ok(out)
    }

    pub fn focused_window(&self) -> Option<AxElement> {
        self.copy_attribute::<AXUIElement>("AXFocusedWindow").ok().map(AxElement)
    }

    pub fn string_attribute(&self, name: &'static str) -> Result<String, SystemError> {
        Ok(self.copy_attribute::<CFString>(name)?.to_string())
    }

    pub fn bool_attribute(&self, name: &'static str) -> Result<bool, SystemError> {
        Ok(self.copy_attribute::<CFBoolean>(name)?.as_bool())
    }

    pub fn is_settable(&self, name: &'static str) -> bool {
        let attribute = CFString::from_static_str(name);
        let mut settable: u8 = 0;
        let Some(ptr) = NonNull::new(&mut settable as *mut u8) else {
            return false;
        };
        let res = unsafe { self.0.is_attribute_settable(&attribute, ptr) };
        res == RawAXError::Success && settable != 0
    }

    pub fn frame(&self) -> Result<Rect, SystemError> {
        let position = self.copy_attribute::<AXValue>("AXPosition")?;
        let mut origin = CGPoint::new(0.0, 0.0);
        let origin_ptr = NonNull::new((&mut origin as *mut CGPoint).cast())
            .ok_or(SystemError::AttributeRead("AXPosition"))?;
        unsafe { position.value(AXValueType::CGPoint, origin_ptr) };

        let size = self.copy_attribute::<AXValue>("AXSize")?;
        let mut extent = CGSize::new(0.0, 0.0);
        let extent_ptr = NonNull::new((&mut extent as *mut CGSize).cast())
            .ok_or(SystemError::AttributeRead("AXSize"))?;
        unsafe { size.value(AXValueType::CGSize, extent_ptr) };

        Ok(Rect::new(origin.x, origin.y, extent.width, extent.height))
    }

    pub fn window_number(&self) -> Option<u32> {
        unsafe extern "C" {
            fn _AXUIElementGetWindow(element: &AXUIElement, out: *mut CGWindowID) -> RawAXError;
        }
        let mut id: CGWindowID = 0;
        let res = unsafe { _AXUIElementGetWindow(&self.0, &mut id) };
        (res == RawAXError::Success && id != 0).then_some(id)
    }

    pub fn set_position(&self, position: Point) -> Result<(), SystemError> {
        let mut value = CGPoint::new(position.x, position.y);
        let ptr = NonNull::new((&mut value as *mut CGPoint).cast())
            .ok_or(SystemError::AttributeWrite("AXPosition"))?;
        let value = unsafe { AXValue::new(AXValueType::CGPoint, ptr) }
            .ok_or(SystemError::AttributeWrite("AXPosition"))?;
        self.set_attribute("AXPosition", &value)
    }

    pub fn set_size(&self, size: Size) -> Result<(), SystemError> {
        let mut value = CGSize::new(size.width, size.height);
        let ptr = NonNull::new((&mut value as *mut CGSize).cast())
            .ok_or(SystemError::AttributeWrite("AXSize"))?;
        let value = unsafe { AXValue::new(AXValueType::CGSize, ptr) }
            .ok_or(SystemError::AttributeWrite("AXSize"))?;
        self.set_attribute("AXSize", &value)
    }

    pub fn raw(&self) -> &AXUIElement { &self.0 }

    fn copy_attribute<T: objc2_core_foundation::Type>(
        &self,
        name: &'static str,
    ) -> Result<CFRetained<T>, SystemError> {
        let attribute = CFString::from_static_str(name);
        let mut value: *const CFType = std::ptr::null();
        let value_ptr = NonNull::new(&mut value as *mut *const CFType)
            .ok_or(SystemError::AttributeRead(name))?;

        let res = unsafe { self.0.copy_attribute_value(&attribute, value_ptr) };
        if res != RawAXError::Success {
            return Err(SystemError::AttributeRead(name));
        }
        let value = unsafe { *value_ptr.as_ptr() as *mut T };
        let value = NonNull::new(value).ok_or(SystemError::AttributeRead(name))?;
        Ok(unsafe { CFRetained::from_raw(value) })
    }

    fn set_attribute(&self, name: &'static str, value: &AXValue) -> Result<(), SystemError> {
        let attribute = CFString::from_static_str(name);
        let res = unsafe { self.0.set_attribute_value(&attribute, value) };
        if res != RawAXError::Success {
            return Err(SystemError::AttributeWrite(name));
        }
        Ok(())
    }
}
