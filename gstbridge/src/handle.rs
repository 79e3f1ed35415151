// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Opaque native handles.

use std::{ffi::c_void, ptr::NonNull};

use gstbridge_sys as ffi;

use crate::{Error, Layout, Result};

/// An opaque native pointer together with the layout family it was declared
/// with where it entered the boundary.
///
/// A handle never owns the object it points at. It is only meaningful while the
/// caller keeps the native object alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    ptr: NonNull<c_void>,
    layout: Layout,
}

impl Handle {
    /// Wraps `ptr`, `None` if it is null.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point at a live structure of the given layout
    /// family for as long as the handle (or anything derived from it) is used.
    pub unsafe fn from_raw(ptr: *mut c_void, layout: Layout) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    /// Wraps a `GTypeInstance` (objects, interfaces, param specs).
    ///
    /// # Safety
    ///
    /// See [`Handle::from_raw`].
    pub unsafe fn instance<T>(ptr: *mut T) -> Option<Self> {
        unsafe { Self::from_raw(ptr.cast(), Layout::Instance) }
    }

    /// Wraps a `GstMiniObject`.
    ///
    /// # Safety
    ///
    /// See [`Handle::from_raw`].
    pub unsafe fn mini_object<T>(ptr: *mut T) -> Option<Self> {
        unsafe { Self::from_raw(ptr.cast(), Layout::MiniObject) }
    }

    /// Wraps a boxed structure whose first field is its GType.
    ///
    /// # Safety
    ///
    /// See [`Handle::from_raw`].
    pub unsafe fn boxed<T>(ptr: *mut T) -> Option<Self> {
        unsafe { Self::from_raw(ptr.cast(), Layout::Boxed) }
    }

    /// Wraps a class structure.
    ///
    /// # Safety
    ///
    /// See [`Handle::from_raw`].
    pub unsafe fn class<T>(ptr: *mut T) -> Option<Self> {
        unsafe { Self::from_raw(ptr.cast(), Layout::Class) }
    }

    pub(crate) fn from_non_null(ptr: NonNull<c_void>, layout: Layout) -> Self {
        Self { ptr, layout }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    pub(crate) fn as_non_null(&self) -> NonNull<c_void> {
        self.ptr
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Reads the dynamic type tag from the location the layout defines.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for an instance without a class, a released
    /// mini object, or a zero tag.
    pub(crate) fn tag(&self) -> Result<ffi::GType> {
        // Safety: the constructors require a live structure of `layout`.
        let tag = unsafe {
            match self.layout {
                Layout::Instance => {
                    let class = (*self.ptr.as_ptr().cast::<ffi::GTypeInstance>()).g_class;
                    if class.is_null() {
                        return Err(Error::InvalidHandle);
                    }
                    (*class).g_type
                }
                Layout::MiniObject => {
                    let mini = &*self.ptr.as_ptr().cast::<ffi::GstMiniObject>();
                    if mini.refcount <= 0 {
                        return Err(Error::InvalidHandle);
                    }
                    mini.type_
                }
                Layout::Boxed | Layout::Class => *self.ptr.as_ptr().cast::<ffi::GType>(),
            }
        };
        if tag == ffi::G_TYPE_INVALID {
            return Err(Error::InvalidHandle);
        }
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointer_is_rejected() {
        let handle = unsafe { Handle::instance(std::ptr::null_mut::<ffi::GObject>()) };
        assert!(handle.is_none());
    }

    #[test]
    fn tag_is_read_per_layout() {
        let mut class = ffi::GTypeClass { g_type: 0x1234 };
        let mut instance = ffi::GTypeInstance {
            g_class: &mut class,
        };
        let handle = unsafe { Handle::instance(&mut instance) }.unwrap();
        assert_eq!(handle.tag().unwrap(), 0x1234);

        let class_handle = unsafe { Handle::class(&mut class) }.unwrap();
        assert_eq!(class_handle.tag().unwrap(), 0x1234);

        let mut structure = ffi::GstStructure {
            type_: 0x4321,
            name: 7,
        };
        let boxed = unsafe { Handle::boxed(&mut structure) }.unwrap();
        assert_eq!(boxed.tag().unwrap(), 0x4321);
    }

    #[test]
    fn classless_instance_is_invalid() {
        let mut instance = ffi::GTypeInstance {
            g_class: std::ptr::null_mut(),
        };
        let handle = unsafe { Handle::instance(&mut instance) }.unwrap();
        assert!(matches!(handle.tag(), Err(Error::InvalidHandle)));
    }

    #[test]
    fn released_mini_object_is_invalid() {
        let mut mini = ffi::GstMiniObject {
            type_: 0x99,
            refcount: 0,
            lockstate: 0,
            flags: 0,
            copy: None,
            dispose: None,
            free: None,
            priv_uint: 0,
            priv_pointer: std::ptr::null_mut(),
        };
        let handle = unsafe { Handle::mini_object(&mut mini) }.unwrap();
        assert!(matches!(handle.tag(), Err(Error::InvalidHandle)));

        mini.refcount = 1;
        let handle = unsafe { Handle::mini_object(&mut mini) }.unwrap();
        assert_eq!(handle.tag().unwrap(), 0x99);

        mini.type_ = 0;
        let handle = unsafe { Handle::mini_object(&mut mini) }.unwrap();
        assert!(matches!(handle.tag(), Err(Error::InvalidHandle)));
    }
}
