// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Iteration over native sequences.
//!
//! Two shapes are covered: arrays ending in a terminator element (string
//! vectors, enum and flags value tables) and singly or doubly linked lists.

use std::{iter::FusedIterator, marker::PhantomData, os::raw::c_char};

use gstbridge_sys as ffi;
use tracing::debug;

use crate::{Handle, TypedView, api::cstr_to_string, kind};

/// An element type that marks the end of a native array.
pub trait Terminated {
    fn is_terminator(&self) -> bool;
}

impl<T> Terminated for *const T {
    fn is_terminator(&self) -> bool {
        self.is_null()
    }
}

impl<T> Terminated for *mut T {
    fn is_terminator(&self) -> bool {
        self.is_null()
    }
}

impl Terminated for ffi::GEnumValue {
    fn is_terminator(&self) -> bool {
        self.value_name.is_null()
    }
}

impl Terminated for ffi::GFlagsValue {
    fn is_terminator(&self) -> bool {
        self.value_name.is_null()
    }
}

/// Iterator over a terminated native array.
///
/// Yields elements in index order and stops at the first terminator, which is
/// never yielded. A null array is empty.
pub struct NullTerminated<'a, T: Terminated> {
    next: *const T,
    phantom: PhantomData<&'a T>,
}

impl<'a, T: Terminated> NullTerminated<'a, T> {
    /// # Safety
    ///
    /// `ptr` must be null or point at an array of `T` containing a terminator,
    /// valid for `'a`.
    pub unsafe fn new(ptr: *const T) -> Self {
        Self {
            next: ptr,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: Terminated> Iterator for NullTerminated<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_null() {
            return None;
        }
        // Safety: `new` requires a terminated array; we never step past the terminator.
        let item = unsafe { &*self.next };
        if item.is_terminator() {
            self.next = std::ptr::null();
            return None;
        }
        self.next = unsafe { self.next.add(1) };
        Some(item)
    }
}

impl<T: Terminated> FusedIterator for NullTerminated<'_, T> {}

/// Number of elements before the terminator.
///
/// # Safety
///
/// See [`NullTerminated::new`].
pub unsafe fn terminated_len<T: Terminated>(ptr: *const T) -> usize {
    unsafe { NullTerminated::new(ptr) }.count()
}

/// Copies a null-terminated string vector (`gchar**`).
///
/// # Safety
///
/// See [`NullTerminated::new`]; every element must be a valid C string.
pub unsafe fn strv_to_vec(strv: *const *const c_char) -> Vec<String> {
    unsafe { NullTerminated::new(strv) }
        .filter_map(|s| unsafe { cstr_to_string(*s) })
        .collect()
}

/// A native linked list node.
pub trait ListNode {
    fn data(&self) -> ffi::gpointer;
    fn next_node(&self) -> *const Self;
}

impl ListNode for ffi::GList {
    fn data(&self) -> ffi::gpointer {
        self.data
    }

    fn next_node(&self) -> *const Self {
        self.next
    }
}

impl ListNode for ffi::GSList {
    fn data(&self) -> ffi::gpointer {
        self.data
    }

    fn next_node(&self) -> *const Self {
        self.next
    }
}

/// Forward iterator over the data pointers of a linked list.
///
/// Restarting requires the head node again.
pub struct ListIter<'a, N: ListNode> {
    node: *const N,
    phantom: PhantomData<&'a N>,
}

impl<N: ListNode> ListIter<'_, N> {
    /// # Safety
    ///
    /// `head` must be null or the first node of a well-formed list that is
    /// not modified while iterating.
    pub unsafe fn new(head: *const N) -> Self {
        Self {
            node: head,
            phantom: PhantomData,
        }
    }
}

impl<N: ListNode> Iterator for ListIter<'_, N> {
    type Item = ffi::gpointer;

    fn next(&mut self) -> Option<Self::Item> {
        if self.node.is_null() {
            return None;
        }
        let node = unsafe { &*self.node };
        self.node = node.next_node();
        Some(node.data())
    }
}

impl<N: ListNode> FusedIterator for ListIter<'_, N> {}

impl TypedView<'_, kind::UriHandler> {
    /// URI schemes the handler supports.
    pub fn protocols(&self) -> Vec<String> {
        let api = self.registry().api();
        unsafe { strv_to_vec(api.gst_uri_handler_get_protocols(self.as_ptr())) }
    }
}

impl TypedView<'_, kind::Registry> {
    /// Names of all plugins known to the registry.
    pub fn plugin_names(&self) -> Vec<String> {
        let registry = self.registry();
        let api = registry.api();
        let list = unsafe { api.gst_registry_get_plugin_list(self.as_ptr()) };

        let names = unsafe { ListIter::new(list.cast_const()) }
            .filter_map(|data| {
                let handle = unsafe { Handle::instance(data) }?;
                match registry.cast::<kind::Plugin>(&handle) {
                    Ok(plugin) => unsafe { cstr_to_string(api.gst_plugin_get_name(plugin.as_ptr())) },
                    Err(error) => {
                        debug!("Skipping registry entry: {}", error);
                        None
                    }
                }
            })
            .collect();

        unsafe { api.gst_plugin_list_free(list) };
        names
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;

    use super::*;

    #[test]
    fn strings_stop_at_null() {
        let owned = [CString::new("file").unwrap(), CString::new("http").unwrap()];
        let strv = [owned[0].as_ptr(), owned[1].as_ptr(), std::ptr::null()];
        assert_eq!(unsafe { strv_to_vec(strv.as_ptr()) }, vec!["file", "http"]);
        assert_eq!(unsafe { terminated_len(strv.as_ptr()) }, 2);
    }

    #[test]
    fn null_array_is_empty() {
        let strv: *const *const c_char = std::ptr::null();
        assert!(unsafe { strv_to_vec(strv) }.is_empty());
        assert_eq!(unsafe { terminated_len(strv) }, 0);
    }

    #[test]
    fn enum_table_stops_at_sentinel() {
        let names = [c"GST_STATE_NULL", c"GST_STATE_READY"];
        let nicks = [c"null", c"ready"];
        let table = [
            ffi::GEnumValue {
                value: 1,
                value_name: names[0].as_ptr(),
                value_nick: nicks[0].as_ptr(),
            },
            ffi::GEnumValue {
                value: 2,
                value_name: names[1].as_ptr(),
                value_nick: nicks[1].as_ptr(),
            },
            ffi::GEnumValue {
                value: 0,
                value_name: std::ptr::null(),
                value_nick: std::ptr::null(),
            },
        ];
        let values: Vec<_> = unsafe { NullTerminated::new(table.as_ptr()) }
            .map(|entry| entry.value)
            .collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn iterator_is_fused_after_terminator() {
        let strv = [std::ptr::null::<c_char>()];
        let mut iter = unsafe { NullTerminated::new(strv.as_ptr()) };
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn list_yields_data_in_order() {
        let mut values = [10u32, 20, 30];
        let mut nodes: Vec<ffi::GSList> = values
            .iter_mut()
            .map(|value| ffi::GSList {
                data: (value as *mut u32).cast(),
                next: std::ptr::null_mut(),
            })
            .collect();
        let base = nodes.as_mut_ptr();
        for index in 0..nodes.len() - 1 {
            unsafe { (*base.add(index)).next = base.add(index + 1) };
        }

        let seen: Vec<u32> = unsafe { ListIter::new(base.cast_const()) }
            .map(|data| unsafe { *data.cast::<u32>() })
            .collect();
        assert_eq!(seen, vec![10, 20, 30]);

        let empty = unsafe { ListIter::<ffi::GList>::new(std::ptr::null()) };
        assert_eq!(empty.count(), 0);
    }
}
