// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Type system, quarks and `g_free`.

use std::{
    ffi::CStr,
    os::raw::c_char,
    ptr,
};

use gstbridge_sys::*;
use tracing::warn;

use crate::state::{Allocation, state};

/// Registers `name` as a subtype of `parent`.
///
/// Registering a known name returns the existing type.
///
/// # Panics
///
/// If `parent` is not registered.
pub fn register_type(name: &str, parent: &str) -> GType {
    state().register(name, parent)
}

/// Registers an interface type.
pub fn register_interface(name: &str) -> GType {
    state().register(name, "GInterface")
}

/// Declares that instances of `instance` implement `interface`.
pub fn add_interface(instance: &str, interface: &str) {
    state().add_interface(instance, interface);
}

/// `G_TYPE_INVALID` for unknown names.
pub fn type_from_name(name: &str) -> GType {
    state().by_name.get(name).copied().unwrap_or(G_TYPE_INVALID)
}

/// The class structure of `name`, allocated on first use.
pub fn class_pointer(name: &str) -> *mut GTypeClass {
    let mut state = state();
    let gtype = state.lookup(name);
    state.class_of(gtype)
}

/// Outstanding `g_type_class_ref` calls on `gtype`.
pub fn class_ref_count(gtype: GType) -> usize {
    state().types.get(&gtype).map_or(0, |node| node.class_refs)
}

pub fn quark_from_string(name: &str) -> GQuark {
    state().quark(name)
}

/// Number of strings and arrays handed out and not yet released with `g_free`.
pub fn outstanding_allocations() -> usize {
    state().allocations.len()
}

pub(crate) unsafe extern "C" fn g_type_from_name(name: *const c_char) -> GType {
    if name.is_null() {
        return G_TYPE_INVALID;
    }
    type_from_name(&unsafe { CStr::from_ptr(name) }.to_string_lossy())
}

pub(crate) unsafe extern "C" fn g_type_name(gtype: GType) -> *const c_char {
    state()
        .types
        .get(&gtype)
        .map_or(ptr::null(), |node| node.name.as_ptr())
}

pub(crate) unsafe extern "C" fn g_type_is_a(gtype: GType, is_a_type: GType) -> gboolean {
    state().is_a(gtype, is_a_type) as gboolean
}

pub(crate) unsafe extern "C" fn g_type_fundamental(gtype: GType) -> GType {
    state().fundamental(gtype)
}

pub(crate) unsafe extern "C" fn g_type_class_ref(gtype: GType) -> gpointer {
    let mut state = state();
    if !state.types.contains_key(&gtype) {
        warn!("g_type_class_ref on unknown type {:#x}", gtype);
        return ptr::null_mut();
    }
    let class = state.class_of(gtype);
    if let Some(node) = state.types.get_mut(&gtype) {
        node.class_refs += 1;
    }
    class.cast()
}

pub(crate) unsafe extern "C" fn g_type_class_unref(class: gpointer) {
    let gtype = unsafe { (*class.cast::<GTypeClass>()).g_type };
    let mut state = state();
    match state.types.get_mut(&gtype) {
        Some(node) if node.class_refs > 0 => node.class_refs -= 1,
        _ => warn!("Unbalanced g_type_class_unref on {:#x}", gtype),
    }
}

pub(crate) unsafe extern "C" fn g_free(mem: gpointer) {
    if mem.is_null() {
        return;
    }
    let allocation = state().allocations.remove(&(mem as usize));
    match allocation {
        Some(Allocation::String) => drop(unsafe { std::ffi::CString::from_raw(mem.cast()) }),
        Some(Allocation::PointerArray(len)) => drop(unsafe {
            Box::from_raw(ptr::slice_from_raw_parts_mut(mem.cast::<usize>(), len))
        }),
        None => warn!("g_free on untracked memory {:p}", mem),
    }
}

pub(crate) unsafe extern "C" fn g_quark_to_string(quark: GQuark) -> *const c_char {
    let state = state();
    quark
        .checked_sub(1)
        .and_then(|index| state.quarks.get(index as usize))
        .map_or(ptr::null(), |name| name.as_ptr())
}
