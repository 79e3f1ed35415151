// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! `GstObject` instances: elements, buses, buffer pools, registries and
//! plugins.
//!
//! Instances are never freed; only their reference count is tracked.

use std::{
    ffi::{CStr, CString},
    os::raw::{c_char, c_int, c_uint},
    ptr,
    sync::atomic::{AtomicI32, AtomicU32, Ordering},
};

use gstbridge_sys::*;
use tracing::{debug, trace};

use crate::state::{Watch, state, strdup};

#[repr(C)]
union Header {
    object: GstObject,
    pool: GstBufferPool,
    _pad: [u64; 32],
}

struct Extra {
    /// Null-terminated.
    protocols: Vec<*const c_char>,
    /// Registry entries (`GstObject*`).
    entries: Vec<usize>,
}

#[repr(C)]
struct FakeInstance {
    header: Header,
    extra: Extra,
}

unsafe fn fake<'a, T>(instance: *const T) -> &'a mut FakeInstance {
    unsafe { &mut *instance.cast::<FakeInstance>().cast_mut() }
}

/// A new instance of the registered `type_name` (a `GstObject` descendant)
/// with one reference.
pub fn new_object(type_name: &str, name: &str) -> *mut GstObject {
    let class = {
        let mut state = state();
        let gtype = state.lookup(type_name);
        state.class_of(gtype)
    };
    let name = CString::new(name).map_or(ptr::null_mut(), CString::into_raw);

    let mut header = Header { _pad: [0; 32] };
    let object = unsafe { &mut header.object };
    object.object.g_type_instance.g_class = class;
    object.object.ref_count = 1;
    object.name = name;

    let instance = Box::new(FakeInstance {
        header,
        extra: Extra {
            protocols: vec![ptr::null()],
            entries: Vec::new(),
        },
    });
    trace!("Created {} instance", type_name);
    Box::into_raw(instance).cast()
}

pub fn new_bus(name: &str) -> *mut GstBus {
    new_object("GstBus", name).cast()
}

pub fn new_buffer_pool(name: &str) -> *mut GstBufferPool {
    new_object("GstBufferPool", name).cast()
}

pub fn set_flushing(pool: *mut GstBufferPool, flushing: bool) {
    unsafe { AtomicI32::from_ptr(&raw mut (*pool).flushing) }
        .store(flushing as c_int, Ordering::SeqCst);
}

pub fn set_object_flags(object: *mut GstObject, flags: u32) {
    unsafe { (*object).flags = flags };
}

/// A new instance of `type_name` (which must implement `GstURIHandler`)
/// supporting `protocols`.
pub fn new_uri_handler(type_name: &str, name: &str, protocols: &[&str]) -> *mut GstObject {
    let object = new_object(type_name, name);
    let extra = &mut unsafe { fake(object) }.extra;
    extra.protocols = protocols
        .iter()
        .filter_map(|protocol| CString::new(*protocol).ok())
        .map(|protocol| protocol.into_raw().cast_const())
        .chain(std::iter::once(ptr::null()))
        .collect();
    object
}

/// A new registry holding `plugins`, each named after its entry.
pub fn new_registry(name: &str, plugins: &[&str]) -> *mut GstRegistry {
    let registry = new_object("GstRegistry", name);
    for plugin in plugins {
        registry_add_entry(registry.cast(), new_object("GstPlugin", plugin));
    }
    registry.cast()
}

/// Appends any object to the registry's plugin list.
pub fn registry_add_entry(registry: *mut GstRegistry, entry: *mut GstObject) {
    unsafe { fake(registry) }.extra.entries.push(entry as usize);
}

pub fn object_refcount<T>(object: *const T) -> u32 {
    unsafe { AtomicU32::from_ptr(&raw mut (*object.cast::<GObject>().cast_mut()).ref_count) }
        .load(Ordering::SeqCst)
}

/// Plugin lists handed out for `registry` and not yet freed.
pub fn outstanding_plugin_lists(registry: *const GstRegistry) -> usize {
    state()
        .plugin_lists
        .values()
        .filter(|owner| **owner == registry as usize)
        .count()
}

pub fn has_watch(bus: *const GstBus) -> bool {
    state().watches.contains_key(&(bus as usize))
}

/// Delivers `message` to the watch installed on `bus`, like one main loop
/// iteration would.
///
/// Returns `None` if no watch is installed, otherwise whether the watch asked
/// to stay installed. A watch returning `FALSE` is removed.
pub fn dispatch(bus: *mut GstBus, message: *mut GstMessage) -> Option<bool> {
    let watch = state().watches.get(&(bus as usize)).copied()?;
    let keep = unsafe { (watch.func)(bus, message, watch.user_data as gpointer) } != GFALSE;
    if !keep {
        let removed = {
            let mut state = state();
            match state.watches.get(&(bus as usize)) {
                Some(current) if current.source_id == watch.source_id => {
                    state.watches.remove(&(bus as usize))
                }
                _ => None,
            }
        };
        if let Some(removed) = removed {
            debug!("Watch source {} returned FALSE", removed.source_id);
            notify(removed);
        }
    }
    Some(keep)
}

fn notify(watch: Watch) {
    if let Some(notify) = watch.notify {
        unsafe { notify(watch.user_data as gpointer) };
    }
}

fn gobject_refcount(object: gpointer) -> &'static AtomicU32 {
    unsafe { AtomicU32::from_ptr(&raw mut (*object.cast::<GObject>()).ref_count) }
}

pub(crate) unsafe extern "C" fn gst_object_ref(object: gpointer) -> gpointer {
    gobject_refcount(object).fetch_add(1, Ordering::AcqRel);
    object
}

pub(crate) unsafe extern "C" fn gst_object_unref(object: gpointer) {
    let previous = gobject_refcount(object).fetch_sub(1, Ordering::AcqRel);
    if previous == 1 {
        trace!("Last reference to {:p} released", object);
    }
}

pub(crate) unsafe extern "C" fn gst_object_get_name(object: *mut GstObject) -> *mut c_char {
    let name = unsafe { (*object).name };
    if name.is_null() {
        return ptr::null_mut();
    }
    strdup(&unsafe { CStr::from_ptr(name) }.to_string_lossy())
}

pub(crate) unsafe extern "C" fn gst_uri_handler_get_protocols(
    handler: *mut GstURIHandler,
) -> *const *const c_char {
    unsafe { fake(handler) }.extra.protocols.as_ptr()
}

pub(crate) unsafe extern "C" fn gst_registry_get_plugin_list(
    registry: *mut GstRegistry,
) -> *mut GList {
    let entries = unsafe { fake(registry) }.extra.entries.clone();
    let mut head: *mut GList = ptr::null_mut();
    for entry in entries.iter().rev() {
        unsafe { gst_object_ref(*entry as gpointer) };
        let node = Box::new(GList {
            data: *entry as gpointer,
            next: head,
            prev: ptr::null_mut(),
        });
        let node = Box::into_raw(node);
        if !head.is_null() {
            unsafe { (*head).prev = node };
        }
        head = node;
    }
    if !head.is_null() {
        state()
            .plugin_lists
            .insert(head as usize, registry as usize);
    }
    head
}

pub(crate) unsafe extern "C" fn gst_plugin_get_name(plugin: *mut GstPlugin) -> *const c_char {
    unsafe { (*plugin.cast::<GstObject>()).name }
}

pub(crate) unsafe extern "C" fn gst_plugin_list_free(list: *mut GList) {
    if list.is_null() {
        return;
    }
    state().plugin_lists.remove(&(list as usize));
    let mut node = list;
    while !node.is_null() {
        let owned = unsafe { Box::from_raw(node) };
        unsafe { gst_object_unref(owned.data) };
        node = owned.next;
    }
}

pub(crate) unsafe extern "C" fn gst_bus_add_watch_full(
    bus: *mut GstBus,
    _priority: c_int,
    func: GstBusFunc,
    user_data: gpointer,
    notify: Option<GDestroyNotify>,
) -> c_uint {
    let mut state = state();
    if state.watches.contains_key(&(bus as usize)) {
        debug!("Bus {:p} already has a watch", bus);
        return 0;
    }
    let source_id = state.next_source;
    state.next_source += 1;
    state.watches.insert(
        bus as usize,
        Watch {
            func,
            user_data: user_data as usize,
            notify,
            source_id,
        },
    );
    source_id
}

pub(crate) unsafe extern "C" fn gst_bus_remove_watch(bus: *mut GstBus) -> gboolean {
    let removed = state().watches.remove(&(bus as usize));
    match removed {
        Some(watch) => {
            notify(watch);
            GTRUE
        }
        None => GFALSE,
    }
}
