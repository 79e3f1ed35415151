// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Mini objects: buffers, buffer lists, caps, toc entries and messages.
//!
//! Every mini object carries a [`Probe`] shared with its copies, so tests can
//! observe how often an object family was copied and freed.

use std::{
    ffi::CString,
    os::raw::{c_char, c_int, c_uint},
    ptr,
    sync::{
        Arc,
        atomic::{AtomicI32, AtomicUsize, Ordering},
    },
};

use gstbridge_sys::*;
use tracing::trace;

use crate::state::state;

/// Copy and free counters shared by an object and all of its copies.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    copies: Arc<AtomicUsize>,
    frees: Arc<AtomicUsize>,
}

impl Probe {
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
union Header {
    mini: GstMiniObject,
    buffer: GstBuffer,
    event: GstEvent,
    message: GstMessage,
    _pad: [u64; 24],
}

#[derive(Clone)]
struct Extra {
    probe: Probe,
    /// Buffers owned by a buffer list.
    buffers: Vec<usize>,
    entry_type: GstTocEntryType,
    uid: Option<CString>,
}

#[repr(C)]
struct FakeMini {
    header: Header,
    extra: Extra,
}

unsafe fn fake<'a>(mini: *const GstMiniObject) -> &'a mut FakeMini {
    unsafe { &mut *mini.cast::<FakeMini>().cast_mut() }
}

fn refcount(mini: *mut GstMiniObject) -> &'static AtomicI32 {
    unsafe { AtomicI32::from_ptr(&raw mut (*mini).refcount) }
}

unsafe extern "C" fn copy_mini(mini: *const GstMiniObject) -> *mut GstMiniObject {
    let original = unsafe { fake(mini) };
    for buffer in &original.extra.buffers {
        unsafe { gst_mini_object_ref(*buffer as *mut GstMiniObject) };
    }
    original.extra.probe.copies.fetch_add(1, Ordering::SeqCst);

    let mut copy = Box::new(FakeMini {
        header: original.header,
        extra: original.extra.clone(),
    });
    let header = unsafe { &mut copy.header.mini };
    header.refcount = 1;
    header.lockstate = 0;
    trace!("Copied mini object {:p}", mini);
    Box::into_raw(copy).cast()
}

unsafe extern "C" fn free_mini(mini: *mut GstMiniObject) {
    let owned = unsafe { Box::from_raw(mini.cast::<FakeMini>()) };
    for buffer in &owned.extra.buffers {
        unsafe { gst_mini_object_unref(*buffer as *mut GstMiniObject) };
    }
    owned.extra.probe.frees.fetch_add(1, Ordering::SeqCst);
    trace!("Freed mini object {:p}", mini);
}

fn new_mini(type_name: &str, init: impl FnOnce(&mut Header)) -> *mut GstMiniObject {
    let gtype = state().lookup(type_name);
    let mut header = Header { _pad: [0; 24] };
    header.mini = GstMiniObject {
        type_: gtype,
        refcount: 1,
        lockstate: 0,
        flags: 0,
        copy: Some(copy_mini),
        dispose: None,
        free: Some(free_mini),
        priv_uint: 0,
        priv_pointer: ptr::null_mut(),
    };
    init(&mut header);

    let mini = Box::new(FakeMini {
        header,
        extra: Extra {
            probe: Probe::default(),
            buffers: Vec::new(),
            entry_type: GST_TOC_ENTRY_TYPE_INVALID,
            uid: None,
        },
    });
    Box::into_raw(mini).cast()
}

/// A new buffer with no timestamps, owned by the caller.
pub fn new_buffer() -> *mut GstBuffer {
    new_mini("GstBuffer", |header| unsafe {
        let buffer = &mut header.buffer;
        buffer.pool = ptr::null_mut();
        buffer.pts = GST_CLOCK_TIME_NONE;
        buffer.dts = GST_CLOCK_TIME_NONE;
        buffer.duration = GST_CLOCK_TIME_NONE;
        buffer.offset = GST_CLOCK_TIME_NONE;
        buffer.offset_end = GST_CLOCK_TIME_NONE;
    })
    .cast()
}

pub fn new_buffer_list() -> *mut GstBufferList {
    new_mini("GstBufferList", |_| {}).cast()
}

pub fn new_caps() -> *mut GstCaps {
    new_mini("GstCaps", |_| {}).cast()
}

/// A mini object of any registered type below `GBoxed`.
pub fn new_mini_object(type_name: &str) -> *mut GstMiniObject {
    new_mini(type_name, |_| {})
}

pub fn new_toc_entry(entry_type: GstTocEntryType, uid: &str) -> *mut GstTocEntry {
    let entry = new_mini("GstTocEntry", |_| {});
    let extra = &mut unsafe { fake(entry) }.extra;
    extra.entry_type = entry_type;
    extra.uid = CString::new(uid).ok();
    entry.cast()
}

pub fn new_message(
    type_: GstMessageType,
    src: *mut GstObject,
    seqnum: u32,
) -> *mut GstMessage {
    new_mini("GstMessage", |header| unsafe {
        let message = &mut header.message;
        message.type_ = type_;
        message.timestamp = GST_CLOCK_TIME_NONE;
        message.src = src;
        message.seqnum = seqnum;
    })
    .cast()
}

/// Counters of the object family `mini` belongs to.
pub fn probe<T>(mini: *const T) -> Probe {
    unsafe { fake(mini.cast()) }.extra.probe.clone()
}

pub fn mini_refcount<T>(mini: *const T) -> i32 {
    refcount(mini.cast_mut().cast()).load(Ordering::SeqCst)
}

/// Buffers currently held by `list`, in order.
pub fn buffer_list_buffers(list: *const GstBufferList) -> Vec<*mut GstBuffer> {
    unsafe { fake(list.cast()) }
        .extra
        .buffers
        .iter()
        .map(|buffer| *buffer as *mut GstBuffer)
        .collect()
}

pub(crate) unsafe extern "C" fn gst_mini_object_ref(
    mini_object: *mut GstMiniObject,
) -> *mut GstMiniObject {
    refcount(mini_object).fetch_add(1, Ordering::AcqRel);
    mini_object
}

pub(crate) unsafe extern "C" fn gst_mini_object_unref(mini_object: *mut GstMiniObject) {
    if refcount(mini_object).fetch_sub(1, Ordering::AcqRel) == 1
        && let Some(free) = unsafe { (*mini_object).free }
    {
        unsafe { free(mini_object) };
    }
}

pub(crate) unsafe extern "C" fn gst_mini_object_is_writable(
    mini_object: *const GstMiniObject,
) -> gboolean {
    (refcount(mini_object.cast_mut()).load(Ordering::Acquire) == 1) as gboolean
}

pub(crate) unsafe extern "C" fn gst_mini_object_copy(
    mini_object: *const GstMiniObject,
) -> *mut GstMiniObject {
    match unsafe { (*mini_object).copy } {
        Some(copy) => unsafe { copy(mini_object) },
        None => ptr::null_mut(),
    }
}

pub(crate) unsafe extern "C" fn gst_mini_object_make_writable(
    mini_object: *mut GstMiniObject,
) -> *mut GstMiniObject {
    if unsafe { gst_mini_object_is_writable(mini_object) } != GFALSE {
        return mini_object;
    }
    let copy = unsafe { gst_mini_object_copy(mini_object) };
    unsafe { gst_mini_object_unref(mini_object) };
    copy
}

pub(crate) unsafe extern "C" fn gst_buffer_list_insert(
    list: *mut GstBufferList,
    idx: c_int,
    buffer: *mut GstBuffer,
) {
    let buffers = &mut unsafe { fake(list.cast()) }.extra.buffers;
    match usize::try_from(idx) {
        Ok(idx) if idx < buffers.len() => buffers.insert(idx, buffer as usize),
        _ => buffers.push(buffer as usize),
    }
}

pub(crate) unsafe extern "C" fn gst_buffer_list_length(list: *mut GstBufferList) -> c_uint {
    unsafe { fake(list.cast()) }.extra.buffers.len() as c_uint
}

pub(crate) unsafe extern "C" fn gst_toc_entry_get_entry_type(
    entry: *const GstTocEntry,
) -> GstTocEntryType {
    unsafe { fake(entry.cast()) }.extra.entry_type
}

pub(crate) unsafe extern "C" fn gst_toc_entry_get_uid(entry: *const GstTocEntry) -> *const c_char {
    unsafe { fake(entry.cast()) }
        .extra
        .uid
        .as_ref()
        .map_or(ptr::null(), |uid| uid.as_ptr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_unref_frees() {
        let buffer = new_buffer();
        let counters = probe(buffer);
        unsafe { gst_mini_object_ref(buffer.cast()) };
        assert_eq!(mini_refcount(buffer), 2);
        unsafe { gst_mini_object_unref(buffer.cast()) };
        assert_eq!(counters.frees(), 0);
        unsafe { gst_mini_object_unref(buffer.cast()) };
        assert_eq!(counters.frees(), 1);
    }

    #[test]
    fn make_writable_copies_shared_objects() {
        let caps = new_caps().cast::<GstMiniObject>();
        let counters = probe(caps);
        unsafe { gst_mini_object_ref(caps) };

        let writable = unsafe { gst_mini_object_make_writable(caps) };
        assert_ne!(writable, caps);
        assert_eq!(counters.copies(), 1);
        assert_eq!(mini_refcount(caps), 1);
        assert_eq!(mini_refcount(writable), 1);

        unsafe {
            gst_mini_object_unref(writable);
            gst_mini_object_unref(caps);
        }
        assert_eq!(counters.frees(), 2);
    }

    #[test]
    fn list_owns_its_buffers() {
        let list = new_buffer_list();
        let buffer = new_buffer();
        let counters = probe(buffer);
        unsafe {
            gst_buffer_list_insert(list, -1, buffer);
            assert_eq!(gst_buffer_list_length(list), 1);
            gst_mini_object_unref(list.cast());
        }
        assert_eq!(counters.frees(), 1);
    }
}
