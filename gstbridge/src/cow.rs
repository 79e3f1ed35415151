// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Copy-on-write discipline for shared mini objects.
//!
//! Buffers, buffer lists, caps, contexts, events, tag lists, tocs and toc
//! entries are shared by reference counting and may only be mutated while
//! exclusively owned. [`MiniObjectRef`] holds one native reference;
//! [`MiniObjectRef::make_writable`] promotes a shared reference to an
//! exclusive one (copying only when needed) and [`MiniObjectRef::get_mut`]
//! hands out the [`WriteAccess`] every mutator requires.

use std::{
    marker::PhantomData,
    os::raw::c_int,
    ptr::NonNull,
    sync::atomic::{AtomicI32, Ordering},
};

use gstbridge_sys as ffi;
use tracing::{debug, trace};

use crate::{
    Error, Handle, Result, TypeRegistry, TypedView,
    api::cstr_to_string,
    kind::{self, CopyOnWrite, MiniObjectKind},
};

/// An owned reference to a mini object of kind `K`.
///
/// Cloning takes another native reference (an alias); dropping releases one.
pub struct MiniObjectRef<K: MiniObjectKind> {
    registry: TypeRegistry,
    ptr: NonNull<K::Ffi>,
}

/// Safety: mini object reference counts are atomic and mutation requires
/// exclusive ownership (checked by [`MiniObjectRef::get_mut`]).
unsafe impl<K: MiniObjectKind> Send for MiniObjectRef<K> {}
/// Safety: shared access is read-only.
unsafe impl<K: MiniObjectKind> Sync for MiniObjectRef<K> {}

impl<K: MiniObjectKind> MiniObjectRef<K> {
    /// Takes ownership of a reference the caller holds (`transfer full`).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] for a null pointer, or any cast error if the
    /// object is not a `K`. On error the reference stays with the caller.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point at a live mini object the caller owns one
    /// reference to.
    pub unsafe fn from_full(registry: &TypeRegistry, ptr: *mut K::Ffi) -> Result<Self> {
        let handle = unsafe { Handle::mini_object(ptr) }.ok_or(Error::InvalidHandle)?;
        let view = registry.cast::<K>(&handle)?;
        Ok(Self {
            registry: registry.clone(),
            ptr: NonNull::new(view.as_ptr()).ok_or(Error::InvalidHandle)?,
        })
    }

    /// Takes a new reference to the object behind `view`.
    pub fn from_view(view: &TypedView<'_, K>) -> Self {
        let api = view.registry().api();
        unsafe { api.gst_mini_object_ref(view.as_ptr().cast()) };
        Self {
            registry: view.registry().clone(),
            ptr: view.handle().as_non_null().cast(),
        }
    }

    pub fn as_ptr(&self) -> *mut K::Ffi {
        self.ptr.as_ptr()
    }

    /// Gives the reference back to the caller without releasing it.
    pub fn into_raw(self) -> *mut K::Ffi {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// A read-only view of the object.
    pub fn view(&self) -> TypedView<'_, K> {
        let gtype = unsafe { (*self.mini()).type_ };
        TypedView::from_non_null(&self.registry, self.ptr, gtype)
    }

    /// Current native reference count.
    pub fn refcount(&self) -> i32 {
        unsafe { AtomicI32::from_ptr(&raw mut (*self.mini()).refcount) }.load(Ordering::Acquire)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn mini(&self) -> *mut ffi::GstMiniObject {
        self.ptr.as_ptr().cast()
    }
}

impl<K: CopyOnWrite> MiniObjectRef<K> {
    /// Returns `true` if this is the only reference to the object.
    pub fn is_writable(&self) -> bool {
        unsafe {
            self.registry
                .api()
                .gst_mini_object_is_writable(self.mini())
                != ffi::GFALSE
        }
    }

    /// Promotes the reference to an exclusively owned object.
    ///
    /// When already writable the same object is returned untouched. Otherwise
    /// the object is deep copied, the reference to the original is released and
    /// the copy is returned; other aliases keep seeing the original.
    ///
    /// # Errors
    ///
    /// [`Error::Other`] if the native copy fails.
    pub fn make_writable(self) -> Result<Self> {
        if self.is_writable() {
            trace!("{} already writable", K::KIND.name());
            return Ok(self);
        }

        let registry = self.registry.clone();
        let original = self.into_raw();
        let writable =
            unsafe { registry.api().gst_mini_object_make_writable(original.cast()) };
        let ptr = NonNull::new(writable.cast::<K::Ffi>())
            .ok_or_else(|| Error::Other(format!("Failed to copy {}", K::KIND.name())))?;
        debug!("Copied shared {} to make it writable", K::KIND.name());
        Ok(Self { registry, ptr })
    }

    /// Grants mutable access.
    ///
    /// # Errors
    ///
    /// [`Error::NotWritable`] if another reference to the object exists.
    pub fn get_mut(&mut self) -> Result<WriteAccess<'_, K>> {
        if !self.is_writable() {
            return Err(Error::NotWritable {
                kind: K::KIND.name(),
            });
        }
        Ok(WriteAccess {
            ptr: self.ptr,
            phantom: PhantomData,
        })
    }

    /// Deep copies the object into a new, exclusively owned reference.
    ///
    /// # Errors
    ///
    /// [`Error::Other`] if the native copy fails.
    pub fn copy(&self) -> Result<Self> {
        let copy = unsafe { self.registry.api().gst_mini_object_copy(self.mini()) };
        let ptr = NonNull::new(copy.cast::<K::Ffi>())
            .ok_or_else(|| Error::Other(format!("Failed to copy {}", K::KIND.name())))?;
        debug!("Deep copied {}", K::KIND.name());
        Ok(Self {
            registry: self.registry.clone(),
            ptr,
        })
    }
}

impl<K: MiniObjectKind> Clone for MiniObjectRef<K> {
    fn clone(&self) -> Self {
        unsafe { self.registry.api().gst_mini_object_ref(self.mini()) };
        Self {
            registry: self.registry.clone(),
            ptr: self.ptr,
        }
    }
}

impl<K: MiniObjectKind> Drop for MiniObjectRef<K> {
    fn drop(&mut self) {
        unsafe { self.registry.api().gst_mini_object_unref(self.mini()) };
    }
}

impl<K: MiniObjectKind> std::fmt::Debug for MiniObjectRef<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniObjectRef")
            .field("kind", &K::KIND)
            .field("ptr", &self.ptr)
            .field("refcount", &self.refcount())
            .finish()
    }
}

/// Proof of exclusive ownership, borrowed from a writable [`MiniObjectRef`].
pub struct WriteAccess<'a, K: CopyOnWrite> {
    ptr: NonNull<K::Ffi>,
    phantom: PhantomData<&'a mut MiniObjectRef<K>>,
}

impl<K: CopyOnWrite> WriteAccess<'_, K> {
    pub fn as_ptr(&self) -> *mut K::Ffi {
        self.ptr.as_ptr()
    }

    fn mini(&mut self) -> &mut ffi::GstMiniObject {
        unsafe { &mut *self.ptr.as_ptr().cast::<ffi::GstMiniObject>() }
    }
}

bitflags::bitflags! {
    /// Buffer flags (`GstBufferFlags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferFlags: u32 {
        const LIVE = ffi::GST_BUFFER_FLAG_LIVE;
        const DECODE_ONLY = ffi::GST_BUFFER_FLAG_DECODE_ONLY;
        const DISCONT = ffi::GST_BUFFER_FLAG_DISCONT;
        const RESYNC = ffi::GST_BUFFER_FLAG_RESYNC;
        const CORRUPTED = ffi::GST_BUFFER_FLAG_CORRUPTED;
        const MARKER = ffi::GST_BUFFER_FLAG_MARKER;
        const HEADER = ffi::GST_BUFFER_FLAG_HEADER;
        const GAP = ffi::GST_BUFFER_FLAG_GAP;
        const DROPPABLE = ffi::GST_BUFFER_FLAG_DROPPABLE;
        const DELTA_UNIT = ffi::GST_BUFFER_FLAG_DELTA_UNIT;
    }
}

fn clock_time(value: u64) -> Option<u64> {
    (value != ffi::GST_CLOCK_TIME_NONE).then_some(value)
}

fn raw_clock_time(value: Option<u64>) -> u64 {
    value.unwrap_or(ffi::GST_CLOCK_TIME_NONE)
}

impl TypedView<'_, kind::Buffer> {
    fn buffer(&self) -> &ffi::GstBuffer {
        unsafe { &*self.as_ptr() }
    }

    /// Presentation timestamp in nanoseconds.
    pub fn pts(&self) -> Option<u64> {
        clock_time(self.buffer().pts)
    }

    /// Decoding timestamp in nanoseconds.
    pub fn dts(&self) -> Option<u64> {
        clock_time(self.buffer().dts)
    }

    pub fn duration(&self) -> Option<u64> {
        clock_time(self.buffer().duration)
    }

    pub fn offset(&self) -> Option<u64> {
        clock_time(self.buffer().offset)
    }

    pub fn offset_end(&self) -> Option<u64> {
        clock_time(self.buffer().offset_end)
    }

    pub fn flags(&self) -> BufferFlags {
        BufferFlags::from_bits_truncate(self.buffer().mini_object.flags)
    }
}

impl MiniObjectRef<kind::Buffer> {
    pub fn pts(&self) -> Option<u64> {
        self.view().pts()
    }

    pub fn dts(&self) -> Option<u64> {
        self.view().dts()
    }

    pub fn duration(&self) -> Option<u64> {
        self.view().duration()
    }

    pub fn flags(&self) -> BufferFlags {
        self.view().flags()
    }
}

impl WriteAccess<'_, kind::Buffer> {
    fn buffer(&mut self) -> &mut ffi::GstBuffer {
        unsafe { &mut *self.as_ptr() }
    }

    pub fn set_pts(&mut self, pts: Option<u64>) {
        self.buffer().pts = raw_clock_time(pts);
    }

    pub fn set_dts(&mut self, dts: Option<u64>) {
        self.buffer().dts = raw_clock_time(dts);
    }

    pub fn set_duration(&mut self, duration: Option<u64>) {
        self.buffer().duration = raw_clock_time(duration);
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.buffer().offset = raw_clock_time(offset);
    }

    pub fn set_offset_end(&mut self, offset_end: Option<u64>) {
        self.buffer().offset_end = raw_clock_time(offset_end);
    }

    pub fn set_flags(&mut self, flags: BufferFlags) {
        self.mini().flags |= flags.bits();
    }

    pub fn unset_flags(&mut self, flags: BufferFlags) {
        self.mini().flags &= !flags.bits();
    }
}

impl TypedView<'_, kind::BufferList> {
    /// Number of buffers in the list.
    pub fn len(&self) -> usize {
        unsafe { self.registry().api().gst_buffer_list_length(self.as_ptr()) as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MiniObjectRef<kind::BufferList> {
    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WriteAccess<'_, kind::BufferList> {
    /// Appends `buffer`, transferring its reference to the list.
    pub fn add(&mut self, buffer: MiniObjectRef<kind::Buffer>) {
        let api = buffer.registry().api().clone();
        unsafe { api.gst_buffer_list_insert(self.as_ptr(), -1, buffer.into_raw()) };
    }
}

/// Kind of a table-of-contents entry.
///
/// Negative values group alternatives, positive values sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TocEntryType {
    Angle,
    Version,
    Edition,
    Invalid,
    Title,
    Track,
    Chapter,
}

impl TocEntryType {
    pub fn from_raw(value: ffi::GstTocEntryType) -> Self {
        match value {
            ffi::GST_TOC_ENTRY_TYPE_ANGLE => Self::Angle,
            ffi::GST_TOC_ENTRY_TYPE_VERSION => Self::Version,
            ffi::GST_TOC_ENTRY_TYPE_EDITION => Self::Edition,
            ffi::GST_TOC_ENTRY_TYPE_TITLE => Self::Title,
            ffi::GST_TOC_ENTRY_TYPE_TRACK => Self::Track,
            ffi::GST_TOC_ENTRY_TYPE_CHAPTER => Self::Chapter,
            _ => Self::Invalid,
        }
    }

    pub fn as_raw(self) -> ffi::GstTocEntryType {
        match self {
            Self::Angle => ffi::GST_TOC_ENTRY_TYPE_ANGLE,
            Self::Version => ffi::GST_TOC_ENTRY_TYPE_VERSION,
            Self::Edition => ffi::GST_TOC_ENTRY_TYPE_EDITION,
            Self::Invalid => ffi::GST_TOC_ENTRY_TYPE_INVALID,
            Self::Title => ffi::GST_TOC_ENTRY_TYPE_TITLE,
            Self::Track => ffi::GST_TOC_ENTRY_TYPE_TRACK,
            Self::Chapter => ffi::GST_TOC_ENTRY_TYPE_CHAPTER,
        }
    }

    /// Entries of this type are alternatives of each other (angles, versions, editions).
    pub fn is_alternative(self) -> bool {
        self.as_raw() < 0
    }

    /// Entries of this type follow each other (titles, tracks, chapters).
    pub fn is_sequence(self) -> bool {
        self.as_raw() > 0
    }

    pub fn nick(self) -> &'static str {
        match self {
            Self::Angle => "angle",
            Self::Version => "version",
            Self::Edition => "edition",
            Self::Invalid => "invalid",
            Self::Title => "title",
            Self::Track => "track",
            Self::Chapter => "chapter",
        }
    }
}

impl std::fmt::Display for TocEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.nick())
    }
}

impl TypedView<'_, kind::TocEntry> {
    pub fn entry_type(&self) -> TocEntryType {
        let raw = unsafe {
            self.registry()
                .api()
                .gst_toc_entry_get_entry_type(self.as_ptr())
        };
        TocEntryType::from_raw(raw)
    }

    pub fn uid(&self) -> Option<String> {
        unsafe { cstr_to_string(self.registry().api().gst_toc_entry_get_uid(self.as_ptr())) }
    }
}

impl TypedView<'_, kind::BufferPool> {
    /// Returns `true` while the pool is flushing.
    pub fn is_flushing(&self) -> bool {
        let pool = self.as_ptr();
        let flushing: *mut c_int = unsafe { &raw mut (*pool).flushing };
        unsafe { AtomicI32::from_ptr(flushing) }.load(Ordering::SeqCst) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_entry_type_groups() {
        assert!(TocEntryType::Angle.is_alternative());
        assert!(TocEntryType::Edition.is_alternative());
        assert!(TocEntryType::Chapter.is_sequence());
        assert!(!TocEntryType::Invalid.is_alternative());
        assert!(!TocEntryType::Invalid.is_sequence());
        assert_eq!(TocEntryType::from_raw(42), TocEntryType::Invalid);
        assert_eq!(TocEntryType::from_raw(2), TocEntryType::Track);
        assert_eq!(TocEntryType::Version.to_string(), "version");
    }

    #[test]
    fn buffer_flags_sit_above_mini_object_flags() {
        assert_eq!(BufferFlags::LIVE.bits(), 1 << 4);
        assert_eq!(BufferFlags::DELTA_UNIT.bits(), 1 << 13);
        assert_eq!(
            BufferFlags::from_bits_truncate(0b11 | (1 << 6)),
            BufferFlags::DISCONT
        );
    }

    #[test]
    fn missing_clock_time_maps_to_none() {
        assert_eq!(clock_time(ffi::GST_CLOCK_TIME_NONE), None);
        assert_eq!(clock_time(40), Some(40));
        assert_eq!(raw_clock_time(None), ffi::GST_CLOCK_TIME_NONE);
    }
}
