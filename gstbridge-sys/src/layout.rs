// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Native structure layouts, scalar aliases and constants.
//!
//! Field names follow the C headers (with `type` spelled `type_`). Structures
//! whose contents are never read are declared opaque.

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub type gboolean = c_int;
pub type gpointer = *mut c_void;
pub type gconstpointer = *const c_void;
pub type GType = usize;
pub type GQuark = u32;
pub type GstClockTime = u64;
pub type GstTocEntryType = c_int;
pub type GstMessageType = c_uint;
pub type GstEventType = c_int;
pub type GstQueryType = c_int;

pub const GFALSE: gboolean = 0;
pub const GTRUE: gboolean = 1;

pub const GST_CLOCK_TIME_NONE: GstClockTime = u64::MAX;
pub const G_PRIORITY_DEFAULT: c_int = 0;

// Fundamental types (index << G_TYPE_FUNDAMENTAL_SHIFT).
pub const G_TYPE_FUNDAMENTAL_SHIFT: usize = 2;
pub const G_TYPE_INVALID: GType = 0;
pub const G_TYPE_NONE: GType = 1 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_INTERFACE: GType = 2 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_CHAR: GType = 3 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_UCHAR: GType = 4 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_BOOLEAN: GType = 5 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_INT: GType = 6 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_UINT: GType = 7 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_LONG: GType = 8 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_ULONG: GType = 9 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_INT64: GType = 10 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_UINT64: GType = 11 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_ENUM: GType = 12 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_FLAGS: GType = 13 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_FLOAT: GType = 14 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_DOUBLE: GType = 15 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_STRING: GType = 16 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_POINTER: GType = 17 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_BOXED: GType = 18 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_PARAM: GType = 19 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_OBJECT: GType = 20 << G_TYPE_FUNDAMENTAL_SHIFT;
pub const G_TYPE_VARIANT: GType = 21 << G_TYPE_FUNDAMENTAL_SHIFT;

// GParamFlags
pub const G_PARAM_READABLE: c_uint = 1 << 0;
pub const G_PARAM_WRITABLE: c_uint = 1 << 1;
pub const G_PARAM_CONSTRUCT: c_uint = 1 << 2;
pub const G_PARAM_CONSTRUCT_ONLY: c_uint = 1 << 3;
pub const G_PARAM_LAX_VALIDATION: c_uint = 1 << 4;
pub const G_PARAM_STATIC_NAME: c_uint = 1 << 5;
pub const G_PARAM_STATIC_NICK: c_uint = 1 << 6;
pub const G_PARAM_STATIC_BLURB: c_uint = 1 << 7;
pub const G_PARAM_EXPLICIT_NOTIFY: c_uint = 1 << 30;
pub const G_PARAM_DEPRECATED: c_uint = 1 << 31;
pub const GST_PARAM_CONTROLLABLE: c_uint = 1 << 9;
pub const GST_PARAM_MUTABLE_READY: c_uint = 1 << 10;
pub const GST_PARAM_MUTABLE_PAUSED: c_uint = 1 << 11;
pub const GST_PARAM_MUTABLE_PLAYING: c_uint = 1 << 12;
pub const GST_PARAM_DOC_SHOW_DEFAULT: c_uint = 1 << 13;
pub const GST_PARAM_CONDITIONALLY_AVAILABLE: c_uint = 1 << 14;

// GstMiniObjectFlags / GstBufferFlags
pub const GST_MINI_OBJECT_FLAG_LOCKABLE: c_uint = 1 << 0;
pub const GST_MINI_OBJECT_FLAG_LOCK_READONLY: c_uint = 1 << 1;
pub const GST_MINI_OBJECT_FLAG_MAY_BE_LEAKED: c_uint = 1 << 2;
pub const GST_MINI_OBJECT_FLAG_LAST: c_uint = 1 << 4;
pub const GST_BUFFER_FLAG_LIVE: c_uint = GST_MINI_OBJECT_FLAG_LAST << 0;
pub const GST_BUFFER_FLAG_DECODE_ONLY: c_uint = GST_MINI_OBJECT_FLAG_LAST << 1;
pub const GST_BUFFER_FLAG_DISCONT: c_uint = GST_MINI_OBJECT_FLAG_LAST << 2;
pub const GST_BUFFER_FLAG_RESYNC: c_uint = GST_MINI_OBJECT_FLAG_LAST << 3;
pub const GST_BUFFER_FLAG_CORRUPTED: c_uint = GST_MINI_OBJECT_FLAG_LAST << 4;
pub const GST_BUFFER_FLAG_MARKER: c_uint = GST_MINI_OBJECT_FLAG_LAST << 5;
pub const GST_BUFFER_FLAG_HEADER: c_uint = GST_MINI_OBJECT_FLAG_LAST << 6;
pub const GST_BUFFER_FLAG_GAP: c_uint = GST_MINI_OBJECT_FLAG_LAST << 7;
pub const GST_BUFFER_FLAG_DROPPABLE: c_uint = GST_MINI_OBJECT_FLAG_LAST << 8;
pub const GST_BUFFER_FLAG_DELTA_UNIT: c_uint = GST_MINI_OBJECT_FLAG_LAST << 9;

// GstObjectFlags / GstElementFlags
pub const GST_OBJECT_FLAG_MAY_BE_LEAKED: u32 = 1 << 0;
pub const GST_OBJECT_FLAG_CONSTRUCTED: u32 = 1 << 1;
pub const GST_OBJECT_FLAG_LAST: u32 = 1 << 4;
pub const GST_ELEMENT_FLAG_LOCKED_STATE: u32 = GST_OBJECT_FLAG_LAST << 0;
pub const GST_ELEMENT_FLAG_SINK: u32 = GST_OBJECT_FLAG_LAST << 1;
pub const GST_ELEMENT_FLAG_SOURCE: u32 = GST_OBJECT_FLAG_LAST << 2;
pub const GST_ELEMENT_FLAG_PROVIDE_CLOCK: u32 = GST_OBJECT_FLAG_LAST << 3;
pub const GST_ELEMENT_FLAG_REQUIRE_CLOCK: u32 = GST_OBJECT_FLAG_LAST << 4;
pub const GST_ELEMENT_FLAG_INDEXABLE: u32 = GST_OBJECT_FLAG_LAST << 5;

// GstMessageType
pub const GST_MESSAGE_UNKNOWN: GstMessageType = 0;
pub const GST_MESSAGE_EOS: GstMessageType = 1 << 0;
pub const GST_MESSAGE_ERROR: GstMessageType = 1 << 1;
pub const GST_MESSAGE_WARNING: GstMessageType = 1 << 2;
pub const GST_MESSAGE_INFO: GstMessageType = 1 << 3;
pub const GST_MESSAGE_TAG: GstMessageType = 1 << 4;
pub const GST_MESSAGE_BUFFERING: GstMessageType = 1 << 5;
pub const GST_MESSAGE_STATE_CHANGED: GstMessageType = 1 << 6;
pub const GST_MESSAGE_STATE_DIRTY: GstMessageType = 1 << 7;
pub const GST_MESSAGE_STEP_DONE: GstMessageType = 1 << 8;
pub const GST_MESSAGE_CLOCK_PROVIDE: GstMessageType = 1 << 9;
pub const GST_MESSAGE_CLOCK_LOST: GstMessageType = 1 << 10;
pub const GST_MESSAGE_NEW_CLOCK: GstMessageType = 1 << 11;
pub const GST_MESSAGE_STRUCTURE_CHANGE: GstMessageType = 1 << 12;
pub const GST_MESSAGE_STREAM_STATUS: GstMessageType = 1 << 13;
pub const GST_MESSAGE_APPLICATION: GstMessageType = 1 << 14;
pub const GST_MESSAGE_ELEMENT: GstMessageType = 1 << 15;
pub const GST_MESSAGE_SEGMENT_START: GstMessageType = 1 << 16;
pub const GST_MESSAGE_SEGMENT_DONE: GstMessageType = 1 << 17;
pub const GST_MESSAGE_DURATION_CHANGED: GstMessageType = 1 << 18;
pub const GST_MESSAGE_LATENCY: GstMessageType = 1 << 19;
pub const GST_MESSAGE_ASYNC_START: GstMessageType = 1 << 20;
pub const GST_MESSAGE_ASYNC_DONE: GstMessageType = 1 << 21;
pub const GST_MESSAGE_REQUEST_STATE: GstMessageType = 1 << 22;
pub const GST_MESSAGE_STEP_START: GstMessageType = 1 << 23;
pub const GST_MESSAGE_QOS: GstMessageType = 1 << 24;
pub const GST_MESSAGE_PROGRESS: GstMessageType = 1 << 25;
pub const GST_MESSAGE_TOC: GstMessageType = 1 << 26;
pub const GST_MESSAGE_RESET_TIME: GstMessageType = 1 << 27;
pub const GST_MESSAGE_STREAM_START: GstMessageType = 1 << 28;
pub const GST_MESSAGE_NEED_CONTEXT: GstMessageType = 1 << 29;
pub const GST_MESSAGE_HAVE_CONTEXT: GstMessageType = 1 << 30;

// GstTocEntryType
pub const GST_TOC_ENTRY_TYPE_ANGLE: GstTocEntryType = -3;
pub const GST_TOC_ENTRY_TYPE_VERSION: GstTocEntryType = -2;
pub const GST_TOC_ENTRY_TYPE_EDITION: GstTocEntryType = -1;
pub const GST_TOC_ENTRY_TYPE_INVALID: GstTocEntryType = 0;
pub const GST_TOC_ENTRY_TYPE_TITLE: GstTocEntryType = 1;
pub const GST_TOC_ENTRY_TYPE_TRACK: GstTocEntryType = 2;
pub const GST_TOC_ENTRY_TYPE_CHAPTER: GstTocEntryType = 3;

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: core::marker::PhantomData<(*mut u8, core::marker::PhantomPinned)>,
            }
        )*
    };
}

opaque!(
    GData,
    GstAllocator,
    GstBin,
    GstBus,
    GstChildProxy,
    GstClock,
    GstDevice,
    GstElement,
    GstElementFactory,
    GstGhostPad,
    GstPad,
    GstPadTemplate,
    GstPipeline,
    GstPlugin,
    GstPluginFeature,
    GstProxyPad,
    GstRegistry,
    GstStream,
    GstStreamCollection,
    GstTask,
    GstTaskPool,
    GstAppSink,
    GstAppSrc,
    GstBaseSink,
    GstBaseSrc,
    GstPushSrc,
    /// Interface instance; only ever handled by pointer.
    GstURIHandler,
    GstTagSetter,
    GstTocSetter,
);

// ---------------------------------------------------------------------------
// GType system
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GTypeClass {
    pub g_type: GType,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GTypeInstance {
    pub g_class: *mut GTypeClass,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GObject {
    pub g_type_instance: GTypeInstance,
    pub ref_count: c_uint,
    pub qdata: *mut GData,
}

/// Leading part of `GObjectClass`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GObjectClass {
    pub g_type_class: GTypeClass,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub union GMutex {
    pub p: gpointer,
    pub i: [c_uint; 2],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GCond {
    pub p: gpointer,
    pub i: [c_uint; 2],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GstObject {
    pub object: GObject,
    pub lock: GMutex,
    pub name: *mut c_char,
    pub parent: *mut GstObject,
    pub flags: u32,
    pub control_bindings: *mut GList,
    pub control_rate: u64,
    pub last_sync: u64,
    pub _gst_reserved: gpointer,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GstBufferPool {
    pub object: GstObject,
    pub flushing: c_int,
    pub priv_: gpointer,
    pub _gst_reserved: [gpointer; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GValue {
    pub g_type: GType,
    pub data: [u64; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GList {
    pub data: gpointer,
    pub next: *mut GList,
    pub prev: *mut GList,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GSList {
    pub data: gpointer,
    pub next: *mut GSList,
}

// ---------------------------------------------------------------------------
// Enum and flags classes
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GEnumValue {
    pub value: c_int,
    pub value_name: *const c_char,
    pub value_nick: *const c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GFlagsValue {
    pub value: c_uint,
    pub value_name: *const c_char,
    pub value_nick: *const c_char,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GEnumClass {
    pub g_type_class: GTypeClass,
    pub minimum: c_int,
    pub maximum: c_int,
    pub n_values: c_uint,
    pub values: *mut GEnumValue,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GFlagsClass {
    pub g_type_class: GTypeClass,
    pub mask: c_uint,
    pub n_values: c_uint,
    pub values: *mut GFlagsValue,
}

// ---------------------------------------------------------------------------
// Parameter specifications
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpec {
    pub g_type_instance: GTypeInstance,
    pub name: *const c_char,
    pub flags: c_uint,
    pub value_type: GType,
    pub owner_type: GType,
    pub _nick: *mut c_char,
    pub _blurb: *mut c_char,
    pub qdata: *mut GData,
    pub ref_count: c_uint,
    pub param_id: c_uint,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecBoolean {
    pub parent_instance: GParamSpec,
    pub default_value: gboolean,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecInt {
    pub parent_instance: GParamSpec,
    pub minimum: c_int,
    pub maximum: c_int,
    pub default_value: c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecUInt {
    pub parent_instance: GParamSpec,
    pub minimum: c_uint,
    pub maximum: c_uint,
    pub default_value: c_uint,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecInt64 {
    pub parent_instance: GParamSpec,
    pub minimum: i64,
    pub maximum: i64,
    pub default_value: i64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecUInt64 {
    pub parent_instance: GParamSpec,
    pub minimum: u64,
    pub maximum: u64,
    pub default_value: u64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecFloat {
    pub parent_instance: GParamSpec,
    pub minimum: f32,
    pub maximum: f32,
    pub default_value: f32,
    pub epsilon: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecDouble {
    pub parent_instance: GParamSpec,
    pub minimum: f64,
    pub maximum: f64,
    pub default_value: f64,
    pub epsilon: f64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecString {
    pub parent_instance: GParamSpec,
    pub default_value: *mut c_char,
    pub cset_first: *mut c_char,
    pub cset_nth: *mut c_char,
    pub substitutor: c_char,
    /// `null_fold_if_empty : 1` and `ensure_non_null : 1` bitfields.
    pub bitfields: c_uint,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecEnum {
    pub parent_instance: GParamSpec,
    pub enum_class: *mut GEnumClass,
    pub default_value: c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecFlags {
    pub parent_instance: GParamSpec,
    pub flags_class: *mut GFlagsClass,
    pub default_value: c_uint,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecValueArray {
    pub parent_instance: GParamSpec,
    pub element_spec: *mut GParamSpec,
    pub fixed_n_elements: c_uint,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GParamSpecOverride {
    pub parent_instance: GParamSpec,
    pub overridden: *mut GParamSpec,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstParamSpecFraction {
    pub parent_instance: GParamSpec,
    pub min_num: c_int,
    pub min_den: c_int,
    pub max_num: c_int,
    pub max_den: c_int,
    pub def_num: c_int,
    pub def_den: c_int,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstParamSpecArray {
    pub parent_instance: GParamSpec,
    pub element_spec: *mut GParamSpec,
}

// ---------------------------------------------------------------------------
// Mini objects
// ---------------------------------------------------------------------------

pub type GstMiniObjectCopyFunction =
    unsafe extern "C" fn(obj: *const GstMiniObject) -> *mut GstMiniObject;
pub type GstMiniObjectDisposeFunction = unsafe extern "C" fn(obj: *mut GstMiniObject) -> gboolean;
pub type GstMiniObjectFreeFunction = unsafe extern "C" fn(obj: *mut GstMiniObject);

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstMiniObject {
    pub type_: GType,
    pub refcount: c_int,
    pub lockstate: c_int,
    pub flags: c_uint,
    pub copy: Option<GstMiniObjectCopyFunction>,
    pub dispose: Option<GstMiniObjectDisposeFunction>,
    pub free: Option<GstMiniObjectFreeFunction>,
    pub priv_uint: c_uint,
    pub priv_pointer: gpointer,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstBuffer {
    pub mini_object: GstMiniObject,
    pub pool: *mut GstBufferPool,
    pub pts: GstClockTime,
    pub dts: GstClockTime,
    pub duration: GstClockTime,
    pub offset: u64,
    pub offset_end: u64,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstEvent {
    pub mini_object: GstMiniObject,
    pub type_: GstEventType,
    pub timestamp: u64,
    pub seqnum: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct GstMessage {
    pub mini_object: GstMiniObject,
    pub type_: GstMessageType,
    pub timestamp: u64,
    pub src: *mut GstObject,
    pub seqnum: u32,
    pub lock: GMutex,
    pub cond: GCond,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstQuery {
    pub mini_object: GstMiniObject,
    pub type_: GstQueryType,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstMemory {
    pub mini_object: GstMiniObject,
    pub allocator: *mut GstAllocator,
    pub parent: *mut GstMemory,
    pub maxsize: usize,
    pub align: usize,
    pub offset: usize,
    pub size: usize,
}

macro_rules! mini_object_layout {
    ($($name:ident),* $(,)?) => {
        $(
            /// Leading `GstMiniObject`; the remainder is private.
            #[repr(C)]
            #[derive(Debug, Copy, Clone)]
            pub struct $name {
                pub mini_object: GstMiniObject,
            }
        )*
    };
}

mini_object_layout!(
    GstBufferList,
    GstCaps,
    GstContext,
    GstSample,
    GstTagList,
    GstToc,
    GstTocEntry,
    GstUri,
);

// ---------------------------------------------------------------------------
// Boxed types with a leading GType
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstStructure {
    pub type_: GType,
    pub name: GQuark,
}

/// Leading field of the private `GstCapsFeatures`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstCapsFeatures {
    pub type_: GType,
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

pub type GDestroyNotify = unsafe extern "C" fn(data: gpointer);
pub type GstBusFunc =
    unsafe extern "C" fn(bus: *mut GstBus, message: *mut GstMessage, user_data: gpointer) -> gboolean;
pub type GstStructureForeachFunc =
    unsafe extern "C" fn(field_id: GQuark, value: *const GValue, user_data: gpointer) -> gboolean;
