// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # gstbridge
//!
//! A safe adaptation boundary between Rust and the reference-counted,
//! dynamically typed GStreamer object model.
//!
//! ## Overview
//!
//! Native objects reach Rust as opaque pointers. This crate wraps the raw
//! layouts and entry points of [`gstbridge_sys`] with checked casts, the
//! copy-on-write discipline, property introspection, sequence iteration and
//! callback trampolines.
//!
//! ### Key Concepts
//!
//! - **Handle**: an opaque pointer plus the layout family it was declared with ([`Handle`])
//! - **Kind**: a marker type naming a native type and its layout ([`kind`])
//! - **Typed view**: a handle whose dynamic type tag was checked against a kind ([`TypedView`])
//! - **Owned reference**: one native reference to a mini object ([`MiniObjectRef`])
//! - **Descriptor**: the classification of a property ([`ParamDescriptor`])
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ TypeRegistry │  (kind -> GType cache)
//! └──────┬───────┘
//!        │
//!        ├─► cast::<K>(&Handle) ──► TypedView<K>
//!        │                           ├─► MiniObjectRef<K> ──► WriteAccess<K>
//!        │                           ├─► fold_fields / protocols / plugin_names
//!        │                           └─► BusWatch::add
//!        │
//!        └─► ParamIntrospector ──► classify / describe / properties
//! ```
//!
//! ## Examples
//!
//! ### Checking and promoting a buffer
//!
//! ```no_run
//! use gstbridge::{Handle, MiniObjectRef, TypeRegistry, config::get_library_path, kind, load_api};
//!
//! # fn main() -> Result<(), gstbridge::Error> {
//! # let raw_buffer: *mut std::ffi::c_void = std::ptr::null_mut();
//! let registry = TypeRegistry::new(load_api(get_library_path())?);
//!
//! let handle = unsafe { Handle::mini_object(raw_buffer) }.ok_or(gstbridge::Error::InvalidHandle)?;
//! let buffer = registry.cast::<kind::Buffer>(&handle)?;
//!
//! // Take our own reference and make sure nobody else sees the change
//! let mut owned = MiniObjectRef::from_view(&buffer).make_writable()?;
//! owned.get_mut()?.set_pts(Some(40_000_000));
//! # Ok(())
//! # }
//! ```
//!
//! ### Inspecting properties
//!
//! ```no_run
//! use gstbridge::{Handle, ParamIntrospector, TypeRegistry, kind};
//!
//! # fn example(registry: TypeRegistry, handle: Handle) -> Result<(), gstbridge::Error> {
//! let introspector = ParamIntrospector::new(registry.clone());
//! let element = registry.cast::<kind::GObject>(&handle)?;
//! for property in introspector.properties(&element)? {
//!     println!("{} ({})", property.name, property.flags.gst_flags_string());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! - [`TypeRegistry`] and [`ParamIntrospector`] are `Send + Sync`
//! - [`MiniObjectRef`] is `Send + Sync`; mutation needs `&mut` and exclusive ownership
//! - [`TypedView`] borrows the native object and is neither `Send` nor `Sync`
//! - Bus watch closures must be `Send`; they run on the thread dispatching the bus

mod api;
mod cast;
mod cow;
mod error;
mod handle;
mod param;
mod seq;
mod trampoline;

pub mod config;
pub mod kind;

pub use api::{ApiHandle, NativeApi, load_api};
pub use cast::{ClassView, TypeRegistry, TypedView};
pub use cow::{BufferFlags, MiniObjectRef, TocEntryType, WriteAccess};
pub use error::{Error, Result};
pub use handle::Handle;
pub use kind::{CopyOnWrite, Kind, Layout, MiniObjectKind, NativeKind, ObjectKind};
pub use param::{
    EnumValueEntry, FlagsValueEntry, NumericRange, ParamDescriptor, ParamFlags, ParamIntrospector,
    PropertyInfo,
};
pub use seq::{ListIter, ListNode, NullTerminated, Terminated, strv_to_vec, terminated_len};
pub use trampoline::{
    BusHandler, BusWatch, FieldRef, MessageType, UserDataToken, ValueRef, bus_watch_trampoline,
    is_registered, register_bus_handler, unregister,
};
