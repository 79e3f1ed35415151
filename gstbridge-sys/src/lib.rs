// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! # gstbridge-sys: Raw FFI layer for the GLib/GStreamer object model
//!
//! This crate provides the low-level, unsafe Rust view of the native object
//! system that `gstbridge` adapts:
//!
//! - `#[repr(C)]` layouts of the structures whose leading fields the boundary
//!   reads (`GTypeInstance`, `GstMiniObject`, `GParamSpec*`, `GEnumClass`,
//!   `GList`, ...)
//! - Fundamental GType values and flag constants
//! - Callback signatures (`GstBusFunc`, `GstStructureForeachFunc`)
//! - [`NativeApi`], a table of the native entry points, resolved at runtime
//!   with `libloading` or assembled from in-process functions
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe
//! `gstbridge` crate instead, which provides tag-checked casts, the
//! copy-on-write discipline and property introspection.
//!
//! ## Safety
//!
//! Every function reachable through [`NativeApi`] is `unsafe` and requires the
//! caller to uphold the native library's invariants:
//! - The native type system must be initialised before any call
//! - Pointers must reference live objects of the documented layout
//! - Ownership transfer follows the GObject annotations of each function
//! - Null checks are the caller's responsibility
//!
//! Layouts only describe the public, leading part of each structure. Never
//! allocate them by value on behalf of the native library.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

mod api;
mod layout;

pub use api::{NativeApi, NativeFunctions};
pub use layout::*;
