// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Loading the native function table.

use std::{
    ffi::{CStr, OsStr},
    os::raw::c_char,
    sync::Arc,
};

pub use gstbridge_sys::NativeApi;

use crate::Result;

/// Shared handle to the native entry points.
pub type ApiHandle = Arc<NativeApi>;

/// Loads the GStreamer core library and resolves the entry points used by
/// this crate.
///
/// The library must already be initialised by the host (`gst_init`) before
/// any handle is adapted.
///
/// # Errors
///
/// Returns [`crate::Error::LibLoading`] if the library cannot be opened or a
/// symbol is missing.
pub fn load_api<P: AsRef<OsStr>>(path: P) -> Result<ApiHandle> {
    // Safety: the symbols are resolved with the signatures of the GStreamer
    // 1.x C API, which is what `path` is expected to provide.
    let api = unsafe { NativeApi::load(path)? };
    Ok(Arc::new(api))
}

/// Copies a borrowed C string, `None` for null.
pub(crate) unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Copies and releases a C string owned by the caller (`transfer full`).
pub(crate) unsafe fn take_gstring(api: &NativeApi, ptr: *mut c_char) -> Option<String> {
    let value = unsafe { cstr_to_string(ptr) };
    if !ptr.is_null() {
        unsafe { api.g_free(ptr.cast()) };
    }
    value
}
