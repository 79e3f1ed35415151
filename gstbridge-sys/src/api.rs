// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Native function table.
//!
//! Every entry point the boundary calls is listed once in the `native_api!`
//! invocation below. The macro expands to:
//! - [`NativeFunctions`], a plain table of `extern "C"` function pointers
//! - a loader resolving each symbol from a shared library (all symbols are
//!   required; a missing one fails the load)
//! - one `unsafe` forwarding method per entry on [`NativeApi`]

use std::os::raw::{c_char, c_int, c_uint};

use crate::layout::*;

macro_rules! native_api {
    ($(fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;)*) => {
        /// Table of native entry points.
        #[derive(Debug, Copy, Clone)]
        pub struct NativeFunctions {
            $(pub $name: unsafe extern "C" fn($($ty),*) $(-> $ret)?,)*
        }

        impl NativeFunctions {
            /// Resolves every entry point from `library`.
            ///
            /// # Safety
            ///
            /// The library must export the symbols with the C signatures
            /// declared in this module.
            pub unsafe fn load(library: &libloading::Library) -> Result<Self, libloading::Error> {
                unsafe {
                    Ok(Self {
                        $($name: *library.get::<unsafe extern "C" fn($($ty),*) $(-> $ret)?>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )?,)*
                    })
                }
            }
        }

        impl NativeApi {
            $(
                #[inline]
                pub unsafe fn $name(&self, $($arg: $ty),*) $(-> $ret)? {
                    unsafe { (self.functions.$name)($($arg),*) }
                }
            )*
        }
    };
}

native_api! {
    // GLib / GObject type system
    fn g_type_from_name(name: *const c_char) -> GType;
    fn g_type_name(gtype: GType) -> *const c_char;
    fn g_type_is_a(gtype: GType, is_a_type: GType) -> gboolean;
    fn g_type_fundamental(gtype: GType) -> GType;
    fn g_type_class_ref(gtype: GType) -> gpointer;
    fn g_type_class_unref(class: gpointer);
    fn g_free(mem: gpointer);
    fn g_quark_to_string(quark: GQuark) -> *const c_char;
    fn g_param_spec_get_nick(pspec: *mut GParamSpec) -> *const c_char;
    fn g_param_spec_get_blurb(pspec: *mut GParamSpec) -> *const c_char;
    fn g_param_spec_get_redirect_target(pspec: *mut GParamSpec) -> *mut GParamSpec;
    fn g_object_class_list_properties(class: *mut GObjectClass, n_properties: *mut c_uint) -> *mut *mut GParamSpec;
    fn g_value_get_boxed(value: *const GValue) -> gpointer;
    fn g_strdup_value_contents(value: *const GValue) -> *mut c_char;

    // GstObject
    fn gst_object_ref(object: gpointer) -> gpointer;
    fn gst_object_unref(object: gpointer);
    fn gst_object_get_name(object: *mut GstObject) -> *mut c_char;

    // GstMiniObject
    fn gst_mini_object_ref(mini_object: *mut GstMiniObject) -> *mut GstMiniObject;
    fn gst_mini_object_unref(mini_object: *mut GstMiniObject);
    fn gst_mini_object_is_writable(mini_object: *const GstMiniObject) -> gboolean;
    fn gst_mini_object_make_writable(mini_object: *mut GstMiniObject) -> *mut GstMiniObject;
    fn gst_mini_object_copy(mini_object: *const GstMiniObject) -> *mut GstMiniObject;

    // Buffer lists and TOC
    fn gst_buffer_list_insert(list: *mut GstBufferList, idx: c_int, buffer: *mut GstBuffer);
    fn gst_buffer_list_length(list: *mut GstBufferList) -> c_uint;
    fn gst_toc_entry_get_entry_type(entry: *const GstTocEntry) -> GstTocEntryType;
    fn gst_toc_entry_get_uid(entry: *const GstTocEntry) -> *const c_char;

    // Structures and buses
    fn gst_structure_foreach(structure: *const GstStructure, func: GstStructureForeachFunc, user_data: gpointer) -> gboolean;
    fn gst_bus_add_watch_full(bus: *mut GstBus, priority: c_int, func: GstBusFunc, user_data: gpointer, notify: Option<GDestroyNotify>) -> c_uint;
    fn gst_bus_remove_watch(bus: *mut GstBus) -> gboolean;

    // Registry and URI handlers
    fn gst_uri_handler_get_protocols(handler: *mut GstURIHandler) -> *const *const c_char;
    fn gst_registry_get_plugin_list(registry: *mut GstRegistry) -> *mut GList;
    fn gst_plugin_get_name(plugin: *mut GstPlugin) -> *const c_char;
    fn gst_plugin_list_free(list: *mut GList);
}

/// Handle to the native entry points.
///
/// Either owns the shared library the functions were resolved from
/// ([`NativeApi::load`]) or wraps a table supplied by the caller
/// ([`NativeApi::from_functions`]), e.g. an in-process runtime.
pub struct NativeApi {
    functions: NativeFunctions,
    _library: Option<libloading::Library>,
}

impl NativeApi {
    /// Opens `path` and resolves all entry points.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. `path` must name a GStreamer
    /// core library (which links GObject and GLib).
    pub unsafe fn load<P: AsRef<std::ffi::OsStr>>(path: P) -> Result<Self, libloading::Error> {
        unsafe {
            let library = libloading::Library::new(path)?;
            let functions = NativeFunctions::load(&library)?;
            Ok(Self {
                functions,
                _library: Some(library),
            })
        }
    }

    /// Wraps an already resolved table.
    pub fn from_functions(functions: NativeFunctions) -> Self {
        Self {
            functions,
            _library: None,
        }
    }
}

impl std::fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeApi")
            .field("loaded", &self._library.is_some())
            .finish_non_exhaustive()
    }
}
