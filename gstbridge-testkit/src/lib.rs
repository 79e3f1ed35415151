// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! In-process reference runtime for testing `gstbridge`.
//!
//! Implements every entry point of [`gstbridge_sys::NativeFunctions`] against
//! a small process-wide model of the GLib type system and the GStreamer
//! objects the boundary touches. Tests build native objects with the helpers
//! exported here, hand them to `gstbridge` through [`native_api`], and
//! observe the side effects (reference counts, copies, outstanding
//! allocations, installed watches).
//!
//! The model is shared by all tests of a process; register types under unique
//! names.

use std::sync::Arc;

use gstbridge_sys::{NativeApi, NativeFunctions};

mod mini;
mod objects;
mod params;
mod state;
mod structure;
mod types;

pub use mini::{
    Probe, buffer_list_buffers, mini_refcount, new_buffer, new_buffer_list, new_caps,
    new_message, new_mini_object, new_toc_entry, probe,
};
pub use objects::{
    dispatch, has_watch, new_buffer_pool, new_bus, new_object, new_registry, new_uri_handler,
    object_refcount, outstanding_plugin_lists, registry_add_entry, set_flushing, set_object_flags,
};
pub use params::{ParamBuilder, install_property, param, register_enum, register_flags};
pub use structure::{
    new_structure, structure_set_boolean, structure_set_boxed, structure_set_int,
    structure_set_string,
};
pub use types::{
    add_interface, class_pointer, class_ref_count, outstanding_allocations, quark_from_string,
    register_interface, register_type, type_from_name,
};

/// The runtime's function table.
pub fn functions() -> NativeFunctions {
    NativeFunctions {
        g_type_from_name: types::g_type_from_name,
        g_type_name: types::g_type_name,
        g_type_is_a: types::g_type_is_a,
        g_type_fundamental: types::g_type_fundamental,
        g_type_class_ref: types::g_type_class_ref,
        g_type_class_unref: types::g_type_class_unref,
        g_free: types::g_free,
        g_quark_to_string: types::g_quark_to_string,
        g_param_spec_get_nick: params::g_param_spec_get_nick,
        g_param_spec_get_blurb: params::g_param_spec_get_blurb,
        g_param_spec_get_redirect_target: params::g_param_spec_get_redirect_target,
        g_object_class_list_properties: params::g_object_class_list_properties,
        g_value_get_boxed: structure::g_value_get_boxed,
        g_strdup_value_contents: structure::g_strdup_value_contents,
        gst_object_ref: objects::gst_object_ref,
        gst_object_unref: objects::gst_object_unref,
        gst_object_get_name: objects::gst_object_get_name,
        gst_mini_object_ref: mini::gst_mini_object_ref,
        gst_mini_object_unref: mini::gst_mini_object_unref,
        gst_mini_object_is_writable: mini::gst_mini_object_is_writable,
        gst_mini_object_make_writable: mini::gst_mini_object_make_writable,
        gst_mini_object_copy: mini::gst_mini_object_copy,
        gst_buffer_list_insert: mini::gst_buffer_list_insert,
        gst_buffer_list_length: mini::gst_buffer_list_length,
        gst_toc_entry_get_entry_type: mini::gst_toc_entry_get_entry_type,
        gst_toc_entry_get_uid: mini::gst_toc_entry_get_uid,
        gst_structure_foreach: structure::gst_structure_foreach,
        gst_bus_add_watch_full: objects::gst_bus_add_watch_full,
        gst_bus_remove_watch: objects::gst_bus_remove_watch,
        gst_uri_handler_get_protocols: objects::gst_uri_handler_get_protocols,
        gst_registry_get_plugin_list: objects::gst_registry_get_plugin_list,
        gst_plugin_get_name: objects::gst_plugin_get_name,
        gst_plugin_list_free: objects::gst_plugin_list_free,
    }
}

/// A native API handle backed by this runtime.
pub fn native_api() -> Arc<NativeApi> {
    Arc::new(NativeApi::from_functions(functions()))
}
