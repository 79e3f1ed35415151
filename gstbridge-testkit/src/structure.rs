// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Structures and values.

use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
    ptr,
};

use gstbridge_sys::*;

use crate::state::{state, strdup};

#[repr(C)]
struct FakeStructure {
    header: GstStructure,
    fields: Vec<(GQuark, Box<GValue>)>,
    strings: Vec<CString>,
}

unsafe fn fake<'a>(structure: *const GstStructure) -> &'a mut FakeStructure {
    unsafe { &mut *structure.cast::<FakeStructure>().cast_mut() }
}

fn expose<T>(ptr: *const T) -> u64 {
    ptr.expose_provenance() as u64
}

/// A new, empty structure named `name`. Structures are never freed.
pub fn new_structure(name: &str) -> *mut GstStructure {
    let (gtype, quark) = {
        let mut state = state();
        (state.lookup("GstStructure"), state.quark(name))
    };
    let structure = Box::new(FakeStructure {
        header: GstStructure {
            type_: gtype,
            name: quark,
        },
        fields: Vec::new(),
        strings: Vec::new(),
    });
    Box::into_raw(structure).cast()
}

fn set(structure: *mut GstStructure, field: &str, value: GValue) {
    let quark = state().quark(field);
    let fields = &mut unsafe { fake(structure) }.fields;
    match fields.iter_mut().find(|(id, _)| *id == quark) {
        Some((_, existing)) => **existing = value,
        None => fields.push((quark, Box::new(value))),
    }
}

pub fn structure_set_int(structure: *mut GstStructure, field: &str, value: i32) {
    set(
        structure,
        field,
        GValue {
            g_type: G_TYPE_INT,
            data: [value as i64 as u64, 0],
        },
    );
}

pub fn structure_set_boolean(structure: *mut GstStructure, field: &str, value: bool) {
    set(
        structure,
        field,
        GValue {
            g_type: G_TYPE_BOOLEAN,
            data: [value as u64, 0],
        },
    );
}

/// `None` stores a NULL string.
pub fn structure_set_string(structure: *mut GstStructure, field: &str, value: Option<&str>) {
    let data = match value.and_then(|value| CString::new(value).ok()) {
        Some(value) => {
            let strings = &mut unsafe { fake(structure) }.strings;
            strings.push(value);
            strings.last().map_or(0, |value| expose(value.as_ptr()))
        }
        None => 0,
    };
    set(
        structure,
        field,
        GValue {
            g_type: G_TYPE_STRING,
            data: [data, 0],
        },
    );
}

/// Stores a boxed value of `type_name`; the structure takes over the caller's
/// reference to `boxed`.
pub fn structure_set_boxed<T>(structure: *mut GstStructure, field: &str, type_name: &str, boxed: *mut T) {
    let g_type = state().lookup(type_name);
    set(
        structure,
        field,
        GValue {
            g_type,
            data: [expose(boxed.cast_const()), 0],
        },
    );
}

pub(crate) unsafe extern "C" fn gst_structure_foreach(
    structure: *const GstStructure,
    func: GstStructureForeachFunc,
    user_data: gpointer,
) -> gboolean {
    let fields: Vec<(GQuark, *const GValue)> = unsafe { fake(structure) }
        .fields
        .iter()
        .map(|(id, value)| (*id, &raw const **value))
        .collect();
    for (id, value) in fields {
        if unsafe { func(id, value, user_data) } == GFALSE {
            return GFALSE;
        }
    }
    GTRUE
}

pub(crate) unsafe extern "C" fn g_value_get_boxed(value: *const GValue) -> gpointer {
    ptr::with_exposed_provenance_mut(unsafe { (*value).data[0] } as usize)
}

pub(crate) unsafe extern "C" fn g_strdup_value_contents(value: *const GValue) -> *mut c_char {
    let value = unsafe { &*value };
    let (fundamental, type_name) = {
        let state = state();
        (state.fundamental(value.g_type), state.type_name(value.g_type))
    };
    let contents = match fundamental {
        G_TYPE_INT => (value.data[0] as i32).to_string(),
        G_TYPE_BOOLEAN => String::from(if value.data[0] != 0 { "TRUE" } else { "FALSE" }),
        G_TYPE_STRING => {
            let ptr: *const c_char = ptr::with_exposed_provenance(value.data[0] as usize);
            if ptr.is_null() {
                "NULL".to_string()
            } else {
                format!("\"{}\"", unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
            }
        }
        G_TYPE_BOXED => format!("(({type_name}*) {:#x})", value.data[0]),
        _ => format!("<{type_name}>"),
    };
    strdup(&contents)
}
