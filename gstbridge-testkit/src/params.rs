// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Param specs, enum and flags classes, and class property lists.
//!
//! # Examples
//!
//! ```
//! use gstbridge_testkit::{install_property, param, register_type};
//!
//! register_type("DocSink", "GstElement");
//! let spec = param("sync").with_flags(gstbridge_sys::G_PARAM_READABLE).boolean(true);
//! install_property("DocSink", spec);
//! ```

use std::{
    ffi::CString,
    os::raw::{c_char, c_uint},
    ptr,
};

use gstbridge_sys::*;

use crate::state::{alloc_pointer_array, state};

#[repr(C)]
union Storage {
    base: GParamSpec,
    boolean: GParamSpecBoolean,
    int: GParamSpecInt,
    uint: GParamSpecUInt,
    int64: GParamSpecInt64,
    uint64: GParamSpecUInt64,
    float: GParamSpecFloat,
    double: GParamSpecDouble,
    string: GParamSpecString,
    enumeration: GParamSpecEnum,
    flags: GParamSpecFlags,
    value_array: GParamSpecValueArray,
    fraction: GstParamSpecFraction,
    array: GstParamSpecArray,
    redirect: GParamSpecOverride,
    _pad: [u64; 16],
}

fn leak_str(value: &str) -> *mut c_char {
    CString::new(value).map_or(ptr::null_mut(), CString::into_raw)
}

/// Starts building a param spec named `name`.
pub fn param(name: &str) -> ParamBuilder {
    ParamBuilder {
        name: name.to_string(),
        nick: None,
        blurb: None,
        flags: G_PARAM_READABLE | G_PARAM_WRITABLE,
    }
}

/// Builder for leaked, static param specs.
///
/// Readable and writable unless [`ParamBuilder::with_flags`] says otherwise.
#[derive(Debug, Clone)]
pub struct ParamBuilder {
    name: String,
    nick: Option<String>,
    blurb: Option<String>,
    flags: c_uint,
}

impl ParamBuilder {
    pub fn with_nick(mut self, nick: &str) -> Self {
        self.nick = Some(nick.to_string());
        self
    }

    pub fn with_blurb(mut self, blurb: &str) -> Self {
        self.blurb = Some(blurb.to_string());
        self
    }

    pub fn with_flags(mut self, flags: c_uint) -> Self {
        self.flags = flags;
        self
    }

    fn build(self, param_type: &str, value_type: GType, init: impl FnOnce(&mut Storage)) -> *mut GParamSpec {
        let class = {
            let mut state = state();
            let gtype = state.lookup(param_type);
            state.class_of(gtype)
        };

        let mut storage = Storage { _pad: [0; 16] };
        storage.base = GParamSpec {
            g_type_instance: GTypeInstance { g_class: class },
            name: leak_str(&self.name).cast_const(),
            flags: self.flags,
            value_type,
            owner_type: G_TYPE_INVALID,
            _nick: self.nick.as_deref().map_or(ptr::null_mut(), leak_str),
            _blurb: self.blurb.as_deref().map_or(ptr::null_mut(), leak_str),
            qdata: ptr::null_mut(),
            ref_count: 1,
            param_id: 0,
        };
        init(&mut storage);
        Box::into_raw(Box::new(storage)).cast()
    }

    pub fn boolean(self, default: bool) -> *mut GParamSpec {
        self.build("GParamBoolean", G_TYPE_BOOLEAN, |s| unsafe {
            s.boolean.default_value = default as gboolean;
        })
    }

    pub fn int(self, min: i32, max: i32, default: i32) -> *mut GParamSpec {
        self.build("GParamInt", G_TYPE_INT, |s| unsafe {
            s.int.minimum = min;
            s.int.maximum = max;
            s.int.default_value = default;
        })
    }

    pub fn uint(self, min: u32, max: u32, default: u32) -> *mut GParamSpec {
        self.build("GParamUInt", G_TYPE_UINT, |s| unsafe {
            s.uint.minimum = min;
            s.uint.maximum = max;
            s.uint.default_value = default;
        })
    }

    pub fn int64(self, min: i64, max: i64, default: i64) -> *mut GParamSpec {
        self.build("GParamInt64", G_TYPE_INT64, |s| unsafe {
            s.int64.minimum = min;
            s.int64.maximum = max;
            s.int64.default_value = default;
        })
    }

    pub fn uint64(self, min: u64, max: u64, default: u64) -> *mut GParamSpec {
        self.build("GParamUInt64", G_TYPE_UINT64, |s| unsafe {
            s.uint64.minimum = min;
            s.uint64.maximum = max;
            s.uint64.default_value = default;
        })
    }

    pub fn float(self, min: f32, max: f32, default: f32) -> *mut GParamSpec {
        self.build("GParamFloat", G_TYPE_FLOAT, |s| unsafe {
            s.float.minimum = min;
            s.float.maximum = max;
            s.float.default_value = default;
        })
    }

    pub fn double(self, min: f64, max: f64, default: f64) -> *mut GParamSpec {
        self.build("GParamDouble", G_TYPE_DOUBLE, |s| unsafe {
            s.double.minimum = min;
            s.double.maximum = max;
            s.double.default_value = default;
        })
    }

    pub fn string(self, default: Option<&str>) -> *mut GParamSpec {
        self.build("GParamString", G_TYPE_STRING, |s| unsafe {
            s.string.default_value = default.map_or(ptr::null_mut(), leak_str);
        })
    }

    /// A spec of the enum type `enum_type`, see [`register_enum`].
    pub fn enumeration(self, enum_type: GType, default: i32) -> *mut GParamSpec {
        let class = state().class_of(enum_type).cast::<GEnumClass>();
        self.build("GParamEnum", enum_type, |s| unsafe {
            s.enumeration.enum_class = class;
            s.enumeration.default_value = default;
        })
    }

    /// A spec of the flags type `flags_type`, see [`register_flags`].
    pub fn flags(self, flags_type: GType, default: u32) -> *mut GParamSpec {
        let class = state().class_of(flags_type).cast::<GFlagsClass>();
        self.build("GParamFlags", flags_type, |s| unsafe {
            s.flags.flags_class = class;
            s.flags.default_value = default;
        })
    }

    pub fn object(self, type_name: &str) -> *mut GParamSpec {
        let value_type = state().lookup(type_name);
        self.build("GParamObject", value_type, |_| {})
    }

    pub fn boxed(self, type_name: &str) -> *mut GParamSpec {
        let value_type = state().lookup(type_name);
        self.build("GParamBoxed", value_type, |_| {})
    }

    /// `type_name` of `None` declares an untyped `gpointer`.
    pub fn pointer(self, type_name: Option<&str>) -> *mut GParamSpec {
        let value_type = type_name.map_or(G_TYPE_POINTER, |name| state().lookup(name));
        self.build("GParamPointer", value_type, |_| {})
    }

    pub fn fraction(self, min: (i32, i32), max: (i32, i32), default: (i32, i32)) -> *mut GParamSpec {
        let value_type = state().lookup("GstFraction");
        self.build("GstParamFraction", value_type, |s| unsafe {
            let f = &mut s.fraction;
            (f.min_num, f.min_den) = min;
            (f.max_num, f.max_den) = max;
            (f.def_num, f.def_den) = default;
        })
    }

    /// A `GValueArray` spec whose elements follow `element`.
    pub fn value_array(self, element: *mut GParamSpec) -> *mut GParamSpec {
        let value_type = state().lookup("GValueArray");
        self.build("GParamValueArray", value_type, |s| unsafe {
            s.value_array.element_spec = element;
        })
    }

    /// A `GstValueArray` spec whose elements follow `element`.
    pub fn gst_array(self, element: *mut GParamSpec) -> *mut GParamSpec {
        let value_type = state().lookup("GstValueArray");
        self.build("GstParamArray", value_type, |s| unsafe {
            s.array.element_spec = element;
        })
    }

    /// A spec redirecting to `overridden`, as installed by
    /// `g_object_class_override_property`.
    pub fn overriding(self, overridden: *mut GParamSpec) -> *mut GParamSpec {
        let value_type = unsafe { (*overridden).value_type };
        self.build("GParamOverride", value_type, |s| unsafe {
            s.redirect.overridden = overridden;
        })
    }

    /// A spec of any registered param type.
    pub fn of_kind(self, param_type: &str, value_type: GType) -> *mut GParamSpec {
        self.build(param_type, value_type, |_| {})
    }
}

fn leak_table<T>(values: Vec<T>) -> *mut T {
    Box::into_raw(values.into_boxed_slice()).cast()
}

/// Registers an enum type with `(value, name, nick)` entries.
pub fn register_enum(name: &str, values: &[(i32, &str, &str)]) -> GType {
    let table: Vec<GEnumValue> = values
        .iter()
        .map(|(value, name, nick)| GEnumValue {
            value: *value,
            value_name: leak_str(name).cast_const(),
            value_nick: leak_str(nick).cast_const(),
        })
        .chain(std::iter::once(GEnumValue {
            value: 0,
            value_name: ptr::null(),
            value_nick: ptr::null(),
        }))
        .collect();

    let mut state = state();
    let gtype = state.register(name, "GEnum");
    let class = state.class_of(gtype).cast::<GEnumClass>();
    unsafe {
        (*class).minimum = values.iter().map(|v| v.0).min().unwrap_or(0);
        (*class).maximum = values.iter().map(|v| v.0).max().unwrap_or(0);
        (*class).n_values = values.len() as c_uint;
        (*class).values = leak_table(table);
    }
    gtype
}

/// Registers a flags type with `(value, name, nick)` entries.
pub fn register_flags(name: &str, values: &[(u32, &str, &str)]) -> GType {
    let table: Vec<GFlagsValue> = values
        .iter()
        .map(|(value, name, nick)| GFlagsValue {
            value: *value,
            value_name: leak_str(name).cast_const(),
            value_nick: leak_str(nick).cast_const(),
        })
        .chain(std::iter::once(GFlagsValue {
            value: 0,
            value_name: ptr::null(),
            value_nick: ptr::null(),
        }))
        .collect();

    let mut state = state();
    let gtype = state.register(name, "GFlags");
    let class = state.class_of(gtype).cast::<GFlagsClass>();
    unsafe {
        (*class).mask = values.iter().fold(0, |mask, v| mask | v.0);
        (*class).n_values = values.len() as c_uint;
        (*class).values = leak_table(table);
    }
    gtype
}

/// Adds `pspec` to the properties of `owner`'s class.
pub fn install_property(owner: &str, pspec: *mut GParamSpec) {
    let mut state = state();
    let gtype = state.lookup(owner);
    let node = state.types.get_mut(&gtype).expect("looked up above");
    node.properties.push(pspec as usize);
    unsafe {
        (*pspec).owner_type = gtype;
        (*pspec).param_id = node.properties.len() as c_uint;
    }
}

pub(crate) unsafe extern "C" fn g_param_spec_get_nick(pspec: *mut GParamSpec) -> *const c_char {
    let spec = unsafe { &*pspec };
    if spec._nick.is_null() {
        spec.name
    } else {
        spec._nick
    }
}

pub(crate) unsafe extern "C" fn g_param_spec_get_blurb(pspec: *mut GParamSpec) -> *const c_char {
    unsafe { (*pspec)._blurb }
}

pub(crate) unsafe extern "C" fn g_param_spec_get_redirect_target(
    pspec: *mut GParamSpec,
) -> *mut GParamSpec {
    let gtype = unsafe { (*(*pspec).g_type_instance.g_class).g_type };
    let is_override = {
        let state = state();
        state.is_a(gtype, state.lookup("GParamOverride"))
    };
    if is_override {
        unsafe { (*pspec.cast::<GParamSpecOverride>()).overridden }
    } else {
        ptr::null_mut()
    }
}

pub(crate) unsafe extern "C" fn g_object_class_list_properties(
    class: *mut GObjectClass,
    n_properties: *mut c_uint,
) -> *mut *mut GParamSpec {
    let gtype = unsafe { (*class).g_type_class.g_type };
    let properties = state().properties(gtype);
    if !n_properties.is_null() {
        unsafe { *n_properties = properties.len() as c_uint };
    }
    if properties.is_empty() {
        return ptr::null_mut();
    }
    alloc_pointer_array(properties).cast()
}
