// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Property introspection.
//!
//! [`ParamIntrospector`] classifies a `GParamSpec` into a [`ParamDescriptor`]
//! by dispatching on the spec's dynamic type. Enum and flags value tables are
//! walked once per value type and cached together with a reference to their
//! class, which is released when the introspector is dropped.
//!
//! # Examples
//!
//! ```no_run
//! # use gstbridge::{ParamIntrospector, TypedView, kind::GObject};
//! # fn example(introspector: &ParamIntrospector, object: &TypedView<'_, GObject>) -> gstbridge::Result<()> {
//! for property in introspector.properties(object)? {
//!     println!("{}: {}", property.name, property.flags.gst_flags_string());
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    collections::{HashMap, hash_map::Entry},
    ffi::c_void,
    ptr::NonNull,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use gstbridge_sys as ffi;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::{
    Error, Handle, Result, TypeRegistry, TypedView,
    api::cstr_to_string,
    kind::{self, NativeKind},
    seq::NullTerminated,
};

bitflags::bitflags! {
    /// Property flags (`GParamFlags` plus the GStreamer extensions).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParamFlags: u32 {
        const READABLE = ffi::G_PARAM_READABLE;
        const WRITABLE = ffi::G_PARAM_WRITABLE;
        const CONSTRUCT = ffi::G_PARAM_CONSTRUCT;
        const CONSTRUCT_ONLY = ffi::G_PARAM_CONSTRUCT_ONLY;
        const LAX_VALIDATION = ffi::G_PARAM_LAX_VALIDATION;
        const STATIC_NAME = ffi::G_PARAM_STATIC_NAME;
        const STATIC_NICK = ffi::G_PARAM_STATIC_NICK;
        const STATIC_BLURB = ffi::G_PARAM_STATIC_BLURB;
        const EXPLICIT_NOTIFY = ffi::G_PARAM_EXPLICIT_NOTIFY;
        const DEPRECATED = ffi::G_PARAM_DEPRECATED;
        const CONTROLLABLE = ffi::GST_PARAM_CONTROLLABLE;
        const MUTABLE_READY = ffi::GST_PARAM_MUTABLE_READY;
        const MUTABLE_PAUSED = ffi::GST_PARAM_MUTABLE_PAUSED;
        const MUTABLE_PLAYING = ffi::GST_PARAM_MUTABLE_PLAYING;
        const DOC_SHOW_DEFAULT = ffi::GST_PARAM_DOC_SHOW_DEFAULT;
        const CONDITIONALLY_AVAILABLE = ffi::GST_PARAM_CONDITIONALLY_AVAILABLE;
    }
}

const FLAG_NAMES: &[(ParamFlags, &str)] = &[
    (ParamFlags::READABLE, "readable"),
    (ParamFlags::WRITABLE, "writable"),
    (ParamFlags::CONSTRUCT, "construct"),
    (ParamFlags::CONSTRUCT_ONLY, "construct only"),
    (ParamFlags::LAX_VALIDATION, "lax validation"),
    (ParamFlags::STATIC_NAME, "static name"),
    (ParamFlags::STATIC_NICK, "static nick"),
    (ParamFlags::STATIC_BLURB, "static blurb"),
    (ParamFlags::EXPLICIT_NOTIFY, "explicit notify"),
    (ParamFlags::DEPRECATED, "deprecated"),
    (ParamFlags::CONTROLLABLE, "controllable"),
    (
        ParamFlags::MUTABLE_PLAYING,
        "changeable in NULL, READY, PAUSED or PLAYING state",
    ),
    (
        ParamFlags::MUTABLE_PAUSED,
        "changeable only in NULL, READY or PAUSED state",
    ),
    (
        ParamFlags::MUTABLE_READY,
        "changeable only in NULL or READY state",
    ),
    (ParamFlags::DOC_SHOW_DEFAULT, "doc show default"),
    (ParamFlags::CONDITIONALLY_AVAILABLE, "conditionally available"),
];

/// Flags shown by an element inspector, in display order.
const GST_FLAGS: &[ParamFlags] = &[
    ParamFlags::READABLE,
    ParamFlags::WRITABLE,
    ParamFlags::CONTROLLABLE,
    ParamFlags::MUTABLE_PLAYING,
    ParamFlags::MUTABLE_PAUSED,
    ParamFlags::MUTABLE_READY,
    ParamFlags::DEPRECATED,
];

impl ParamFlags {
    fn names(self, order: impl IntoIterator<Item = ParamFlags>) -> String {
        order
            .into_iter()
            .filter(|flag| self.contains(*flag))
            .filter_map(|flag| {
                FLAG_NAMES
                    .iter()
                    .find(|(known, _)| *known == flag)
                    .map(|(_, name)| *name)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders the flags an element inspector shows, e.g.
    /// `"readable, writable, controllable, changeable only in NULL or READY state"`.
    pub fn gst_flags_string(self) -> String {
        self.names(GST_FLAGS.iter().copied())
    }
}

/// Renders every set flag.
impl std::fmt::Display for ParamFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.names(FLAG_NAMES.iter().map(|(flag, _)| *flag)))
    }
}

impl Serialize for ParamFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.gst_flags_string())
    }
}

/// Bounds and default of a numeric property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NumericRange {
    #[serde(rename = "u32")]
    UInt32 { min: u32, max: u32, default: u32 },
    #[serde(rename = "i32")]
    Int32 { min: i32, max: i32, default: i32 },
    #[serde(rename = "u64")]
    UInt64 { min: u64, max: u64, default: u64 },
    #[serde(rename = "i64")]
    Int64 { min: i64, max: i64, default: i64 },
    #[serde(rename = "f32")]
    Float { min: f32, max: f32, default: f32 },
    #[serde(rename = "f64")]
    Double { min: f64, max: f64, default: f64 },
}

/// One value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueEntry {
    pub value: i32,
    pub nick: String,
    pub name: String,
}

/// One value of a flags type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagsValueEntry {
    pub value: u32,
    pub nick: String,
    pub name: String,
}

/// Classification of a property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamDescriptor {
    Boolean {
        default: bool,
    },
    String {
        default: Option<String>,
    },
    Numeric(NumericRange),
    Fraction {
        min_num: i32,
        min_den: i32,
        max_num: i32,
        max_den: i32,
        default_num: i32,
        default_den: i32,
    },
    Enum {
        values: Arc<[EnumValueEntry]>,
        default: i32,
    },
    Flags {
        values: Arc<[FlagsValueEntry]>,
        default: u32,
    },
    Object {
        type_name: String,
    },
    Boxed {
        type_name: String,
    },
    /// `type_name` is `None` for untyped pointers.
    Pointer {
        type_name: Option<String>,
    },
    ArrayOfValues {
        element_type_name: Option<String>,
    },
}

/// Metadata and classification of one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyInfo {
    pub name: String,
    pub nick: String,
    pub blurb: Option<String>,
    pub flags: ParamFlags,
    pub value_type_name: String,
    pub owner_type_name: String,
    /// `None` if the property kind is unknown; render it generically.
    pub descriptor: Option<ParamDescriptor>,
}

struct ClassRef(NonNull<c_void>);

/// Safety: type classes are immutable once initialised and the cached
/// reference keeps them alive.
unsafe impl Send for ClassRef {}

struct ClassTable<T> {
    class: ClassRef,
    values: Arc<[T]>,
}

type TableCache<T> = Mutex<HashMap<ffi::GType, ClassTable<T>>>;

fn lock<T>(cache: &TableCache<T>) -> MutexGuard<'_, HashMap<ffi::GType, ClassTable<T>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Classifies property specifications.
pub struct ParamIntrospector {
    registry: TypeRegistry,
    enums: TableCache<EnumValueEntry>,
    flags: TableCache<FlagsValueEntry>,
}

impl ParamIntrospector {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            enums: Mutex::new(HashMap::new()),
            flags: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn try_cast<K: NativeKind>(&self, handle: &Handle) -> Option<TypedView<'_, K>> {
        self.registry.cast::<K>(handle).ok()
    }

    /// Classifies `pspec` by its dynamic type.
    ///
    /// Kinds whose native type is not registered are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPropertyKind`] (a soft failure) if no classification
    /// applies; [`Error::InvalidHandle`] if an enum or flags class cannot be
    /// referenced.
    pub fn classify(&self, pspec: &TypedView<'_, kind::ParamSpec>) -> Result<ParamDescriptor> {
        let handle = pspec.handle();
        let spec = unsafe { &*pspec.as_ptr() };

        // Overridden properties (e.g. from an interface) carry no range of their own.
        if let Some(p) = self.try_cast::<kind::ParamOverride>(&handle) {
            let target = unsafe {
                self.registry
                    .api()
                    .g_param_spec_get_redirect_target(p.as_ptr().cast())
            };
            if let Some(target) = unsafe { Handle::instance(target) } {
                trace!("Classifying {:?} through its redirect target", p);
                let target = self.registry.cast::<kind::ParamSpec>(&target)?;
                return self.classify(&target);
            }
        }

        if let Some(p) = self.try_cast::<kind::ParamBoolean>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Boolean {
                default: p.default_value != ffi::GFALSE,
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamUInt>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::UInt32 {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamInt>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::Int32 {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamUInt64>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::UInt64 {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamInt64>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::Int64 {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamFloat>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::Float {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamDouble>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Numeric(NumericRange::Double {
                min: p.minimum,
                max: p.maximum,
                default: p.default_value,
            }));
        }
        if let Some(p) = self.try_cast::<kind::ParamString>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::String {
                default: unsafe { cstr_to_string(p.default_value) },
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamFraction>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Fraction {
                min_num: p.min_num,
                min_den: p.min_den,
                max_num: p.max_num,
                max_den: p.max_den,
                default_num: p.def_num,
                default_den: p.def_den,
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamEnum>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Enum {
                values: self.enum_values(spec.value_type)?,
                default: p.default_value,
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamFlags>(&handle) {
            let p = unsafe { &*p.as_ptr() };
            return Ok(ParamDescriptor::Flags {
                values: self.flags_values(spec.value_type)?,
                default: p.default_value,
            });
        }
        if self.try_cast::<kind::ParamObject>(&handle).is_some() {
            return Ok(ParamDescriptor::Object {
                type_name: self.registry.type_name(spec.value_type),
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamArray>(&handle) {
            let element = unsafe { (*p.as_ptr()).element_spec };
            return Ok(ParamDescriptor::ArrayOfValues {
                element_type_name: self.element_type_name(element),
            });
        }

        // Boxed specs may carry a GstValueArray without an element spec.
        let value_type_name = self.registry.type_name(spec.value_type);
        if value_type_name == "GstValueArray" {
            return Ok(ParamDescriptor::ArrayOfValues {
                element_type_name: None,
            });
        }
        if self.try_cast::<kind::ParamBoxed>(&handle).is_some() {
            return Ok(ParamDescriptor::Boxed {
                type_name: value_type_name,
            });
        }
        if self.try_cast::<kind::ParamPointer>(&handle).is_some() {
            return Ok(ParamDescriptor::Pointer {
                type_name: (spec.value_type != ffi::G_TYPE_POINTER).then_some(value_type_name),
            });
        }
        if let Some(p) = self.try_cast::<kind::ParamValueArray>(&handle) {
            let element = unsafe { (*p.as_ptr()).element_spec };
            return Ok(ParamDescriptor::ArrayOfValues {
                element_type_name: self.element_type_name(element),
            });
        }

        Err(Error::UnknownPropertyKind {
            name: unsafe { cstr_to_string(spec.name) }.unwrap_or_default(),
            value_type: value_type_name,
        })
    }

    /// Classifies `pspec` and collects its metadata.
    ///
    /// An unknown property kind yields `descriptor: None` instead of an error.
    pub fn describe(&self, pspec: &TypedView<'_, kind::ParamSpec>) -> Result<PropertyInfo> {
        let api = self.registry.api();
        let ptr = pspec.as_ptr();
        let spec = unsafe { &*ptr };
        let name = unsafe { cstr_to_string(spec.name) }.unwrap_or_default();

        let descriptor = match self.classify(pspec) {
            Ok(descriptor) => Some(descriptor),
            Err(error) if error.is_soft() => {
                debug!("Rendering {} generically: {}", name, error);
                None
            }
            Err(error) => return Err(error),
        };

        Ok(PropertyInfo {
            nick: unsafe { cstr_to_string(api.g_param_spec_get_nick(ptr)) }
                .unwrap_or_else(|| name.clone()),
            blurb: unsafe { cstr_to_string(api.g_param_spec_get_blurb(ptr)) },
            flags: ParamFlags::from_bits_retain(spec.flags),
            value_type_name: self.registry.type_name(spec.value_type),
            owner_type_name: self.registry.type_name(spec.owner_type),
            name,
            descriptor,
        })
    }

    /// Describes every property of `object`'s class.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHandle`] if the object has no class; any non-soft error
    /// from [`ParamIntrospector::describe`].
    pub fn properties(&self, object: &TypedView<'_, kind::GObject>) -> Result<Vec<PropertyInfo>> {
        let api = self.registry.api();
        let class = unsafe { (*object.as_ptr()).g_type_instance.g_class };
        if class.is_null() {
            return Err(Error::InvalidHandle);
        }

        let mut n_properties = 0;
        let specs =
            unsafe { api.g_object_class_list_properties(class.cast(), &mut n_properties) };
        if specs.is_null() {
            return Ok(Vec::new());
        }

        let result: Result<Vec<_>> =
            unsafe { std::slice::from_raw_parts(specs, n_properties as usize) }
            .iter()
            .filter_map(|spec| unsafe { Handle::instance(*spec) })
            .map(|handle| {
                let pspec = self.registry.cast::<kind::ParamSpec>(&handle)?;
                self.describe(&pspec)
            })
            .collect();

        unsafe { api.g_free(specs.cast()) };
        trace!("Listed {} properties of {}", n_properties, object.type_name());
        result
    }

    fn element_type_name(&self, element: *mut ffi::GParamSpec) -> Option<String> {
        let handle = unsafe { Handle::instance(element) }?;
        let spec = self.registry.cast::<kind::ParamSpec>(&handle).ok()?;
        Some(self.registry.type_name(unsafe { (*spec.as_ptr()).value_type }))
    }

    /// Values of the enum type `value_type`, walked once and cached.
    pub fn enum_values(&self, value_type: ffi::GType) -> Result<Arc<[EnumValueEntry]>> {
        self.cached_table(&self.enums, value_type, |class| {
            let class = unsafe { &*class.cast::<ffi::GEnumClass>() };
            unsafe { NullTerminated::new(class.values.cast_const()) }
                .map(|value| EnumValueEntry {
                    value: value.value,
                    nick: unsafe { cstr_to_string(value.value_nick) }.unwrap_or_default(),
                    name: unsafe { cstr_to_string(value.value_name) }.unwrap_or_default(),
                })
                .collect()
        })
    }

    /// Values of the flags type `value_type`, walked once and cached.
    pub fn flags_values(&self, value_type: ffi::GType) -> Result<Arc<[FlagsValueEntry]>> {
        self.cached_table(&self.flags, value_type, |class| {
            let class = unsafe { &*class.cast::<ffi::GFlagsClass>() };
            unsafe { NullTerminated::new(class.values.cast_const()) }
                .map(|value| FlagsValueEntry {
                    value: value.value,
                    nick: unsafe { cstr_to_string(value.value_nick) }.unwrap_or_default(),
                    name: unsafe { cstr_to_string(value.value_name) }.unwrap_or_default(),
                })
                .collect()
        })
    }

    fn cached_table<T>(
        &self,
        cache: &TableCache<T>,
        value_type: ffi::GType,
        walk: impl FnOnce(*mut c_void) -> Vec<T>,
    ) -> Result<Arc<[T]>> {
        if let Some(table) = lock(cache).get(&value_type) {
            trace!("Value table for {:#x} served from cache", value_type);
            return Ok(table.values.clone());
        }

        let api = self.registry.api();
        let class =
            NonNull::new(unsafe { api.g_type_class_ref(value_type) }).ok_or(Error::InvalidHandle)?;
        let values: Arc<[T]> = walk(class.as_ptr()).into();
        debug!(
            "Cached {} values of {}",
            values.len(),
            self.registry.type_name(value_type)
        );

        match lock(cache).entry(value_type) {
            Entry::Occupied(existing) => {
                unsafe { api.g_type_class_unref(class.as_ptr()) };
                Ok(existing.get().values.clone())
            }
            Entry::Vacant(slot) => {
                slot.insert(ClassTable {
                    class: ClassRef(class),
                    values: values.clone(),
                });
                Ok(values)
            }
        }
    }
}

impl Drop for ParamIntrospector {
    fn drop(&mut self) {
        let api = self.registry.api();
        let enums = std::mem::take(&mut *lock(&self.enums));
        let flags = std::mem::take(&mut *lock(&self.flags));
        let classes = enums
            .into_values()
            .map(|table| table.class)
            .chain(flags.into_values().map(|table| table.class));
        for ClassRef(class) in classes {
            unsafe { api.g_type_class_unref(class.as_ptr()) };
        }
    }
}

impl std::fmt::Debug for ParamIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamIntrospector")
            .field("enums", &lock(&self.enums).len())
            .field("flags", &lock(&self.flags).len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gst_flags_string_follows_inspector_order() {
        let flags = ParamFlags::MUTABLE_READY
            | ParamFlags::CONTROLLABLE
            | ParamFlags::WRITABLE
            | ParamFlags::READABLE
            | ParamFlags::STATIC_NAME;
        assert_eq!(
            flags.gst_flags_string(),
            "readable, writable, controllable, changeable only in NULL or READY state"
        );
    }

    #[test]
    fn display_lists_every_flag() {
        let flags = ParamFlags::READABLE | ParamFlags::STATIC_NAME | ParamFlags::DEPRECATED;
        assert_eq!(flags.to_string(), "readable, static name, deprecated");
        assert_eq!(ParamFlags::empty().to_string(), "");
    }

    #[test]
    fn flags_serialize_as_inspector_text() {
        let json = serde_json::to_string(&(ParamFlags::READABLE | ParamFlags::DEPRECATED)).unwrap();
        assert_eq!(json, "\"readable, deprecated\"");
    }

    #[test]
    fn descriptor_serializes_with_kind_tag() {
        let descriptor = ParamDescriptor::Numeric(NumericRange::UInt32 {
            min: 0,
            max: 10,
            default: 5,
        });
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["kind"], "numeric");
        assert_eq!(value["type"], "u32");
        assert_eq!(value["default"], 5);

        let pointer = serde_json::to_value(ParamDescriptor::Pointer { type_name: None }).unwrap();
        assert_eq!(pointer, serde_json::json!({ "kind": "pointer", "type_name": null }));
    }
}
