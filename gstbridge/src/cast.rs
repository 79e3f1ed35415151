// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Tag-checked casts from opaque handles to typed views.
//!
//! The [`TypeRegistry`] resolves each [`Kind`] to its native GType once and
//! caches the result. A cast reads the dynamic type tag from the handle and
//! accepts it when the native type system reports it as the requested type, a
//! descendant of it, or (for interfaces) a conforming implementation.

use std::{
    collections::HashMap,
    ffi::CString,
    marker::PhantomData,
    ptr::NonNull,
    sync::{Arc, Mutex, PoisonError},
};

use gstbridge_sys as ffi;
use tracing::{debug, trace};

use crate::{
    Error, Handle, Kind, Layout, NativeKind, ObjectKind, Result,
    api::{ApiHandle, cstr_to_string, take_gstring},
};

/// Resolves kinds to native types and checks handles against them.
///
/// Cloning is cheap and shares the resolution cache.
#[derive(Clone)]
pub struct TypeRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    api: ApiHandle,
    resolved: Mutex<HashMap<&'static str, ffi::GType>>,
}

impl TypeRegistry {
    pub fn new(api: ApiHandle) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                api,
                resolved: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn api(&self) -> &ApiHandle {
        &self.inner.api
    }

    /// Returns the native type of `kind`.
    ///
    /// The generic mini object resolves to the boxed fundamental type.
    ///
    /// # Errors
    ///
    /// [`Error::UnregisteredType`] if the type is not (yet) known to the type
    /// system. Failed lookups are not cached.
    pub fn resolve(&self, kind: Kind) -> Result<ffi::GType> {
        match kind.type_name() {
            Some(name) => self.resolve_name(name),
            None => Ok(ffi::G_TYPE_BOXED),
        }
    }

    /// Resolves a native type name, caching successful lookups.
    pub fn resolve_name(&self, name: &'static str) -> Result<ffi::GType> {
        if let Some(gtype) = self.cache().get(name) {
            trace!("Resolved {} from cache", name);
            return Ok(*gtype);
        }

        let c_name = CString::new(name)?;
        let gtype = unsafe { self.inner.api.g_type_from_name(c_name.as_ptr()) };
        if gtype == ffi::G_TYPE_INVALID {
            return Err(Error::UnregisteredType(name));
        }

        debug!("Resolved {} to GType {:#x}", name, gtype);
        self.cache().insert(name, gtype);
        Ok(gtype)
    }

    /// Reads the dynamic type tag of `handle`.
    pub fn type_tag(&self, handle: &Handle) -> Result<ffi::GType> {
        handle.tag()
    }

    /// Native name of `gtype`, or a placeholder for unknown types.
    pub fn type_name(&self, gtype: ffi::GType) -> String {
        unsafe { cstr_to_string(self.inner.api.g_type_name(gtype)) }
            .unwrap_or_else(|| format!("<unknown GType {gtype:#x}>"))
    }

    pub fn fundamental(&self, gtype: ffi::GType) -> ffi::GType {
        unsafe { self.inner.api.g_type_fundamental(gtype) }
    }

    /// Returns `true` if `tag` is `gtype`, derives from it, or implements it.
    pub fn tag_is_a(&self, tag: ffi::GType, gtype: ffi::GType) -> bool {
        unsafe { self.inner.api.g_type_is_a(tag, gtype) != ffi::GFALSE }
    }

    /// Returns `true` if `handle` can be cast to `K`.
    ///
    /// Typical use is an interface probe, e.g. whether an element is a
    /// [`crate::kind::UriHandler`].
    pub fn conforms<K: NativeKind>(&self, handle: &Handle) -> bool {
        self.cast::<K>(handle).is_ok()
    }

    /// Reinterprets `handle` as a view of kind `K`.
    ///
    /// # Errors
    ///
    /// - [`Error::TypeMismatch`] if the handle's layout family differs from
    ///   `K`'s (the memory is not read) or its tag does not satisfy `K`
    /// - [`Error::InvalidHandle`] if no tag can be read
    /// - [`Error::UnregisteredType`] if `K`'s native type is unknown
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use gstbridge::{Handle, TypeRegistry, kind::Element};
    /// # fn example(registry: &TypeRegistry, handle: Handle) -> gstbridge::Result<()> {
    /// let element = registry.cast::<Element>(&handle)?;
    /// println!("{:?}", element.name());
    /// # Ok(())
    /// # }
    /// ```
    pub fn cast<K: NativeKind>(&self, handle: &Handle) -> Result<TypedView<'_, K>> {
        let kind = K::KIND;
        if handle.layout() != kind.layout() {
            debug!(
                "Refusing to cast {:?} handle to {}",
                handle.layout(),
                kind.name()
            );
            return Err(Error::TypeMismatch {
                expected: kind.name(),
                actual: layout_description(handle.layout()).to_string(),
            });
        }

        let tag = handle.tag()?;
        self.check_tag(kind, tag)?;
        trace!("Cast {:#x} to {}", tag, kind.name());
        Ok(TypedView::from_non_null(self, handle.as_non_null().cast(), tag))
    }

    /// Reinterprets a class structure handle as the class of kind `K`.
    ///
    /// # Errors
    ///
    /// As for [`TypeRegistry::cast`]; the handle must have been declared with
    /// [`Layout::Class`].
    pub fn cast_class<K: NativeKind>(&self, handle: &Handle) -> Result<ClassView<'_, K>> {
        let kind = K::KIND;
        if handle.layout() != Layout::Class {
            return Err(Error::TypeMismatch {
                expected: kind.name(),
                actual: layout_description(handle.layout()).to_string(),
            });
        }

        let tag = handle.tag()?;
        self.check_tag(kind, tag)?;
        trace!("Cast class {:#x} to {}", tag, kind.name());
        Ok(ClassView {
            registry: self,
            ptr: handle.as_non_null().cast(),
            gtype: tag,
            phantom: PhantomData,
        })
    }

    /// Layout family of a value whose type is `tag`.
    ///
    /// Returns `None` unless `tag` derives from one of the supported
    /// mini-object or boxed-structure kinds.
    pub fn value_layout(&self, tag: ffi::GType) -> Option<Layout> {
        [Layout::Boxed, Layout::MiniObject]
            .into_iter()
            .find(|layout| self.derives_from_family(tag, *layout))
    }

    fn derives_from_family(&self, tag: ffi::GType, layout: Layout) -> bool {
        Kind::ALL
            .iter()
            .filter(|kind| kind.layout() == layout && kind.type_name().is_some())
            .filter_map(|kind| self.resolve(*kind).ok())
            .any(|gtype| self.tag_is_a(tag, gtype))
    }

    fn check_tag(&self, kind: Kind, tag: ffi::GType) -> Result<()> {
        let accepted = match kind {
            // Boxed alone does not imply a mini-object header
            Kind::MiniObject => self.derives_from_family(tag, Layout::MiniObject),
            _ => self.tag_is_a(tag, self.resolve(kind)?),
        };
        if accepted {
            Ok(())
        } else {
            let actual = self.type_name(tag);
            debug!("Type mismatch: expected {}, found {}", kind.name(), actual);
            Err(Error::TypeMismatch {
                expected: kind.name(),
                actual,
            })
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, ffi::GType>> {
        self.inner
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("api", &self.inner.api)
            .field("resolved", &self.cache().len())
            .finish()
    }
}

fn layout_description(layout: Layout) -> &'static str {
    match layout {
        Layout::Instance => "<type instance>",
        Layout::MiniObject => "<mini object>",
        Layout::Boxed => "<boxed structure>",
        Layout::Class => "<class structure>",
    }
}

/// A handle whose tag was checked against kind `K`.
///
/// Views are read-only and borrow the registry that produced them. The native
/// object must outlive the view.
pub struct TypedView<'a, K: NativeKind> {
    registry: &'a TypeRegistry,
    ptr: NonNull<K::Ffi>,
    gtype: ffi::GType,
    phantom: PhantomData<&'a K::Ffi>,
}

impl<'a, K: NativeKind> TypedView<'a, K> {
    /// Builds a view without checking the tag.
    pub(crate) fn from_non_null(
        registry: &'a TypeRegistry,
        ptr: NonNull<K::Ffi>,
        gtype: ffi::GType,
    ) -> Self {
        Self {
            registry,
            ptr,
            gtype,
            phantom: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut K::Ffi {
        self.ptr.as_ptr()
    }

    /// The dynamic type tag read at cast time.
    pub fn type_tag(&self) -> ffi::GType {
        self.gtype
    }

    pub fn type_name(&self) -> String {
        self.registry.type_name(self.gtype)
    }

    /// Converts the view back into an untyped handle.
    pub fn handle(&self) -> Handle {
        Handle::from_non_null(self.ptr.cast(), K::KIND.layout())
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Re-checks the same object against another kind.
    pub fn cast<U: NativeKind>(&self) -> Result<TypedView<'a, U>> {
        self.registry.cast::<U>(&self.handle())
    }
}

impl<K: NativeKind> Clone for TypedView<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: NativeKind> Copy for TypedView<'_, K> {}

impl<K: NativeKind> std::fmt::Debug for TypedView<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedView")
            .field("kind", &K::KIND)
            .field("ptr", &self.ptr)
            .field("type", &self.type_name())
            .finish()
    }
}

impl<K: ObjectKind> TypedView<'_, K> {
    fn object(&self) -> *mut ffi::GstObject {
        self.ptr.as_ptr().cast()
    }

    /// Returns a copy of the object's name.
    pub fn name(&self) -> Option<String> {
        let api = self.registry.api();
        unsafe { take_gstring(api, api.gst_object_get_name(self.object())) }
    }

    /// Raw `GstObject` flags.
    pub fn flags(&self) -> u32 {
        unsafe { (*self.object()).flags }
    }

    /// Returns `true` if all bits of `flags` are set.
    pub fn flag_is_set(&self, flags: u32) -> bool {
        self.flags() & flags == flags
    }
}

/// A class structure checked against kind `K`.
pub struct ClassView<'a, K: NativeKind> {
    registry: &'a TypeRegistry,
    ptr: NonNull<ffi::GTypeClass>,
    gtype: ffi::GType,
    phantom: PhantomData<fn() -> K>,
}

impl<K: NativeKind> ClassView<'_, K> {
    pub fn as_ptr(&self) -> *mut ffi::GTypeClass {
        self.ptr.as_ptr()
    }

    /// The class's own type, which may derive from `K`'s.
    pub fn type_tag(&self) -> ffi::GType {
        self.gtype
    }

    pub fn type_name(&self) -> String {
        self.registry.type_name(self.gtype)
    }
}

impl<K: NativeKind> std::fmt::Debug for ClassView<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassView")
            .field("kind", &K::KIND)
            .field("type", &self.type_name())
            .finish()
    }
}
