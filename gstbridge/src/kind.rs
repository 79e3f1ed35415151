// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Supported native kinds.
//!
//! Every castable kind is an uninhabited marker type implementing
//! [`NativeKind`]. The marker ties together the native type name used to
//! resolve the kind's GType, the layout family the tag is read from, and the
//! raw structure a [`crate::TypedView`] points at. Capability traits
//! ([`ObjectKind`], [`MiniObjectKind`], [`CopyOnWrite`]) select which views
//! get which helpers.

use gstbridge_sys as ffi;

/// Where the dynamic type tag lives in a native structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `GTypeInstance`: the tag is `g_class->g_type`.
    Instance,
    /// `GstMiniObject`: the tag is the leading `type` field.
    MiniObject,
    /// Boxed structure whose first field is its GType (`GstStructure`, `GstCapsFeatures`).
    Boxed,
    /// `GTypeClass` and class structures derived from it.
    Class,
}

/// A native kind that handles can be cast to.
pub trait NativeKind: 'static {
    /// Raw structure a view of this kind points at.
    type Ffi: 'static;
    /// Runtime descriptor of this kind.
    const KIND: Kind;
}

/// Kinds deriving from `GstObject`.
pub trait ObjectKind: NativeKind {}

/// Kinds laid out as a `GstMiniObject`.
pub trait MiniObjectKind: NativeKind {}

/// Shared-by-default kinds that must be made writable before mutation.
pub trait CopyOnWrite: MiniObjectKind {}

macro_rules! kinds {
    ($(
        $(#[$meta:meta])*
        $name:ident => $ffi:ty, $type_name:expr, $layout:ident $(, [$($marker:ident),+])?;
    )*) => {
        /// Runtime descriptor of a [`NativeKind`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Kind {
            $($name,)*
        }

        impl Kind {
            /// Every supported kind.
            pub const ALL: &'static [Kind] = &[$(Kind::$name,)*];

            /// Native type name resolved through the type system, `None` for
            /// the generic mini object which has no GType of its own.
            pub const fn type_name(self) -> Option<&'static str> {
                match self {
                    $(Kind::$name => $type_name,)*
                }
            }

            /// Layout family of the kind.
            pub const fn layout(self) -> Layout {
                match self {
                    $(Kind::$name => Layout::$layout,)*
                }
            }
        }

        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $name {}

            impl NativeKind for $name {
                type Ffi = $ffi;
                const KIND: Kind = Kind::$name;
            }

            $($(impl $marker for $name {})+)?
        )*
    };
}

kinds! {
    // GObject hierarchy
    GObject => ffi::GObject, Some("GObject"), Instance;
    Object => ffi::GstObject, Some("GstObject"), Instance, [ObjectKind];
    Allocator => ffi::GstAllocator, Some("GstAllocator"), Instance, [ObjectKind];
    Bin => ffi::GstBin, Some("GstBin"), Instance, [ObjectKind];
    BufferPool => ffi::GstBufferPool, Some("GstBufferPool"), Instance, [ObjectKind];
    Bus => ffi::GstBus, Some("GstBus"), Instance, [ObjectKind];
    Clock => ffi::GstClock, Some("GstClock"), Instance, [ObjectKind];
    Device => ffi::GstDevice, Some("GstDevice"), Instance, [ObjectKind];
    Element => ffi::GstElement, Some("GstElement"), Instance, [ObjectKind];
    ElementFactory => ffi::GstElementFactory, Some("GstElementFactory"), Instance, [ObjectKind];
    GhostPad => ffi::GstGhostPad, Some("GstGhostPad"), Instance, [ObjectKind];
    Pad => ffi::GstPad, Some("GstPad"), Instance, [ObjectKind];
    PadTemplate => ffi::GstPadTemplate, Some("GstPadTemplate"), Instance, [ObjectKind];
    Pipeline => ffi::GstPipeline, Some("GstPipeline"), Instance, [ObjectKind];
    Plugin => ffi::GstPlugin, Some("GstPlugin"), Instance, [ObjectKind];
    PluginFeature => ffi::GstPluginFeature, Some("GstPluginFeature"), Instance, [ObjectKind];
    ProxyPad => ffi::GstProxyPad, Some("GstProxyPad"), Instance, [ObjectKind];
    Registry => ffi::GstRegistry, Some("GstRegistry"), Instance, [ObjectKind];
    Stream => ffi::GstStream, Some("GstStream"), Instance, [ObjectKind];
    StreamCollection => ffi::GstStreamCollection, Some("GstStreamCollection"), Instance, [ObjectKind];
    Task => ffi::GstTask, Some("GstTask"), Instance, [ObjectKind];
    TaskPool => ffi::GstTaskPool, Some("GstTaskPool"), Instance, [ObjectKind];
    AppSink => ffi::GstAppSink, Some("GstAppSink"), Instance, [ObjectKind];
    AppSrc => ffi::GstAppSrc, Some("GstAppSrc"), Instance, [ObjectKind];
    BaseSink => ffi::GstBaseSink, Some("GstBaseSink"), Instance, [ObjectKind];
    BaseSrc => ffi::GstBaseSrc, Some("GstBaseSrc"), Instance, [ObjectKind];
    PushSrc => ffi::GstPushSrc, Some("GstPushSrc"), Instance, [ObjectKind];

    // Interfaces, checked by conformance of the instance type
    ChildProxy => ffi::GstChildProxy, Some("GstChildProxy"), Instance;
    UriHandler => ffi::GstURIHandler, Some("GstURIHandler"), Instance;
    TagSetter => ffi::GstTagSetter, Some("GstTagSetter"), Instance;
    TocSetter => ffi::GstTocSetter, Some("GstTocSetter"), Instance;

    // Mini objects
    /// Any mini object whose tag derives from one of the kinds below.
    MiniObject => ffi::GstMiniObject, None, MiniObject, [MiniObjectKind];
    Buffer => ffi::GstBuffer, Some("GstBuffer"), MiniObject, [MiniObjectKind, CopyOnWrite];
    BufferList => ffi::GstBufferList, Some("GstBufferList"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Caps => ffi::GstCaps, Some("GstCaps"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Context => ffi::GstContext, Some("GstContext"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Event => ffi::GstEvent, Some("GstEvent"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Memory => ffi::GstMemory, Some("GstMemory"), MiniObject, [MiniObjectKind];
    Message => ffi::GstMessage, Some("GstMessage"), MiniObject, [MiniObjectKind];
    Query => ffi::GstQuery, Some("GstQuery"), MiniObject, [MiniObjectKind];
    Sample => ffi::GstSample, Some("GstSample"), MiniObject, [MiniObjectKind];
    TagList => ffi::GstTagList, Some("GstTagList"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Toc => ffi::GstToc, Some("GstToc"), MiniObject, [MiniObjectKind, CopyOnWrite];
    TocEntry => ffi::GstTocEntry, Some("GstTocEntry"), MiniObject, [MiniObjectKind, CopyOnWrite];
    Uri => ffi::GstUri, Some("GstUri"), MiniObject, [MiniObjectKind];

    // Boxed with a leading GType
    Structure => ffi::GstStructure, Some("GstStructure"), Boxed;
    CapsFeatures => ffi::GstCapsFeatures, Some("GstCapsFeatures"), Boxed;

    // Parameter specifications
    ParamSpec => ffi::GParamSpec, Some("GParam"), Instance;
    ParamBoolean => ffi::GParamSpecBoolean, Some("GParamBoolean"), Instance;
    ParamInt => ffi::GParamSpecInt, Some("GParamInt"), Instance;
    ParamUInt => ffi::GParamSpecUInt, Some("GParamUInt"), Instance;
    ParamInt64 => ffi::GParamSpecInt64, Some("GParamInt64"), Instance;
    ParamUInt64 => ffi::GParamSpecUInt64, Some("GParamUInt64"), Instance;
    ParamFloat => ffi::GParamSpecFloat, Some("GParamFloat"), Instance;
    ParamDouble => ffi::GParamSpecDouble, Some("GParamDouble"), Instance;
    ParamString => ffi::GParamSpecString, Some("GParamString"), Instance;
    ParamEnum => ffi::GParamSpecEnum, Some("GParamEnum"), Instance;
    ParamFlags => ffi::GParamSpecFlags, Some("GParamFlags"), Instance;
    ParamObject => ffi::GParamSpec, Some("GParamObject"), Instance;
    ParamBoxed => ffi::GParamSpec, Some("GParamBoxed"), Instance;
    ParamPointer => ffi::GParamSpec, Some("GParamPointer"), Instance;
    ParamValueArray => ffi::GParamSpecValueArray, Some("GParamValueArray"), Instance;
    ParamFraction => ffi::GstParamSpecFraction, Some("GstParamFraction"), Instance;
    ParamArray => ffi::GstParamSpecArray, Some("GstParamArray"), Instance;
    ParamOverride => ffi::GParamSpecOverride, Some("GParamOverride"), Instance;
}

impl Kind {
    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self.type_name() {
            Some(name) => name,
            None => "GstMiniObject",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_on_write_kinds_are_mini_objects() {
        fn layout_of<K: CopyOnWrite>() -> Layout {
            K::KIND.layout()
        }
        assert_eq!(layout_of::<Buffer>(), Layout::MiniObject);
        assert_eq!(layout_of::<BufferList>(), Layout::MiniObject);
        assert_eq!(layout_of::<Caps>(), Layout::MiniObject);
        assert_eq!(layout_of::<Context>(), Layout::MiniObject);
        assert_eq!(layout_of::<Event>(), Layout::MiniObject);
        assert_eq!(layout_of::<TagList>(), Layout::MiniObject);
        assert_eq!(layout_of::<Toc>(), Layout::MiniObject);
        assert_eq!(layout_of::<TocEntry>(), Layout::MiniObject);
    }

    #[test]
    fn every_kind_but_the_generic_mini_object_has_a_type_name() {
        let unnamed: Vec<_> = Kind::ALL
            .iter()
            .filter(|kind| kind.type_name().is_none())
            .collect();
        assert_eq!(unnamed, vec![&Kind::MiniObject]);
        assert_eq!(Kind::MiniObject.name(), "GstMiniObject");
        assert_eq!(Kind::UriHandler.to_string(), "GstURIHandler");
    }

    #[test]
    fn no_kind_uses_the_class_layout() {
        assert!(Kind::ALL.iter().all(|kind| kind.layout() != Layout::Class));
    }
}
