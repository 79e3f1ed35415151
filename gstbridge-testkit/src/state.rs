// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide runtime state.
//!
//! Every exported function locks [`STATE`] only for bookkeeping and never
//! calls back into foreign code while holding it.

use std::{
    collections::HashMap,
    ffi::CString,
    os::raw::c_char,
    sync::{LazyLock, Mutex, MutexGuard, PoisonError},
};

use gstbridge_sys::*;

pub(crate) struct TypeNode {
    pub name: CString,
    pub parent: GType,
    pub fundamental: GType,
    pub interfaces: Vec<GType>,
    /// `*mut GTypeClass`, allocated on first use.
    pub class: usize,
    /// Explicit `g_type_class_ref` calls not yet balanced.
    pub class_refs: usize,
    /// `*mut GParamSpec` installed on the class.
    pub properties: Vec<usize>,
}

pub(crate) enum Allocation {
    String,
    PointerArray(usize),
}

#[derive(Clone, Copy)]
pub(crate) struct Watch {
    pub func: GstBusFunc,
    pub user_data: usize,
    pub notify: Option<GDestroyNotify>,
    pub source_id: u32,
}

pub(crate) struct State {
    pub types: HashMap<GType, TypeNode>,
    pub by_name: HashMap<String, GType>,
    next_type: GType,
    pub quarks: Vec<CString>,
    pub quark_ids: HashMap<String, GQuark>,
    pub allocations: HashMap<usize, Allocation>,
    pub watches: HashMap<usize, Watch>,
    pub next_source: u32,
    /// Plugin list head -> registry it was taken from.
    pub plugin_lists: HashMap<usize, usize>,
}

/// Generic class storage, large enough for the class structs the runtime hands out.
#[repr(C)]
struct ClassStorage {
    g_type_class: GTypeClass,
    _rest: [u64; 16],
}

const FUNDAMENTALS: &[(GType, &str)] = &[
    (G_TYPE_NONE, "void"),
    (G_TYPE_INTERFACE, "GInterface"),
    (G_TYPE_CHAR, "gchar"),
    (G_TYPE_UCHAR, "guchar"),
    (G_TYPE_BOOLEAN, "gboolean"),
    (G_TYPE_INT, "gint"),
    (G_TYPE_UINT, "guint"),
    (G_TYPE_LONG, "glong"),
    (G_TYPE_ULONG, "gulong"),
    (G_TYPE_INT64, "gint64"),
    (G_TYPE_UINT64, "guint64"),
    (G_TYPE_ENUM, "GEnum"),
    (G_TYPE_FLAGS, "GFlags"),
    (G_TYPE_FLOAT, "gfloat"),
    (G_TYPE_DOUBLE, "gdouble"),
    (G_TYPE_STRING, "gchararray"),
    (G_TYPE_POINTER, "gpointer"),
    (G_TYPE_BOXED, "GBoxed"),
    (G_TYPE_PARAM, "GParam"),
    (G_TYPE_OBJECT, "GObject"),
    (G_TYPE_VARIANT, "GVariant"),
];

/// `(name, parent)` pairs registered at start-up, parents first.
const BUILTIN_TYPES: &[(&str, &str)] = &[
    // GstObject hierarchy
    ("GstObject", "GObject"),
    ("GstAllocator", "GstObject"),
    ("GstBufferPool", "GstObject"),
    ("GstBus", "GstObject"),
    ("GstClock", "GstObject"),
    ("GstDevice", "GstObject"),
    ("GstElement", "GstObject"),
    ("GstBin", "GstElement"),
    ("GstPipeline", "GstBin"),
    ("GstBaseSrc", "GstElement"),
    ("GstPushSrc", "GstBaseSrc"),
    ("GstAppSrc", "GstBaseSrc"),
    ("GstBaseSink", "GstElement"),
    ("GstAppSink", "GstBaseSink"),
    ("GstPluginFeature", "GstObject"),
    ("GstElementFactory", "GstPluginFeature"),
    ("GstPad", "GstObject"),
    ("GstProxyPad", "GstPad"),
    ("GstGhostPad", "GstProxyPad"),
    ("GstPadTemplate", "GstObject"),
    ("GstPlugin", "GstObject"),
    ("GstRegistry", "GstObject"),
    ("GstStream", "GstObject"),
    ("GstStreamCollection", "GstObject"),
    ("GstTask", "GstObject"),
    ("GstTaskPool", "GstObject"),
    // Interfaces
    ("GstChildProxy", "GInterface"),
    ("GstURIHandler", "GInterface"),
    ("GstTagSetter", "GInterface"),
    ("GstTocSetter", "GInterface"),
    // Mini objects and boxed types
    ("GstBuffer", "GBoxed"),
    ("GstBufferList", "GBoxed"),
    ("GstCaps", "GBoxed"),
    ("GstContext", "GBoxed"),
    ("GstEvent", "GBoxed"),
    ("GstMemory", "GBoxed"),
    ("GstMessage", "GBoxed"),
    ("GstQuery", "GBoxed"),
    ("GstSample", "GBoxed"),
    ("GstTagList", "GBoxed"),
    ("GstToc", "GBoxed"),
    ("GstTocEntry", "GBoxed"),
    ("GstUri", "GBoxed"),
    ("GstStructure", "GBoxed"),
    ("GstCapsFeatures", "GBoxed"),
    ("GValueArray", "GBoxed"),
    ("GstValueArray", "GBoxed"),
    ("GstFraction", "GBoxed"),
    // Param specs
    ("GParamChar", "GParam"),
    ("GParamOverride", "GParam"),
    ("GParamBoolean", "GParam"),
    ("GParamInt", "GParam"),
    ("GParamUInt", "GParam"),
    ("GParamInt64", "GParam"),
    ("GParamUInt64", "GParam"),
    ("GParamFloat", "GParam"),
    ("GParamDouble", "GParam"),
    ("GParamString", "GParam"),
    ("GParamEnum", "GParam"),
    ("GParamFlags", "GParam"),
    ("GParamObject", "GParam"),
    ("GParamBoxed", "GParam"),
    ("GParamPointer", "GParam"),
    ("GParamValueArray", "GParam"),
    ("GstParamFraction", "GParam"),
    ("GstParamArray", "GParam"),
];

const BUILTIN_INTERFACES: &[(&str, &str)] = &[
    ("GstBin", "GstChildProxy"),
    ("GstAppSrc", "GstURIHandler"),
    ("GstAppSink", "GstURIHandler"),
];

pub(crate) static STATE: LazyLock<Mutex<State>> = LazyLock::new(|| Mutex::new(State::new()));

pub(crate) fn state() -> MutexGuard<'static, State> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

impl State {
    fn new() -> Self {
        let mut state = Self {
            types: HashMap::new(),
            by_name: HashMap::new(),
            next_type: 0x1000,
            quarks: Vec::new(),
            quark_ids: HashMap::new(),
            allocations: HashMap::new(),
            watches: HashMap::new(),
            next_source: 1,
            plugin_lists: HashMap::new(),
        };
        for (gtype, name) in FUNDAMENTALS {
            state.insert_node(*gtype, name, 0, *gtype);
        }
        for (name, parent) in BUILTIN_TYPES {
            state.register(name, parent);
        }
        for (instance, interface) in BUILTIN_INTERFACES {
            state.add_interface(instance, interface);
        }
        state
    }

    fn insert_node(&mut self, gtype: GType, name: &str, parent: GType, fundamental: GType) {
        let c_name = CString::new(name).expect("type names contain no NUL");
        self.types.insert(
            gtype,
            TypeNode {
                name: c_name,
                parent,
                fundamental,
                interfaces: Vec::new(),
                class: 0,
                class_refs: 0,
                properties: Vec::new(),
            },
        );
        self.by_name.insert(name.to_string(), gtype);
    }

    /// Registers `name` below `parent`; returns the existing type if `name` is known.
    pub fn register(&mut self, name: &str, parent: &str) -> GType {
        if let Some(gtype) = self.by_name.get(name) {
            return *gtype;
        }
        let parent = self.lookup(parent);
        let fundamental = self.types[&parent].fundamental;
        let gtype = self.next_type;
        self.next_type += 0x10;
        self.insert_node(gtype, name, parent, fundamental);
        tracing::trace!("Registered {} as {:#x}", name, gtype);
        gtype
    }

    pub fn add_interface(&mut self, instance: &str, interface: &str) {
        let interface = self.lookup(interface);
        let instance = self.lookup(instance);
        let node = self.types.get_mut(&instance).expect("looked up above");
        if !node.interfaces.contains(&interface) {
            node.interfaces.push(interface);
        }
    }

    pub fn lookup(&self, name: &str) -> GType {
        match self.by_name.get(name) {
            Some(gtype) => *gtype,
            None => panic!("type {name} is not registered"),
        }
    }

    pub fn is_a(&self, gtype: GType, target: GType) -> bool {
        if gtype == target {
            return self.types.contains_key(&gtype);
        }
        let target_is_interface = target != G_TYPE_INTERFACE
            && self
                .types
                .get(&target)
                .is_some_and(|node| node.fundamental == G_TYPE_INTERFACE);

        let mut current = gtype;
        while let Some(node) = self.types.get(&current) {
            if current == target || (target_is_interface && node.interfaces.contains(&target)) {
                return true;
            }
            if node.parent == 0 {
                break;
            }
            current = node.parent;
        }
        false
    }

    pub fn fundamental(&self, gtype: GType) -> GType {
        self.types
            .get(&gtype)
            .map_or(G_TYPE_INVALID, |node| node.fundamental)
    }

    pub fn type_name(&self, gtype: GType) -> String {
        self.types.get(&gtype).map_or_else(
            || format!("<{gtype:#x}>"),
            |node| node.name.to_string_lossy().into_owned(),
        )
    }

    /// Returns the class of `gtype`, allocating it on first use.
    pub fn class_of(&mut self, gtype: GType) -> *mut GTypeClass {
        let node = self.types.get_mut(&gtype).expect("class of a registered type");
        if node.class == 0 {
            let class = Box::new(ClassStorage {
                g_type_class: GTypeClass { g_type: gtype },
                _rest: [0; 16],
            });
            node.class = Box::into_raw(class) as usize;
        }
        node.class as *mut GTypeClass
    }

    /// Properties of `gtype` and its ancestors, ancestors first.
    pub fn properties(&self, gtype: GType) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = gtype;
        while let Some(node) = self.types.get(&current) {
            chain.push(node);
            if node.parent == 0 {
                break;
            }
            current = node.parent;
        }
        chain
            .iter()
            .rev()
            .flat_map(|node| node.properties.iter().copied())
            .collect()
    }

    pub fn quark(&mut self, name: &str) -> GQuark {
        if let Some(quark) = self.quark_ids.get(name) {
            return *quark;
        }
        self.quarks
            .push(CString::new(name).expect("quark names contain no NUL"));
        let quark = self.quarks.len() as GQuark;
        self.quark_ids.insert(name.to_string(), quark);
        quark
    }
}

/// Duplicates `value` into a string the caller releases with `g_free`.
pub(crate) fn strdup(value: &str) -> *mut c_char {
    let ptr = CString::new(value)
        .unwrap_or_else(|_| CString::from(c"<invalid>"))
        .into_raw();
    state()
        .allocations
        .insert(ptr as usize, Allocation::String);
    ptr
}

/// Hands out a pointer array the caller releases with `g_free`.
pub(crate) fn alloc_pointer_array(values: Vec<usize>) -> *mut usize {
    let len = values.len();
    let ptr = Box::into_raw(values.into_boxed_slice()).cast::<usize>();
    state()
        .allocations
        .insert(ptr as usize, Allocation::PointerArray(len));
    ptr
}
