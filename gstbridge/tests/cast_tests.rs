// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Tag-checked casts across the four layout families.

mod common;

use gstbridge::{Error, Handle, Layout, MiniObjectRef, kind};
use gstbridge_sys as ffi;
use gstbridge_testkit as testkit;

#[test]
fn cast_accepts_exact_type_and_subtypes() {
    let registry = common::setup();
    let pipeline = testkit::new_object("GstPipeline", "main");
    let handle = unsafe { Handle::instance(pipeline) }.unwrap();

    let element = registry.cast::<kind::Element>(&handle).unwrap();
    assert_eq!(element.type_name(), "GstPipeline");
    assert_eq!(element.name().as_deref(), Some("main"));

    let bin = element.cast::<kind::Bin>().unwrap();
    assert_eq!(bin.as_ptr().cast::<ffi::GstObject>(), pipeline);
    assert!(registry.cast::<kind::Pipeline>(&handle).is_ok());
    assert!(registry.cast::<kind::GObject>(&handle).is_ok());
}

#[test]
fn cast_rejects_unrelated_types() {
    let registry = common::setup();
    let bus = testkit::new_bus("bus0");
    let handle = unsafe { Handle::instance(bus) }.unwrap();

    match registry.cast::<kind::Element>(&handle) {
        Err(Error::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, "GstElement");
            assert_eq!(actual, "GstBus");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn cast_rejects_layout_mismatch_without_reading() {
    let registry = common::setup();
    let element = testkit::new_object("GstElement", "el");
    let handle = unsafe { Handle::instance(element) }.unwrap();

    match registry.cast::<kind::Buffer>(&handle) {
        Err(Error::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, "GstBuffer");
            assert_eq!(actual, "<type instance>");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let structure = testkit::new_structure("video/x-raw");
    let boxed = unsafe { Handle::boxed(structure) }.unwrap();
    assert!(matches!(
        registry.cast::<kind::MiniObject>(&boxed),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn interfaces_are_checked_by_conformance() {
    let registry = common::setup();
    testkit::register_type("CastTestUriSrc", "GstElement");
    testkit::add_interface("CastTestUriSrc", "GstURIHandler");

    let custom = testkit::new_object("CastTestUriSrc", "custom");
    let appsrc = testkit::new_object("GstAppSrc", "appsrc0");
    let plain = testkit::new_object("GstElement", "plain");
    let bin = testkit::new_object("GstBin", "bin0");

    let custom = unsafe { Handle::instance(custom) }.unwrap();
    let appsrc = unsafe { Handle::instance(appsrc) }.unwrap();
    let plain = unsafe { Handle::instance(plain) }.unwrap();
    let bin = unsafe { Handle::instance(bin) }.unwrap();

    assert!(registry.conforms::<kind::UriHandler>(&custom));
    assert!(registry.conforms::<kind::UriHandler>(&appsrc));
    assert!(!registry.conforms::<kind::UriHandler>(&plain));
    assert!(registry.conforms::<kind::ChildProxy>(&bin));
    assert!(!registry.conforms::<kind::ChildProxy>(&plain));
    assert!(!registry.conforms::<kind::TagSetter>(&appsrc));
}

#[test]
fn mini_objects_and_boxed_structures() {
    let registry = common::setup();
    let buffer = testkit::new_buffer();
    let owned = unsafe { MiniObjectRef::<kind::Buffer>::from_full(&registry, buffer) }.unwrap();
    let handle = unsafe { Handle::mini_object(buffer) }.unwrap();
    assert_eq!(handle.layout(), Layout::MiniObject);

    let view = registry.cast::<kind::Buffer>(&handle).unwrap();
    assert_eq!(view.pts(), None);
    assert!(registry.cast::<kind::MiniObject>(&handle).is_ok());
    assert!(registry.cast::<kind::Caps>(&handle).is_err());

    let structure = testkit::new_structure("audio/x-raw");
    let boxed = unsafe { Handle::boxed(structure) }.unwrap();
    let structure = registry.cast::<kind::Structure>(&boxed).unwrap();
    assert_eq!(structure.name().as_deref(), Some("audio/x-raw"));

    let counters = testkit::probe(buffer);
    drop(owned);
    assert_eq!(counters.frees(), 1);
}

#[test]
fn class_structures_cast_by_their_own_type() {
    let registry = common::setup();
    let class = testkit::class_pointer("GstBin");
    let handle = unsafe { Handle::class(class) }.unwrap();

    let element_class = registry.cast_class::<kind::Element>(&handle).unwrap();
    assert_eq!(element_class.type_name(), "GstBin");
    assert_eq!(element_class.as_ptr(), class);
    assert!(registry.cast_class::<kind::Bus>(&handle).is_err());

    let instance = unsafe { Handle::instance(testkit::new_object("GstBin", "b")) }.unwrap();
    assert!(matches!(
        registry.cast_class::<kind::Element>(&instance),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn unusable_handles_are_invalid() {
    let registry = common::setup();

    let mut instance = ffi::GTypeInstance {
        g_class: std::ptr::null_mut(),
    };
    let handle = unsafe { Handle::instance(&mut instance) }.unwrap();
    assert!(matches!(
        registry.cast::<kind::Element>(&handle),
        Err(Error::InvalidHandle)
    ));

    let buffer = testkit::new_buffer();
    let mut released = unsafe { *buffer };
    released.mini_object.refcount = 0;
    let handle = unsafe { Handle::mini_object(&mut released) }.unwrap();
    assert!(matches!(
        registry.cast::<kind::Buffer>(&handle),
        Err(Error::InvalidHandle)
    ));
}

#[test]
fn unregistered_types_are_resolved_later() {
    let registry = common::setup();
    assert!(matches!(
        registry.resolve_name("CastTestLateType"),
        Err(Error::UnregisteredType("CastTestLateType"))
    ));

    let gtype = testkit::register_type("CastTestLateType", "GstObject");
    assert_eq!(registry.resolve_name("CastTestLateType").unwrap(), gtype);
    assert_eq!(registry.resolve(kind::Kind::MiniObject).unwrap(), ffi::G_TYPE_BOXED);
    assert_eq!(registry.fundamental(gtype), ffi::G_TYPE_OBJECT);
}

#[test]
fn object_flags_are_readable() {
    let registry = common::setup();
    let sink = testkit::new_object("GstBaseSink", "sink");
    testkit::set_object_flags(sink, ffi::GST_ELEMENT_FLAG_SINK | ffi::GST_OBJECT_FLAG_CONSTRUCTED);

    let handle = unsafe { Handle::instance(sink) }.unwrap();
    let sink = registry.cast::<kind::BaseSink>(&handle).unwrap();
    assert!(sink.flag_is_set(ffi::GST_ELEMENT_FLAG_SINK));
    assert!(!sink.flag_is_set(ffi::GST_ELEMENT_FLAG_SOURCE));
}

#[test]
fn generic_mini_object_requires_a_mini_object_type() {
    let registry = common::setup();
    let array = testkit::new_mini_object("GValueArray");
    let handle = unsafe { Handle::mini_object(array) }.unwrap();

    match registry.cast::<kind::MiniObject>(&handle) {
        Err(Error::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, "GstMiniObject");
            assert_eq!(actual, "GValueArray");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let event = testkit::new_mini_object("GstEvent");
    let handle = unsafe { Handle::mini_object(event) }.unwrap();
    assert!(registry.cast::<kind::MiniObject>(&handle).is_ok());
}
