// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Bus watches and structure field folds.

mod common;

use std::{
    ops::ControlFlow,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex},
};

use gstbridge::{BusWatch, Error, Handle, Layout, MessageType, MiniObjectRef, is_registered, kind};
use gstbridge_sys as ffi;
use gstbridge_testkit as testkit;

type Seen = Arc<Mutex<Vec<(MessageType, u32, Option<String>)>>>;

fn message(
    registry: &gstbridge::TypeRegistry,
    type_: ffi::GstMessageType,
    src: *mut ffi::GstObject,
    seqnum: u32,
) -> MiniObjectRef<kind::Message> {
    let message = testkit::new_message(type_, src, seqnum);
    unsafe { MiniObjectRef::from_full(registry, message) }.unwrap()
}

#[test]
fn bus_messages_reach_the_closure() {
    let registry = common::setup();
    let bus = testkit::new_bus("bus-dispatch");
    let src = testkit::new_object("GstElement", "src0");
    let handle = unsafe { Handle::instance(bus) }.unwrap();
    let bus_view = registry.cast::<kind::Bus>(&handle).unwrap();

    let seen = Seen::default();
    let sink = seen.clone();
    let watch = BusWatch::add(&bus_view, move |bus, message| {
        assert_eq!(bus.name().as_deref(), Some("bus-dispatch"));
        sink.lock().unwrap().push((
            message.message_type(),
            message.seqnum(),
            message.src_name(),
        ));
        ControlFlow::Continue(())
    })
    .unwrap();
    assert!(testkit::has_watch(bus));
    assert_eq!(testkit::object_refcount(bus), 2);
    assert!(is_registered(watch.token()));
    assert_ne!(watch.source_id(), 0);

    let eos = message(&registry, ffi::GST_MESSAGE_EOS, src, 7);
    let state = message(&registry, ffi::GST_MESSAGE_STATE_CHANGED, std::ptr::null_mut(), 8);
    assert_eq!(testkit::dispatch(bus, eos.as_ptr()), Some(true));
    assert_eq!(testkit::dispatch(bus, state.as_ptr()), Some(true));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (MessageType::EOS, 7, Some("src0".to_string())),
            (MessageType::STATE_CHANGED, 8, None),
        ]
    );

    let token = watch.token();
    watch.remove();
    assert!(!testkit::has_watch(bus));
    assert!(!is_registered(token));
    assert_eq!(testkit::object_refcount(bus), 1);
    assert_eq!(testkit::dispatch(bus, eos.as_ptr()), None);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn second_watch_on_a_bus_is_refused() {
    let registry = common::setup();
    let bus = testkit::new_bus("bus-busy");
    let handle = unsafe { Handle::instance(bus) }.unwrap();
    let bus_view = registry.cast::<kind::Bus>(&handle).unwrap();

    let _first = BusWatch::add(&bus_view, |_, _| ControlFlow::Continue(())).unwrap();
    let second = BusWatch::add(&bus_view, |_, _| ControlFlow::Continue(()));
    assert!(matches!(second, Err(Error::Other(_))));
    assert_eq!(testkit::object_refcount(bus), 2);
}

#[test]
fn break_removes_the_native_watch() {
    let registry = common::setup();
    let bus = testkit::new_bus("bus-break");
    let handle = unsafe { Handle::instance(bus) }.unwrap();
    let bus_view = registry.cast::<kind::Bus>(&handle).unwrap();

    let watch = BusWatch::add(&bus_view, |_, message| {
        if message.message_type().contains(MessageType::EOS) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .unwrap();

    let info = message(&registry, ffi::GST_MESSAGE_INFO, std::ptr::null_mut(), 1);
    let eos = message(&registry, ffi::GST_MESSAGE_EOS, std::ptr::null_mut(), 2);
    assert_eq!(testkit::dispatch(bus, info.as_ptr()), Some(true));
    assert_eq!(testkit::dispatch(bus, eos.as_ptr()), Some(false));
    assert!(!testkit::has_watch(bus));

    // The closure stays registered until the guard goes away
    let token = watch.token();
    assert!(is_registered(token));
    drop(watch);
    assert!(!is_registered(token));
    assert_eq!(testkit::object_refcount(bus), 1);
}

#[test]
fn panicking_closure_stops_the_watch() {
    let registry = common::setup();
    let bus = testkit::new_bus("bus-panic");
    let handle = unsafe { Handle::instance(bus) }.unwrap();
    let bus_view = registry.cast::<kind::Bus>(&handle).unwrap();

    let watch = BusWatch::add(&bus_view, |_, _| panic!("handler failure")).unwrap();
    let eos = message(&registry, ffi::GST_MESSAGE_EOS, std::ptr::null_mut(), 3);
    assert_eq!(testkit::dispatch(bus, eos.as_ptr()), Some(false));
    assert!(!testkit::has_watch(bus));
    drop(watch);
}

#[test]
fn structure_fields_are_folded_in_order() {
    let registry = common::setup();
    let buffer = testkit::new_buffer();
    let structure = testkit::new_structure("application/x-fold");
    testkit::structure_set_int(structure, "width", 1920);
    testkit::structure_set_string(structure, "format", Some("v210"));
    testkit::structure_set_boolean(structure, "interlaced", false);
    testkit::structure_set_string(structure, "colorimetry", None);
    testkit::structure_set_boxed(structure, "buffer", "GstBuffer", buffer);

    let handle = unsafe { Handle::boxed(structure) }.unwrap();
    let view = registry.cast::<kind::Structure>(&handle).unwrap();
    assert_eq!(
        view.field_names(),
        vec!["width", "format", "interlaced", "colorimetry", "buffer"]
    );

    let mut rendered = Vec::new();
    let completed = view.fold_fields(|field| {
        if let (Some(name), Some(contents)) = (field.name(), field.value().contents()) {
            rendered.push((name, contents));
        }
        ControlFlow::Continue(())
    });
    assert!(completed);
    assert_eq!(rendered[0], ("width".to_string(), "1920".to_string()));
    assert_eq!(rendered[1], ("format".to_string(), "\"v210\"".to_string()));
    assert_eq!(rendered[2], ("interlaced".to_string(), "FALSE".to_string()));
    assert_eq!(rendered[3], ("colorimetry".to_string(), "NULL".to_string()));
    assert!(rendered[4].1.starts_with("((GstBuffer*)"));

    let mut visited = 0;
    let completed = view.fold_fields(|_| {
        visited += 1;
        ControlFlow::Break(())
    });
    assert!(!completed);
    assert_eq!(visited, 1);
}

#[test]
fn boxed_values_are_cast_by_kind() {
    let registry = common::setup();
    let buffer = testkit::new_buffer();
    let structure = testkit::new_structure("application/x-boxed");
    testkit::structure_set_int(structure, "count", 3);
    testkit::structure_set_boxed(structure, "payload", "GstBuffer", buffer);

    let handle = unsafe { Handle::boxed(structure) }.unwrap();
    let view = registry.cast::<kind::Structure>(&handle).unwrap();

    let mut checked = 0;
    view.fold_fields(|field| {
        let value = field.value();
        match field.name().as_deref() {
            Some("count") => {
                assert_eq!(value.type_name(), "gint");
                assert!(matches!(value.boxed_handle(), Err(Error::TypeMismatch { .. })));
            }
            Some("payload") => {
                let payload = value.get::<kind::Buffer>().unwrap().unwrap();
                assert_eq!(payload.as_ptr(), buffer);
                assert!(matches!(value.get::<kind::Caps>(), Err(Error::TypeMismatch { .. })));
            }
            other => panic!("unexpected field {other:?}"),
        }
        checked += 1;
        ControlFlow::Continue(())
    });
    assert_eq!(checked, 2);
}

#[test]
fn panic_in_fold_resumes_after_the_native_call() {
    let registry = common::setup();
    let structure = testkit::new_structure("application/x-panic");
    testkit::structure_set_int(structure, "a", 1);
    testkit::structure_set_int(structure, "b", 2);

    let handle = unsafe { Handle::boxed(structure) }.unwrap();
    let view = registry.cast::<kind::Structure>(&handle).unwrap();

    let mut visited = 0;
    let result = catch_unwind(AssertUnwindSafe(|| {
        view.fold_fields(|_| {
            visited += 1;
            panic!("fold failure")
        })
    }));
    assert!(result.is_err());
    assert_eq!(visited, 1);
}

#[test]
fn break_on_a_later_field_includes_it() {
    let registry = common::setup();
    let structure = testkit::new_structure("application/x-partial");
    for (field, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
        testkit::structure_set_int(structure, field, value);
    }

    let handle = unsafe { Handle::boxed(structure) }.unwrap();
    let view = registry.cast::<kind::Structure>(&handle).unwrap();

    let mut visited = Vec::new();
    let completed = view.fold_fields(|field| {
        let name = field.name().unwrap_or_default();
        let stop = name == "b";
        visited.push(name);
        if stop {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert!(!completed);
    assert_eq!(visited, vec!["a", "b"]);
}

#[test]
fn nested_structures_are_not_mini_objects() {
    let registry = common::setup();
    let inner = testkit::new_structure("inner/x-nested");
    let caps = testkit::new_caps();
    let outer = testkit::new_structure("outer/x-nested");
    testkit::structure_set_boxed(outer, "inner", "GstStructure", inner);
    testkit::structure_set_boxed(outer, "caps", "GstCaps", caps);
    testkit::structure_set_boxed(outer, "matrix", "GValueArray", std::ptr::null_mut::<u8>());

    let handle = unsafe { Handle::boxed(outer) }.unwrap();
    let view = registry.cast::<kind::Structure>(&handle).unwrap();

    let mut checked = 0;
    view.fold_fields(|field| {
        let value = field.value();
        match field.name().as_deref() {
            Some("inner") => {
                let handle = value.boxed_handle().unwrap().unwrap();
                assert_eq!(handle.layout(), Layout::Boxed);
                assert!(matches!(
                    value.get::<kind::MiniObject>(),
                    Err(Error::TypeMismatch { .. })
                ));
                let nested = value.get::<kind::Structure>().unwrap().unwrap();
                assert_eq!(nested.name().as_deref(), Some("inner/x-nested"));
            }
            Some("caps") => {
                let handle = value.boxed_handle().unwrap().unwrap();
                assert_eq!(handle.layout(), Layout::MiniObject);
                assert!(value.get::<kind::MiniObject>().unwrap().is_some());
                assert!(value.get::<kind::Structure>().is_err());
            }
            Some("matrix") => {
                assert!(matches!(value.boxed_handle(), Err(Error::TypeMismatch { .. })));
            }
            other => panic!("unexpected field {other:?}"),
        }
        checked += 1;
        ControlFlow::Continue(())
    });
    assert_eq!(checked, 3);
    assert_eq!(testkit::mini_refcount(caps), 1);

    // The nested structure keeps its own name
    let handle = unsafe { Handle::boxed(inner) }.unwrap();
    let inner = registry.cast::<kind::Structure>(&handle).unwrap();
    assert_eq!(inner.name().as_deref(), Some("inner/x-nested"));
}
