// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Property introspection.

mod common;

use std::sync::Arc;

use gstbridge::{
    EnumValueEntry, Error, FlagsValueEntry, Handle, NumericRange, ParamDescriptor, ParamFlags,
    ParamIntrospector, PropertyInfo, kind,
};
use gstbridge_sys as ffi;
use gstbridge_testkit::{self as testkit, param};

fn describe(introspector: &ParamIntrospector, spec: *mut ffi::GParamSpec) -> PropertyInfo {
    let handle = unsafe { Handle::instance(spec) }.unwrap();
    let pspec = introspector.registry().cast::<kind::ParamSpec>(&handle).unwrap();
    introspector.describe(&pspec).unwrap()
}

fn descriptor(introspector: &ParamIntrospector, spec: *mut ffi::GParamSpec) -> ParamDescriptor {
    describe(introspector, spec).descriptor.unwrap()
}

#[test]
fn scalar_kinds_are_classified() {
    let introspector = ParamIntrospector::new(common::setup());

    assert_eq!(
        descriptor(&introspector, param("sync").boolean(true)),
        ParamDescriptor::Boolean { default: true }
    );
    assert_eq!(
        descriptor(&introspector, param("port").uint(1, 65535, 5004)),
        ParamDescriptor::Numeric(NumericRange::UInt32 {
            min: 1,
            max: 65535,
            default: 5004
        })
    );
    assert_eq!(
        descriptor(&introspector, param("offset").int(-10, 10, 0)),
        ParamDescriptor::Numeric(NumericRange::Int32 {
            min: -10,
            max: 10,
            default: 0
        })
    );
    assert_eq!(
        descriptor(&introspector, param("ts-offset").int64(i64::MIN, i64::MAX, 0)),
        ParamDescriptor::Numeric(NumericRange::Int64 {
            min: i64::MIN,
            max: i64::MAX,
            default: 0
        })
    );
    assert_eq!(
        descriptor(&introspector, param("max-size-bytes").uint64(0, u64::MAX, 4096)),
        ParamDescriptor::Numeric(NumericRange::UInt64 {
            min: 0,
            max: u64::MAX,
            default: 4096
        })
    );
    assert_eq!(
        descriptor(&introspector, param("volume").double(0.0, 10.0, 1.0)),
        ParamDescriptor::Numeric(NumericRange::Double {
            min: 0.0,
            max: 10.0,
            default: 1.0
        })
    );
    assert_eq!(
        descriptor(&introspector, param("alpha").float(0.0, 1.0, 0.5)),
        ParamDescriptor::Numeric(NumericRange::Float {
            min: 0.0,
            max: 1.0,
            default: 0.5
        })
    );
    assert_eq!(
        descriptor(&introspector, param("location").string(Some("/tmp/out"))),
        ParamDescriptor::String {
            default: Some("/tmp/out".to_string())
        }
    );
    assert_eq!(
        descriptor(&introspector, param("uri").string(None)),
        ParamDescriptor::String { default: None }
    );
    assert_eq!(
        descriptor(&introspector, param("framerate").fraction((0, 1), (60, 1), (30, 1))),
        ParamDescriptor::Fraction {
            min_num: 0,
            min_den: 1,
            max_num: 60,
            max_den: 1,
            default_num: 30,
            default_den: 1,
        }
    );
}

#[test]
fn reference_kinds_record_type_names() {
    let introspector = ParamIntrospector::new(common::setup());
    testkit::register_type("ParamTestHandle", "gpointer");

    assert_eq!(
        descriptor(&introspector, param("sink").object("GstElement")),
        ParamDescriptor::Object {
            type_name: "GstElement".to_string()
        }
    );
    assert_eq!(
        descriptor(&introspector, param("caps").boxed("GstCaps")),
        ParamDescriptor::Boxed {
            type_name: "GstCaps".to_string()
        }
    );
    assert_eq!(
        descriptor(&introspector, param("user-data").pointer(None)),
        ParamDescriptor::Pointer { type_name: None }
    );
    assert_eq!(
        descriptor(&introspector, param("context").pointer(Some("ParamTestHandle"))),
        ParamDescriptor::Pointer {
            type_name: Some("ParamTestHandle".to_string())
        }
    );
}

#[test]
fn arrays_report_their_element_type() {
    let introspector = ParamIntrospector::new(common::setup());

    let element = param("channel").int(0, 63, 0);
    assert_eq!(
        descriptor(&introspector, param("channels").value_array(element)),
        ParamDescriptor::ArrayOfValues {
            element_type_name: Some("gint".to_string())
        }
    );

    let element = param("weight").double(0.0, 1.0, 0.0);
    assert_eq!(
        descriptor(&introspector, param("weights").gst_array(element)),
        ParamDescriptor::ArrayOfValues {
            element_type_name: Some("gdouble".to_string())
        }
    );

    assert_eq!(
        descriptor(&introspector, param("matrix").boxed("GstValueArray")),
        ParamDescriptor::ArrayOfValues {
            element_type_name: None
        }
    );

    assert_eq!(
        descriptor(&introspector, param("empty").value_array(std::ptr::null_mut())),
        ParamDescriptor::ArrayOfValues {
            element_type_name: None
        }
    );
}

#[test]
fn enum_and_flags_tables_are_walked() {
    let introspector = ParamIntrospector::new(common::setup());
    let mode = testkit::register_enum(
        "ParamTestMode",
        &[
            (0, "PARAM_TEST_MODE_OFF", "off"),
            (1, "PARAM_TEST_MODE_ON", "on"),
            (4, "PARAM_TEST_MODE_AUTO", "auto"),
        ],
    );
    let features = testkit::register_flags(
        "ParamTestFeatures",
        &[
            (1, "PARAM_TEST_FEATURE_A", "a"),
            (2, "PARAM_TEST_FEATURE_B", "b"),
        ],
    );

    match descriptor(&introspector, param("mode").enumeration(mode, 4)) {
        ParamDescriptor::Enum { values, default } => {
            assert_eq!(default, 4);
            assert_eq!(values.len(), 3);
            assert_eq!(
                values[2],
                EnumValueEntry {
                    value: 4,
                    nick: "auto".to_string(),
                    name: "PARAM_TEST_MODE_AUTO".to_string(),
                }
            );
        }
        other => panic!("unexpected descriptor: {other:?}"),
    }

    match descriptor(&introspector, param("features").flags(features, 3)) {
        ParamDescriptor::Flags { values, default } => {
            assert_eq!(default, 3);
            assert_eq!(
                values.first(),
                Some(&FlagsValueEntry {
                    value: 1,
                    nick: "a".to_string(),
                    name: "PARAM_TEST_FEATURE_A".to_string(),
                })
            );
        }
        other => panic!("unexpected descriptor: {other:?}"),
    }
}

#[test]
fn value_tables_are_cached_and_classes_released_on_drop() {
    let introspector = ParamIntrospector::new(common::setup());
    let level = testkit::register_enum(
        "ParamTestLevel",
        &[(0, "PARAM_TEST_LEVEL_LOW", "low"), (1, "PARAM_TEST_LEVEL_HIGH", "high")],
    );

    let first = introspector.enum_values(level).unwrap();
    let second = introspector.enum_values(level).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(testkit::class_ref_count(level), 1);

    drop(introspector);
    assert_eq!(testkit::class_ref_count(level), 0);
    assert_eq!(first.len(), 2);
}

#[test]
fn unknown_kinds_degrade_to_generic_rendering() {
    let introspector = ParamIntrospector::new(common::setup());
    let spec = param("initial").of_kind("GParamChar", ffi::G_TYPE_CHAR);

    let handle = unsafe { Handle::instance(spec) }.unwrap();
    let pspec = introspector.registry().cast::<kind::ParamSpec>(&handle).unwrap();
    match introspector.classify(&pspec) {
        Err(error @ Error::UnknownPropertyKind { .. }) => assert!(error.is_soft()),
        other => panic!("unexpected result: {other:?}"),
    }

    let info = introspector.describe(&pspec).unwrap();
    assert_eq!(info.name, "initial");
    assert_eq!(info.value_type_name, "gchar");
    assert!(info.descriptor.is_none());
}

#[test]
fn metadata_is_collected() {
    let introspector = ParamIntrospector::new(common::setup());

    let spec = param("latency")
        .with_nick("Latency")
        .with_blurb("Additional latency in nanoseconds")
        .with_flags(
            ffi::G_PARAM_READABLE
                | ffi::G_PARAM_WRITABLE
                | ffi::GST_PARAM_MUTABLE_PLAYING
                | ffi::G_PARAM_STATIC_NAME,
        )
        .uint64(0, u64::MAX, 0);
    let info = describe(&introspector, spec);
    assert_eq!(info.nick, "Latency");
    assert_eq!(info.blurb.as_deref(), Some("Additional latency in nanoseconds"));
    assert!(info.flags.contains(ParamFlags::MUTABLE_PLAYING));
    assert_eq!(
        info.flags.gst_flags_string(),
        "readable, writable, changeable in NULL, READY, PAUSED or PLAYING state"
    );
    assert_eq!(info.value_type_name, "guint64");

    let plain = describe(&introspector, param("silent").boolean(false));
    assert_eq!(plain.nick, "silent");
    assert_eq!(plain.blurb, None);
}

#[test]
fn class_properties_are_listed_ancestors_first() {
    let registry = common::setup();
    let introspector = ParamIntrospector::new(registry.clone());
    testkit::register_type("ParamTestBase", "GstElement");
    testkit::register_type("ParamTestSink", "ParamTestBase");
    testkit::register_type("ParamTestEmpty", "GstElement");
    testkit::install_property("ParamTestBase", param("sync").boolean(true));
    testkit::install_property("ParamTestSink", param("location").string(None));

    let sink = testkit::new_object("ParamTestSink", "sink0");
    let handle = unsafe { Handle::instance(sink) }.unwrap();
    let object = registry.cast::<kind::GObject>(&handle).unwrap();

    let properties = introspector.properties(&object).unwrap();
    let names: Vec<_> = properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["sync", "location"]);
    assert_eq!(properties[0].owner_type_name, "ParamTestBase");
    assert_eq!(properties[1].owner_type_name, "ParamTestSink");

    let empty = testkit::new_object("ParamTestEmpty", "empty0");
    let handle = unsafe { Handle::instance(empty) }.unwrap();
    let object = registry.cast::<kind::GObject>(&handle).unwrap();
    assert!(introspector.properties(&object).unwrap().is_empty());
}

#[test]
fn property_info_serializes_for_inspection_output() {
    let introspector = ParamIntrospector::new(common::setup());
    let spec = param("blocksize")
        .with_flags(ffi::G_PARAM_READABLE | ffi::GST_PARAM_CONTROLLABLE)
        .uint(1, 1 << 20, 4096);

    let value = serde_json::to_value(describe(&introspector, spec)).unwrap();
    assert_eq!(value["name"], "blocksize");
    assert_eq!(value["flags"], "readable, controllable");
    assert_eq!(value["descriptor"]["kind"], "numeric");
    assert_eq!(value["descriptor"]["type"], "u32");
    assert_eq!(value["descriptor"]["max"], 1 << 20);
}

#[test]
fn overridden_properties_follow_their_target() {
    let introspector = ParamIntrospector::new(common::setup());
    let volume = param("volume").double(0.0, 10.0, 1.0);
    let mute = param("mute").boolean(false);

    let info = describe(&introspector, param("volume").overriding(volume));
    assert_eq!(info.name, "volume");
    assert_eq!(info.value_type_name, "gdouble");
    assert_eq!(
        info.descriptor,
        Some(ParamDescriptor::Numeric(NumericRange::Double {
            min: 0.0,
            max: 10.0,
            default: 1.0
        }))
    );
    assert_eq!(
        descriptor(&introspector, param("mute").overriding(mute)),
        ParamDescriptor::Boolean { default: false }
    );
}

#[test]
fn properties_sharing_an_enum_type_share_its_table() {
    let introspector = ParamIntrospector::new(common::setup());
    let direction = testkit::register_enum(
        "ParamTestDirection",
        &[(0, "PARAM_TEST_DIRECTION_IN", "in"), (1, "PARAM_TEST_DIRECTION_OUT", "out")],
    );

    let values = |spec| match descriptor(&introspector, spec) {
        ParamDescriptor::Enum { values, .. } => values,
        other => panic!("unexpected descriptor: {other:?}"),
    };
    let first = values(param("direction").enumeration(direction, 0));
    let second = values(param("fallback-direction").enumeration(direction, 1));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(testkit::class_ref_count(direction), 1);
    assert_eq!(second[1].nick, "out");
}
