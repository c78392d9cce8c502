#![allow(missing_docs)]

use cimrep::rep::{ArgumentList, CimKind, CimValue, Class, Instance, ObjectPath, QualifierDeclaration};

/// Build an instance that exercises every value family: scalars,
/// strings, datetimes, references, arrays, and an embedded instance.
fn rich_instance() -> Instance {
	let mut inner = Instance::new(Some("root/cimv2"), Some("Linux_Sensor"));
	inner.add_property("Reading", &CimValue::Real32(36.5)).expect("property adds");

	let mut inst = Instance::new(Some("root/cimv2"), Some("Linux_Board"));
	inst.add_property("Tag", &CimValue::String("board-7".into())).expect("property adds");
	inst.add_property("Serial", &CimValue::Uint64(0x00C0_FFEE)).expect("property adds");
	inst.add_property("InstallDate", &CimValue::DateTime("20250807090000.000000+000".into()))
		.expect("property adds");
	inst.add_property("Chassis", &CimValue::Ref("root/cimv2:Linux_Chassis.Tag=\"c1\"".into()))
		.expect("property adds");
	inst.add_property(
		"Temperatures",
		&CimValue::Array(
			CimKind::Sint16,
			vec![CimValue::Sint16(-3), CimValue::Sint16(21), CimValue::Sint16(88)],
		),
	)
	.expect("property adds");
	inst.add_property("Sensor", &CimValue::Instance(Box::new(inner))).expect("property adds");
	inst
}

#[test]
fn instance_round_trip_preserves_every_value_family() {
	let inst = rich_instance();
	let bytes = inst.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), inst.size(), "size pass must match rebuild output");

	let back = Instance::relocate(&bytes).expect("relocate succeeds");
	for idx in 0..inst.property_count() {
		assert_eq!(
			back.property_at(idx).expect("property hydrates"),
			inst.property_at(idx).expect("property hydrates"),
		);
	}
}

#[test]
fn doubly_nested_embedded_instances_round_trip() {
	let mut outer = Instance::new(Some("root/cimv2"), Some("Linux_Enclosure"));
	outer.add_property("Board", &CimValue::Instance(Box::new(rich_instance()))).expect("property adds");

	let bytes = outer.rebuild().expect("rebuild succeeds");
	let back = Instance::relocate(&bytes).expect("relocate succeeds");

	let CimValue::Instance(board) = back.property_at(0).expect("property hydrates").value else {
		panic!("expected embedded board instance");
	};
	let idx = board.locate_property("Sensor").expect("nested property located");
	let CimValue::Instance(sensor) = board.property_at(idx).expect("property hydrates").value else {
		panic!("expected doubly nested sensor instance");
	};
	assert_eq!(sensor.class_name(), Some("Linux_Sensor"));
	assert_eq!(sensor.property_at(0).expect("property hydrates").value, CimValue::Real32(36.5));
}

#[test]
fn every_object_kind_survives_flatten_and_relocate() {
	let mut cls = Class::new(Some("Linux_Board"), Some("CIM_Card"));
	cls.add_property("Tag", &CimValue::String("".into()), None).expect("property adds");
	let class_bytes = cls.rebuild().expect("rebuild succeeds");
	assert_eq!(Class::relocate(&class_bytes).expect("relocate succeeds").name(), Some("Linux_Board"));

	let mut path = ObjectPath::new(Some("root/cimv2"), Some("Linux_Board"));
	path.add_key("Tag", &CimValue::String("board-7".into())).expect("key adds");
	let path_bytes = path.rebuild().expect("rebuild succeeds");
	assert_eq!(ObjectPath::relocate(&path_bytes).expect("relocate succeeds").key_count(), 1);

	let mut args = ArgumentList::new();
	args.add_argument("Timeout", &CimValue::Uint32(30)).expect("argument adds");
	let args_bytes = args.rebuild().expect("rebuild succeeds");
	assert_eq!(ArgumentList::relocate(&args_bytes).expect("relocate succeeds").argument_count(), 1);

	let mut decl = QualifierDeclaration::new(Some("root/cimv2"), Some("MaxLen"));
	decl.set_data(&CimValue::Uint32(128)).expect("data sets");
	let decl_bytes = decl.rebuild().expect("rebuild succeeds");
	assert_eq!(
		QualifierDeclaration::relocate(&decl_bytes).expect("relocate succeeds").data().expect("data hydrates"),
		Some(CimValue::Uint32(128)),
	);
}

#[test]
fn size_is_exact_for_every_kind() {
	let inst = rich_instance();
	assert_eq!(inst.rebuild().expect("rebuild succeeds").len(), inst.size());

	let mut cls = Class::new(Some("Linux_Board"), None);
	cls.add_method("Reset", CimKind::Uint32, false).expect("method adds");
	assert_eq!(cls.rebuild().expect("rebuild succeeds").len(), cls.size());

	let path = ObjectPath::new(Some("root/cimv2"), Some("Linux_Board"));
	assert_eq!(path.rebuild().expect("rebuild succeeds").len(), path.size());

	let args = ArgumentList::new();
	assert_eq!(args.rebuild().expect("rebuild succeeds").len(), args.size());

	let decl = QualifierDeclaration::new(Some("root/cimv2"), Some("Deprecated"));
	assert_eq!(decl.rebuild().expect("rebuild succeeds").len(), decl.size());
}

#[test]
fn flattened_buffers_relocate_from_a_copied_region() {
	// Cross-process transport moves flattened blobs verbatim; a copy
	// at a different address must relocate identically.
	let inst = rich_instance();
	let bytes = inst.rebuild().expect("rebuild succeeds");
	let copied: Vec<u8> = bytes.clone();
	drop(bytes);

	let back = Instance::relocate(&copied).expect("relocate succeeds");
	assert_eq!(back.class_name(), Some("Linux_Board"));
	assert_eq!(back.property_count(), inst.property_count());
}
