use crate::rep::RepError;
use crate::rep::path::ObjectPath;
use crate::rep::value::{CimKind, CimValue};

fn sample_path() -> ObjectPath {
	let mut path = ObjectPath::new(Some("root/cimv2"), Some("Linux_Processor"));
	path.add_key("SystemName", &CimValue::String("host01".into())).expect("key adds");
	path.add_key("DeviceID", &CimValue::String("cpu0".into())).expect("key adds");
	path.add_key("Index", &CimValue::Uint32(0)).expect("key adds");
	path
}

#[test]
fn components_read_back() {
	let mut path = sample_path();
	assert_eq!(path.namespace(), Some("root/cimv2"));
	assert_eq!(path.class_name(), Some("Linux_Processor"));
	assert_eq!(path.host_name(), None);

	path.set_host_name(Some("mgmt.example.org")).expect("host sets");
	assert_eq!(path.host_name(), Some("mgmt.example.org"));
	path.set_host_name(Some("other.example.org")).expect("host replaces");
	assert_eq!(path.host_name(), Some("other.example.org"));
	path.set_host_name(None).expect("host clears");
	assert_eq!(path.host_name(), None);
}

#[test]
fn set_namespace_replaces_in_place() {
	let mut path = sample_path();
	path.set_namespace(Some("root/interop")).expect("namespace replaces");
	assert_eq!(path.namespace(), Some("root/interop"));
	assert_eq!(path.class_name(), Some("Linux_Processor"));
	assert_eq!(path.key_at(0).expect("key hydrates").value, CimValue::String("host01".into()));
}

#[test]
fn keys_carry_the_keyed_state() {
	let path = sample_path();
	let view = path.key_at(2).expect("key hydrates");
	assert_eq!(view.name, "Index");
	assert_eq!(view.value, CimValue::Uint32(0));
	assert_eq!(path.locate_key("deviceid"), Some(1));
}

#[test]
fn array_valued_keys_are_rejected() {
	let mut path = sample_path();
	let err = path
		.add_key("Bad", &CimValue::Array(CimKind::Uint8, vec![CimValue::Uint8(1)]))
		.expect_err("array key fails");
	assert!(matches!(err, RepError::ArrayKeyUnsupported { .. }));
	assert_eq!(path.key_count(), 3);
}

#[test]
fn rebuild_then_relocate_round_trips() {
	let mut path = sample_path();
	path.set_host_name(Some("mgmt.example.org")).expect("host sets");

	let bytes = path.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), path.size());

	let back = ObjectPath::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.namespace(), path.namespace());
	assert_eq!(back.class_name(), path.class_name());
	assert_eq!(back.host_name(), path.host_name());
	assert_eq!(back.key_count(), path.key_count());
	for idx in 0..path.key_count() {
		assert_eq!(
			back.key_at(idx).expect("key hydrates"),
			path.key_at(idx).expect("key hydrates"),
		);
	}
}

#[test]
fn display_renders_canonical_form() {
	let mut path = ObjectPath::new(Some("root/cimv2"), Some("Linux_Disk"));
	path.set_host_name(Some("node1")).expect("host sets");
	path.add_key("Name", &CimValue::String("sda".into())).expect("key adds");
	path.add_key("Ready", &CimValue::Boolean(true)).expect("key adds");
	path.add_key("Slot", &CimValue::Uint8(3)).expect("key adds");
	assert_eq!(path.to_string(), "//node1/root/cimv2:Linux_Disk.Name=\"sda\",Ready=TRUE,Slot=3");
}

#[test]
fn key_replacement_validates_type() {
	let mut path = sample_path();
	path.add_key("Index", &CimValue::Uint32(4)).expect("replace succeeds");
	assert_eq!(path.key_at(2).expect("key hydrates").value, CimValue::Uint32(4));

	let err = path.add_key("Index", &CimValue::String("four".into())).expect_err("mismatch fails");
	assert!(matches!(err, RepError::TypeMismatch { .. }));
}
