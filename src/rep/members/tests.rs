use crate::rep::RepError;
use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::HdrFlags;
use crate::rep::members::{
	METHOD_SECTION_INIT, Method, PARAMETER_SECTION_INIT, Parameter, PropFlags, QUALIFIER_SECTION_INIT,
	add_member, add_qualifier, decode_methods, decode_properties, decode_qualifiers, encode_methods,
	encode_properties, encode_qualifiers, load_value, locate, methods_wire_size, properties_wire_size,
	property_view, qualifiers_wire_size,
};
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::{CimKind, CimValue};

struct Host {
	props: Section<crate::rep::members::Property>,
	strings: StringTable,
	arrays: ArrayTable,
	flags: HdrFlags,
}

impl Host {
	fn new() -> Self {
		Self {
			props: Section::new(8),
			strings: StringTable::new(),
			arrays: ArrayTable::new(),
			flags: HdrFlags::default(),
		}
	}

	fn add(&mut self, name: &str, value: &CimValue) -> crate::rep::Result<usize> {
		add_member(
			&mut self.props,
			&mut self.strings,
			&mut self.arrays,
			&mut self.flags,
			name,
			value,
			None,
			false,
			true,
		)
	}

	fn value_of(&self, idx: usize) -> CimValue {
		let prop = self.props.get(idx).expect("record exists");
		load_value(&prop.value, &self.strings, &self.arrays).expect("value hydrates")
	}
}

#[test]
fn locate_is_case_insensitive() {
	let mut host = Host::new();
	host.add("CreationClassName", &CimValue::String("CIM_Thing".into())).expect("add succeeds");

	for probe in ["creationclassname", "CREATIONCLASSNAME", "CreationClassName"] {
		let found = locate(host.props.iter().map(|p| p.name), &host.strings, probe);
		assert_eq!(found, Some(0), "probe {probe}");
	}
	assert_eq!(locate(host.props.iter().map(|p| p.name), &host.strings, "other"), None);
}

#[test]
fn add_then_same_name_replaces_in_place() {
	let mut host = Host::new();
	let first = host.add("Caption", &CimValue::String("old".into())).expect("add succeeds");
	let second = host.add("caption", &CimValue::String("new".into())).expect("replace succeeds");
	assert_eq!(first, second);
	assert_eq!(host.props.len(), 1);
	assert_eq!(host.value_of(first), CimValue::String("new".into()));
}

#[test]
fn kind_mismatch_keeps_stored_value() {
	let mut host = Host::new();
	let idx = host.add("Count", &CimValue::Uint32(7)).expect("add succeeds");

	let err = host.add("Count", &CimValue::String("seven".into())).expect_err("mismatch fails");
	assert!(matches!(err, RepError::TypeMismatch { .. }));
	assert_eq!(host.value_of(idx), CimValue::Uint32(7));
}

#[test]
fn null_replacement_adopts_supplied_type() {
	let mut host = Host::new();
	let idx = host.add("Speed", &CimValue::Uint32(9)).expect("add succeeds");
	host.add(
		"Speed",
		&CimValue::Null {
			kind: CimKind::Sint64,
			array: false,
		},
	)
	.expect("null adopts");
	assert_eq!(
		host.value_of(idx),
		CimValue::Null {
			kind: CimKind::Sint64,
			array: false,
		}
	);
}

#[test]
fn null_then_value_allocates_a_table_entry() {
	let mut host = Host::new();
	let idx = host
		.add(
			"Owner",
			&CimValue::Null {
				kind: CimKind::String,
				array: false,
			},
		)
		.expect("null add succeeds");
	host.add("Owner", &CimValue::String("root".into())).expect("fill-in succeeds");
	assert_eq!(host.value_of(idx), CimValue::String("root".into()));
}

#[test]
fn array_replacement_goes_through_the_array_table() {
	let mut host = Host::new();
	let elems = |v: &[u16]| CimValue::Array(CimKind::Uint16, v.iter().map(|x| CimValue::Uint16(*x)).collect());
	let idx = host.add("Ports", &elems(&[80, 443])).expect("add succeeds");
	host.add("Ports", &elems(&[8080, 8443, 9090])).expect("replace succeeds");

	assert_eq!(host.arrays.len(), 1);
	assert_eq!(host.value_of(idx), elems(&[8080, 8443, 9090]));

	let err = host.add("Ports", &CimValue::Uint16(1)).expect_err("scalar over array fails");
	assert!(matches!(err, RepError::TypeMismatch { .. }));
}

#[test]
fn embedded_flagged_string_refuses_plain_replacement() {
	let mut host = Host::new();
	let idx = host.add("Config", &CimValue::String("<xml/>".into())).expect("add succeeds");
	if let Some(prop) = host.props.get_mut(idx) {
		prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
	}
	let err = host.add("Config", &CimValue::String("other".into())).expect_err("guard fires");
	assert!(matches!(err, RepError::TypeMismatch { .. }));
}

#[test]
fn qualifier_add_is_idempotent_by_name() {
	let mut strings = StringTable::new();
	let mut arrays = ArrayTable::new();
	let mut flags = HdrFlags::default();
	let mut quals = Section::new(QUALIFIER_SECTION_INIT);

	let first = add_qualifier(&mut quals, &mut strings, &mut arrays, &mut flags, "Version", &CimValue::String("2.0".into()))
		.expect("add succeeds");
	let second = add_qualifier(&mut quals, &mut strings, &mut arrays, &mut flags, "VERSION", &CimValue::String("9.9".into()))
		.expect("duplicate add succeeds");

	assert_eq!(first, second);
	assert_eq!(quals.len(), 1);
	let view = crate::rep::members::qualifier_view(quals.get(0).expect("record exists"), &strings, &arrays)
		.expect("view hydrates");
	assert_eq!(view.value, CimValue::String("2.0".into()));
}

#[test]
fn property_section_wire_round_trip() {
	let mut host = Host::new();
	host.add("Name", &CimValue::String("disk0".into())).expect("add succeeds");
	let idx = host.add("Sizes", &CimValue::Array(CimKind::Uint64, vec![CimValue::Uint64(1), CimValue::Uint64(2)]))
		.expect("add succeeds");
	let _ = idx;
	add_qualifier(
		&mut host.props.get_mut(0).expect("record exists").qualifiers,
		&mut host.strings,
		&mut host.arrays,
		&mut host.flags,
		"MaxLen",
		&CimValue::Uint32(256),
	)
	.expect("prop qualifier adds");

	let mut writer = Writer::with_capacity(properties_wire_size(&host.props));
	encode_properties(&mut writer, &host.props);
	let bytes = writer.into_bytes();
	assert_eq!(bytes.len(), properties_wire_size(&host.props));

	let decoded = decode_properties(&mut Cursor::new(&bytes), host.props.len()).expect("section decodes");
	assert_eq!(decoded, host.props);

	let view = property_view(decoded.get(0).expect("record exists"), &host.strings, &host.arrays)
		.expect("view hydrates");
	assert_eq!(view.name, "Name");
	assert_eq!(view.qualifier_count, 1);
}

#[test]
fn method_section_wire_round_trip() {
	let mut strings = StringTable::new();
	let mut arrays = ArrayTable::new();
	let mut flags = HdrFlags::default();

	let mut methods: Section<Method> = Section::new(METHOD_SECTION_INIT);
	let mut params: Section<Parameter> = Section::new(PARAMETER_SECTION_INIT);
	let mut pquals = Section::new(QUALIFIER_SECTION_INIT);
	add_qualifier(&mut pquals, &mut strings, &mut arrays, &mut flags, "In", &CimValue::Boolean(true))
		.expect("param qualifier adds");
	params.push(Parameter {
		name: strings.add_str("Target"),
		kind: CimKind::Reference,
		array: false,
		array_size: 0,
		ref_class: strings.add_str("CIM_ComputerSystem"),
		qualifiers: pquals,
	});

	let mut mquals = Section::new(QUALIFIER_SECTION_INIT);
	add_qualifier(&mut mquals, &mut strings, &mut arrays, &mut flags, "Static", &CimValue::Boolean(true))
		.expect("method qualifier adds");
	methods.push(Method {
		name: strings.add_str("RequestStateChange"),
		return_kind: CimKind::Uint32,
		return_array: false,
		flags: PropFlags::default(),
		qualifiers: mquals,
		parameters: params,
	});

	let mut writer = Writer::with_capacity(methods_wire_size(&methods));
	encode_methods(&mut writer, &methods);
	let bytes = writer.into_bytes();
	assert_eq!(bytes.len(), methods_wire_size(&methods));

	let decoded = decode_methods(&mut Cursor::new(&bytes), methods.len()).expect("section decodes");
	assert_eq!(decoded, methods);
}

#[test]
fn qualifier_section_wire_round_trip() {
	let mut strings = StringTable::new();
	let mut arrays = ArrayTable::new();
	let mut flags = HdrFlags::default();
	let mut quals = Section::new(QUALIFIER_SECTION_INIT);
	add_qualifier(&mut quals, &mut strings, &mut arrays, &mut flags, "Description", &CimValue::String("text".into()))
		.expect("add succeeds");
	add_qualifier(
		&mut quals,
		&mut strings,
		&mut arrays,
		&mut flags,
		"ValueMap",
		&CimValue::Array(CimKind::String, vec![CimValue::String("0".into()), CimValue::String("1".into())]),
	)
	.expect("array qualifier adds");

	let mut writer = Writer::with_capacity(qualifiers_wire_size(&quals));
	encode_qualifiers(&mut writer, &quals);
	let bytes = writer.into_bytes();
	assert_eq!(bytes.len(), qualifiers_wire_size(&quals));

	let decoded = decode_qualifiers(&mut Cursor::new(&bytes), quals.len()).expect("section decodes");
	assert_eq!(decoded, quals);
}

#[test]
fn keyed_bit_survives_replacement() {
	let mut host = Host::new();
	let idx = add_member(
		&mut host.props,
		&mut host.strings,
		&mut host.arrays,
		&mut host.flags,
		"Id",
		&CimValue::Uint32(1),
		None,
		true,
		true,
	)
	.expect("keyed add succeeds");
	host.add("Id", &CimValue::Uint32(2)).expect("replace succeeds");
	let prop = host.props.get(idx).expect("record exists");
	assert!(prop.value.flags.contains(crate::rep::value::ValueFlags::KEYED));
}

#[test]
fn array_member_rejected_when_arrays_are_disallowed() {
	let mut host = Host::new();
	let err = add_member(
		&mut host.props,
		&mut host.strings,
		&mut host.arrays,
		&mut host.flags,
		"Keys",
		&CimValue::Array(CimKind::Uint8, vec![]),
		None,
		true,
		false,
	)
	.expect_err("array key fails");
	assert!(matches!(err, RepError::ArrayKeyUnsupported { .. }));
	assert!(host.props.is_empty());
}

#[test]
fn string_id_sentinel_is_zero() {
	assert!(StringId::NONE.is_none());
	assert!(!StringId(3).is_none());
}
