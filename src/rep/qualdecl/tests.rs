use crate::rep::qualdecl::{QualifierDeclaration, flavor, scope};
use crate::rep::value::{CimKind, CimValue};

fn sample_decl() -> QualifierDeclaration {
	let mut decl = QualifierDeclaration::new(Some("root/cimv2"), Some("MaxLen"));
	decl.set_scope(scope::PROPERTY | scope::PARAMETER);
	decl.set_flavor(flavor::OVERRIDABLE | flavor::TO_SUBCLASS);
	decl.set_declared(CimKind::Uint32, false);
	decl.set_data(&CimValue::Uint32(256)).expect("data sets");
	decl
}

#[test]
fn fields_read_back() {
	let decl = sample_decl();
	assert_eq!(decl.name(), Some("MaxLen"));
	assert_eq!(decl.namespace(), Some("root/cimv2"));
	assert_eq!(decl.scope(), scope::PROPERTY | scope::PARAMETER);
	assert_eq!(decl.flavor(), flavor::OVERRIDABLE | flavor::TO_SUBCLASS);
	assert_eq!(decl.declared(), (CimKind::Uint32, false));
	assert_eq!(decl.data().expect("data hydrates"), Some(CimValue::Uint32(256)));
}

#[test]
fn set_data_replaces_the_single_record() {
	let mut decl = sample_decl();
	decl.set_data(&CimValue::Uint32(512)).expect("data replaces");
	assert_eq!(decl.data().expect("data hydrates"), Some(CimValue::Uint32(512)));
}

#[test]
fn declaration_without_data_hydrates_to_none() {
	let decl = QualifierDeclaration::new(Some("root/cimv2"), Some("Counter"));
	assert_eq!(decl.data().expect("data hydrates"), None);
}

#[test]
fn array_default_values_are_supported() {
	let mut decl = QualifierDeclaration::new(Some("root/cimv2"), Some("ValueMap"));
	decl.set_declared(CimKind::String, true);
	decl.set_data(&CimValue::Array(
		CimKind::String,
		vec![CimValue::String("0".into()), CimValue::String("1".into())],
	))
	.expect("array data sets");

	let bytes = decl.rebuild().expect("rebuild succeeds");
	let back = QualifierDeclaration::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.declared(), (CimKind::String, true));
	assert_eq!(back.data().expect("data hydrates"), decl.data().expect("data hydrates"));
}

#[test]
fn rebuild_then_relocate_round_trips() {
	let decl = sample_decl();
	let bytes = decl.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), decl.size());

	let back = QualifierDeclaration::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.name(), decl.name());
	assert_eq!(back.namespace(), decl.namespace());
	assert_eq!(back.scope(), decl.scope());
	assert_eq!(back.flavor(), decl.flavor());
	assert_eq!(back.declared(), decl.declared());
	assert_eq!(back.array_size(), decl.array_size());
	assert_eq!(back.data().expect("data hydrates"), decl.data().expect("data hydrates"));
}
