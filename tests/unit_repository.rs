#![allow(missing_docs)]

use std::path::PathBuf;

use cimrep::rep::{
	CacheLimits, CimValue, Class, ReadCtl, Repository, StoreWriter, VersionRecord,
};

fn temp_root(tag: &str) -> PathBuf {
	let root = std::env::temp_dir().join(format!("cimrep-it-{tag}-{}", std::process::id()));
	let _ = std::fs::remove_dir_all(&root);
	std::fs::create_dir_all(&root).expect("temp root creates");
	root
}

fn write_reduced_hierarchy(dir: &PathBuf, gzip: bool) {
	std::fs::create_dir_all(dir).expect("namespace dir creates");
	let mut writer = StoreWriter::new(&VersionRecord::new(true, "Thu Aug  7 09:00:00 2025"));

	let mut element = Class::new(Some("CIM_ManagedElement"), None);
	element.add_qualifier("Abstract", &CimValue::Boolean(true)).expect("qualifier adds");
	element.add_property("Caption", &CimValue::Null { kind: cimrep::rep::CimKind::String, array: false }, None)
		.expect("property adds");
	writer.add_class(&element).expect("class appends");

	let mut system = Class::new(Some("CIM_System"), Some("CIM_ManagedElement"));
	let key = system.add_property("Name", &CimValue::Null { kind: cimrep::rep::CimKind::String, array: false }, None)
		.expect("property adds");
	system.add_property_qualifier(key, "Key", &CimValue::Boolean(true)).expect("key fast-path adds");
	system.mark_incomplete();
	writer.add_class(&system).expect("class appends");

	let mut linux = Class::new(Some("Linux_ComputerSystem"), Some("CIM_System"));
	linux.add_property("Distro", &CimValue::Null { kind: cimrep::rep::CimKind::String, array: false }, None)
		.expect("property adds");
	linux.mark_incomplete();
	writer.add_class(&linux).expect("class appends");

	if gzip {
		let packed = writer.finish_gzip().expect("gzip finishes");
		std::fs::write(dir.join("classSchemas.gz"), packed).expect("store writes");
	} else {
		std::fs::write(dir.join("classSchemas"), writer.finish()).expect("store writes");
	}
}

#[test]
fn repository_resolves_a_reduced_hierarchy_end_to_end() {
	let root = temp_root("resolve");
	write_reduced_hierarchy(&root.join("root").join("cimv2"), true);

	let repo = Repository::open(&root, CacheLimits::default()).expect("repository opens");
	let register = repo.register("root/cimv2").expect("namespace resolves");
	assert!(register.is_reduced());

	let resolved = register
		.get_resolved_class("linux_computersystem")
		.expect("resolution succeeds")
		.expect("class found");
	assert_eq!(resolved.property_count(), 3);
	assert!(resolved.locate_property("Caption").is_some());
	assert!(resolved.locate_property("Name").is_some());
	assert!(resolved.locate_property("Distro").is_some());
	// Abstract belongs to CIM_ManagedElement only.
	assert!(!resolved.is_abstract());

	// A cached resolved class must come back as the same shared object.
	let again = register.get_resolved_class("Linux_ComputerSystem").expect("resolution succeeds").expect("class found");
	assert!(std::sync::Arc::ptr_eq(&resolved, &again));

	std::fs::remove_dir_all(&root).expect("temp root removes");
}

#[test]
fn resolved_classes_flatten_like_any_other_class() {
	let root = temp_root("flatten");
	write_reduced_hierarchy(&root.join("ns"), false);

	let repo = Repository::open(&root, CacheLimits::default()).expect("repository opens");
	let register = repo.register("ns").expect("namespace resolves");
	let resolved = register.get_resolved_class("Linux_ComputerSystem").expect("resolution succeeds").expect("class found");

	let bytes = resolved.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), resolved.size());
	let back = Class::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.property_count(), resolved.property_count());

	std::fs::remove_dir_all(&root).expect("temp root removes");
}

#[test]
fn concurrent_readers_share_one_register() {
	let root = temp_root("threads");
	write_reduced_hierarchy(&root.join("ns"), false);

	let repo = Repository::open(&root, CacheLimits { base_classes: 2, resolved_classes: 2 })
		.expect("repository opens");
	let register = repo.register("ns").expect("namespace resolves");

	std::thread::scope(|scope| {
		for _ in 0..4 {
			scope.spawn(|| {
				for _ in 0..25 {
					let cls = register
						.get_resolved_class("Linux_ComputerSystem")
						.expect("resolution succeeds")
						.expect("class found");
					assert_eq!(cls.property_count(), 3);

					let transient = register
						.get_class("CIM_System", ReadCtl::Transient)
						.expect("lookup succeeds")
						.expect("class found");
					assert_eq!(transient.name(), Some("CIM_System"));
				}
			});
		}
	});

	std::fs::remove_dir_all(&root).expect("temp root removes");
}
