#![allow(missing_docs)]

use std::path::PathBuf;
use std::process::{Command, Output};

use cimrep::rep::{CimKind, CimValue, Class, StoreWriter, VersionRecord};

fn fixture_store(tag: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("cimrep-cli-{tag}-{}", std::process::id()));
	let _ = std::fs::remove_dir_all(&dir);
	std::fs::create_dir_all(&dir).expect("fixture dir creates");

	let mut writer = StoreWriter::new(&VersionRecord::new(false, "Thu Aug  7 09:00:00 2025"));

	let mut element = Class::new(Some("CIM_ManagedElement"), None);
	element.add_qualifier("Abstract", &CimValue::Boolean(true)).expect("qualifier adds");
	writer.add_class(&element).expect("class appends");

	let mut system = Class::new(Some("CIM_System"), Some("CIM_ManagedElement"));
	let key = system.add_property("Name", &CimValue::String("".into()), None).expect("property adds");
	system.add_property_qualifier(key, "Key", &CimValue::Boolean(true)).expect("key fast-path adds");
	system.add_method("Reboot", CimKind::Uint32, false).expect("method adds");
	writer.add_class(&system).expect("class appends");

	let path = dir.join("classSchemas");
	std::fs::write(&path, writer.finish()).expect("store writes");
	path
}

fn run_cimrep(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_cimrep")).args(args).output().expect("cimrep command executes")
}

fn run_cimrep_json(args: &[&str]) -> serde_json::Value {
	let output = run_cimrep(args);
	assert!(
		output.status.success(),
		"cimrep command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

#[test]
fn info_reports_version_and_counts() {
	let store = fixture_store("info");
	let output = run_cimrep(&["info", store.to_str().expect("path is utf-8")]);
	assert!(output.status.success());

	let text = String::from_utf8_lossy(&output.stdout);
	assert!(text.contains("representation: full"), "{text}");
	assert!(text.contains("class_count: 2"), "{text}");
	assert!(text.contains("compression: none"), "{text}");
}

#[test]
fn classes_json_lists_records_with_parents() {
	let store = fixture_store("classes");
	let rows = run_cimrep_json(&["classes", store.to_str().expect("path is utf-8"), "--json"]);
	let rows = rows.as_array().expect("rows are an array");
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0]["name"], "CIM_ManagedElement");
	assert_eq!(rows[1]["parent"], "CIM_ManagedElement");
}

#[test]
fn class_json_renders_members() {
	let store = fixture_store("class");
	let doc = run_cimrep_json(&["class", store.to_str().expect("path is utf-8"), "CIM_System", "--json"]);
	assert_eq!(doc["name"], "CIM_System");
	assert_eq!(doc["parent"], "CIM_ManagedElement");
	assert_eq!(doc["properties"][0]["name"], "Name");
	assert_eq!(doc["properties"][0]["key"], true);
	assert_eq!(doc["methods"][0]["name"], "Reboot");
}

#[test]
fn unknown_class_fails_with_an_error() {
	let store = fixture_store("missing");
	let output = run_cimrep(&["class", store.to_str().expect("path is utf-8"), "No_Such_Class"]);
	assert!(!output.status.success());
	let err = String::from_utf8_lossy(&output.stderr);
	assert!(err.contains("class not found"), "{err}");
}

#[test]
fn tree_prints_roots_and_children_indented() {
	let store = fixture_store("tree");
	let output = run_cimrep(&["tree", store.to_str().expect("path is utf-8")]);
	assert!(output.status.success());
	let text = String::from_utf8_lossy(&output.stdout);
	assert!(text.contains("CIM_ManagedElement\n  CIM_System"), "{text}");
}
