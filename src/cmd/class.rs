use std::path::PathBuf;

use cimrep::rep::{CacheLimits, Class, ClassRegister, ReadCtl, RepError, Result};
use serde_json::{Value, json};

use crate::cmd::util::{kind_label, value_json, value_label};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	pub name: String,
	/// Merge inherited members when the store is reduced.
	#[arg(long)]
	pub resolve: bool,
	#[arg(long)]
	pub json: bool,
}

/// Decode one class and render its members.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		name,
		resolve,
		json,
	} = args;

	let register = ClassRegister::open(&path, CacheLimits::default())?;
	let cls = if resolve {
		register.get_resolved_class(&name)?
	} else {
		register.get_class(&name, ReadCtl::Transient)?
	};
	let cls = cls.ok_or(RepError::ClassNotFound { name })?;

	if json {
		println!("{}", serde_json::to_string_pretty(&class_json(&cls)?).unwrap_or_default());
	} else {
		print_class(&cls)?;
	}
	Ok(())
}

fn class_json(cls: &Class) -> Result<Value> {
	let mut qualifiers = Vec::new();
	for idx in 0..cls.qualifier_count() {
		let qual = cls.qualifier_at(idx)?;
		qualifiers.push(json!({ "name": qual.name, "value": value_json(&qual.value) }));
	}

	let mut properties = Vec::new();
	for idx in 0..cls.property_count() {
		let prop = cls.property_at(idx)?;
		let mut prop_quals = Vec::new();
		for qidx in 0..cls.property_qualifier_count(idx)? {
			let qual = cls.property_qualifier_at(idx, qidx)?;
			prop_quals.push(json!({ "name": qual.name, "value": value_json(&qual.value) }));
		}
		properties.push(json!({
			"name": prop.name,
			"type": kind_label(&prop.value),
			"value": value_json(&prop.value),
			"key": prop.flags.contains(cimrep::rep::PropFlags::KEY),
			"ref_class": prop.ref_class,
			"qualifiers": prop_quals,
		}));
	}

	let mut methods = Vec::new();
	for idx in 0..cls.method_count() {
		let method = cls.method_at(idx)?;
		let mut params = Vec::new();
		for pidx in 0..cls.method_parameter_count(idx)? {
			let param = cls.method_parameter_at(idx, pidx)?;
			params.push(json!({
				"name": param.name,
				"type": param.kind.as_str(),
				"array": param.array,
				"ref_class": param.ref_class,
			}));
		}
		methods.push(json!({
			"name": method.name,
			"returns": method.return_kind.as_str(),
			"parameters": params,
		}));
	}

	Ok(json!({
		"name": cls.name(),
		"parent": cls.parent_name(),
		"abstract": cls.is_abstract(),
		"association": cls.is_association(),
		"indication": cls.is_indication(),
		"complete": cls.is_complete(),
		"qualifiers": qualifiers,
		"properties": properties,
		"methods": methods,
	}))
}

fn print_class(cls: &Class) -> Result<()> {
	let mut bits = Vec::new();
	if cls.is_abstract() {
		bits.push("Abstract");
	}
	if cls.is_association() {
		bits.push("Association");
	}
	if cls.is_indication() {
		bits.push("Indication");
	}
	if !bits.is_empty() {
		println!("[{}]", bits.join(", "));
	}
	for idx in 0..cls.qualifier_count() {
		let qual = cls.qualifier_at(idx)?;
		println!("[{}({})]", qual.name, value_label(&qual.value));
	}

	match cls.parent_name() {
		Some(parent) => println!("class {}: {parent} {{", cls.name().unwrap_or("?")),
		None => println!("class {} {{", cls.name().unwrap_or("?")),
	}

	for idx in 0..cls.property_count() {
		let prop = cls.property_at(idx)?;
		let key = if prop.flags.contains(cimrep::rep::PropFlags::KEY) { " [Key]" } else { "" };
		match prop.value {
			ref value if value.is_null() => {
				println!("  {} {}{key};", kind_label(value), prop.name);
			}
			ref value => {
				println!("  {} {}{key} = {};", kind_label(value), prop.name, value_label(value));
			}
		}
	}

	for idx in 0..cls.method_count() {
		let method = cls.method_at(idx)?;
		let mut params = Vec::new();
		for pidx in 0..cls.method_parameter_count(idx)? {
			let param = cls.method_parameter_at(idx, pidx)?;
			let array = if param.array { "[]" } else { "" };
			params.push(format!("{}{array} {}", param.kind.as_str(), param.name));
		}
		println!("  {} {}({});", method.return_kind.as_str(), method.name, params.join(", "));
	}

	println!("}};");
	Ok(())
}
