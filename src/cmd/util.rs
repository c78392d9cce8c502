use cimrep::rep::CimValue;
use serde_json::{Value, json};

/// Render a value kind with an array suffix where applicable.
pub(crate) fn kind_label(value: &CimValue) -> String {
	if value.is_array() {
		format!("{}[]", value.kind().as_str())
	} else {
		value.kind().as_str().to_owned()
	}
}

/// Render a hydrated value as JSON.
pub(crate) fn value_json(value: &CimValue) -> Value {
	match value {
		CimValue::Null { .. } => Value::Null,
		CimValue::Boolean(v) => json!(v),
		CimValue::Char16(v) => json!(v.to_string()),
		CimValue::Uint8(v) => json!(v),
		CimValue::Sint8(v) => json!(v),
		CimValue::Uint16(v) => json!(v),
		CimValue::Sint16(v) => json!(v),
		CimValue::Uint32(v) => json!(v),
		CimValue::Sint32(v) => json!(v),
		CimValue::Uint64(v) => json!(v),
		CimValue::Sint64(v) => json!(v),
		CimValue::Real32(v) => json!(v),
		CimValue::Real64(v) => json!(v),
		CimValue::String(v) | CimValue::DateTime(v) | CimValue::Ref(v) => json!(v),
		CimValue::Instance(inst) => json!({
			"namespace": inst.namespace(),
			"class": inst.class_name(),
			"properties": inst.property_count(),
		}),
		CimValue::Array(_, elems) => Value::Array(elems.iter().map(value_json).collect()),
	}
}

/// Render a hydrated value as a short text label.
pub(crate) fn value_label(value: &CimValue) -> String {
	match value {
		CimValue::Null { .. } => "NULL".to_owned(),
		CimValue::Boolean(v) => if *v { "TRUE" } else { "FALSE" }.to_owned(),
		CimValue::Char16(v) => format!("'{v}'"),
		CimValue::Uint8(v) => v.to_string(),
		CimValue::Sint8(v) => v.to_string(),
		CimValue::Uint16(v) => v.to_string(),
		CimValue::Sint16(v) => v.to_string(),
		CimValue::Uint32(v) => v.to_string(),
		CimValue::Sint32(v) => v.to_string(),
		CimValue::Uint64(v) => v.to_string(),
		CimValue::Sint64(v) => v.to_string(),
		CimValue::Real32(v) => v.to_string(),
		CimValue::Real64(v) => v.to_string(),
		CimValue::String(v) | CimValue::DateTime(v) | CimValue::Ref(v) => format!("\"{v}\""),
		CimValue::Instance(inst) => format!("<instance of {}>", inst.class_name().unwrap_or("?")),
		CimValue::Array(_, elems) => {
			let inner: Vec<String> = elems.iter().map(value_label).collect();
			format!("{{{}}}", inner.join(", "))
		}
	}
}
