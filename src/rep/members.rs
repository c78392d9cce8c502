use crate::rep::arrays::{ArrayId, ArrayTable};
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::HdrFlags;
use crate::rep::instance::Instance;
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::{CimKind, CimValue, TypedValue, VALUE_WIRE, ValueFlags};
use crate::rep::{RepError, Result};

/// First allocation for qualifier sections.
pub(crate) const QUALIFIER_SECTION_INIT: usize = 4;
/// First allocation for property sections.
pub(crate) const PROPERTY_SECTION_INIT: usize = 8;
/// First allocation for method sections.
pub(crate) const METHOD_SECTION_INIT: usize = 8;
/// First allocation for parameter sections.
pub(crate) const PARAMETER_SECTION_INIT: usize = 4;

const QUALIFIER_WIRE: usize = 4 + VALUE_WIRE;
const PROPERTY_WIRE: usize = 20 + VALUE_WIRE;
const METHOD_WIRE: usize = 20;
const PARAMETER_WIRE: usize = 20;

/// Flag bits carried by property and method records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropFlags(u32);

impl PropFlags {
	/// Property participates in the key.
	pub const KEY: PropFlags = PropFlags(1);
	/// Property value is an embedded object.
	pub const EMBEDDED_OBJECT: PropFlags = PropFlags(2);
	/// Property value is an embedded instance; implies EMBEDDED_OBJECT.
	pub const EMBEDDED_INSTANCE: PropFlags = PropFlags(4);
	/// Member was excluded by a property filter.
	pub const FILTERED: PropFlags = PropFlags(8);

	/// Build from raw wire bits, dropping unknown bits.
	pub fn from_bits(bits: u32) -> Self {
		Self(bits & 0x0F)
	}

	/// Raw wire bits.
	pub fn bits(self) -> u32 {
		self.0
	}

	/// Whether all bits of `other` are set.
	pub fn contains(self, other: PropFlags) -> bool {
		self.0 & other.0 == other.0
	}

	/// Set all bits of `other`.
	pub fn insert(&mut self, other: PropFlags) {
		self.0 |= other.0;
	}
}

/// One stored qualifier record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Qualifier {
	pub name: StringId,
	pub value: TypedValue,
}

/// One stored property, key, or argument record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Property {
	pub name: StringId,
	pub origin: StringId,
	pub ref_class: StringId,
	pub flags: PropFlags,
	pub qualifiers: Section<Qualifier>,
	pub value: TypedValue,
}

/// One stored method record with its own qualifier and parameter
/// sections.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Method {
	pub name: StringId,
	pub return_kind: CimKind,
	pub return_array: bool,
	pub flags: PropFlags,
	pub qualifiers: Section<Qualifier>,
	pub parameters: Section<Parameter>,
}

/// One stored method parameter record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameter {
	pub name: StringId,
	pub kind: CimKind,
	pub array: bool,
	pub array_size: u32,
	pub ref_class: StringId,
	pub qualifiers: Section<Qualifier>,
}

/// Hydrated qualifier returned by positional accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifierView {
	/// Qualifier name.
	pub name: String,
	/// Hydrated qualifier value.
	pub value: CimValue,
}

/// Hydrated property, key, or argument returned by positional
/// accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyView {
	/// Member name.
	pub name: String,
	/// Hydrated value.
	pub value: CimValue,
	/// Flag bits.
	pub flags: PropFlags,
	/// Declaring class name, when recorded.
	pub origin: Option<String>,
	/// Referenced class name for reference-typed members.
	pub ref_class: Option<String>,
	/// Number of qualifiers attached to this member.
	pub qualifier_count: usize,
}

/// Hydrated method summary returned by positional accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodView {
	/// Method name.
	pub name: String,
	/// Return value kind.
	pub return_kind: CimKind,
	/// Whether the return value is array-valued.
	pub return_array: bool,
	/// Flag bits.
	pub flags: PropFlags,
	/// Number of qualifiers attached to this method.
	pub qualifier_count: usize,
	/// Number of declared parameters.
	pub parameter_count: usize,
}

/// Hydrated parameter summary returned by positional accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterView {
	/// Parameter name.
	pub name: String,
	/// Parameter value kind.
	pub kind: CimKind,
	/// Whether the parameter is array-valued.
	pub array: bool,
	/// Declared array size; 0 when unbounded.
	pub array_size: u32,
	/// Referenced class name for reference-typed parameters.
	pub ref_class: Option<String>,
	/// Number of qualifiers attached to this parameter.
	pub qualifier_count: usize,
}

/// Case-insensitive linear lookup over member name ids.
pub(crate) fn locate<I>(ids: I, strings: &StringTable, name: &str) -> Option<usize>
where
	I: Iterator<Item = StringId>,
{
	for (i, id) in ids.enumerate() {
		if let Ok(stored) = strings.get_str(id)
			&& stored.eq_ignore_ascii_case(name)
		{
			return Some(i);
		}
	}
	None
}

fn store_array_elem(elem: &CimValue, strings: &mut StringTable) -> Result<TypedValue> {
	if let CimValue::Null { kind, array: false } = elem {
		return Ok(TypedValue::null(*kind, false));
	}
	if let Some(raw) = elem.scalar_raw() {
		return Ok(TypedValue::with_raw(elem.kind(), raw));
	}
	match elem {
		CimValue::Char16(value) => {
			let id = strings.add_str(&value.to_string());
			Ok(TypedValue::with_raw(CimKind::Char16, u64::from(id.0)))
		}
		CimValue::String(value) => {
			let id = strings.add_str(value);
			Ok(TypedValue::with_raw(CimKind::String, u64::from(id.0)))
		}
		CimValue::DateTime(value) => {
			let id = strings.add_str(value);
			Ok(TypedValue::with_raw(CimKind::DateTime, u64::from(id.0)))
		}
		CimValue::Ref(value) => {
			let id = strings.add_str(value);
			Ok(TypedValue::with_raw(CimKind::Reference, u64::from(id.0)))
		}
		other => Err(RepError::UnsupportedArrayElement {
			kind: other.kind().as_str(),
		}),
	}
}

fn store_array(
	elem_kind: CimKind,
	elems: &[CimValue],
	strings: &mut StringTable,
	arrays: &mut ArrayTable,
) -> Result<ArrayId> {
	let mut records = Vec::with_capacity(elems.len());
	for elem in elems {
		records.push(store_array_elem(elem, strings)?);
	}
	Ok(arrays.add(elem_kind, &records))
}

/// Materialize a caller value into the owning object's tables.
pub(crate) fn store_value(
	value: &CimValue,
	strings: &mut StringTable,
	arrays: &mut ArrayTable,
	hdr_flags: &mut HdrFlags,
) -> Result<TypedValue> {
	match value {
		CimValue::Null { kind, array } => Ok(TypedValue::null(*kind, *array)),
		CimValue::Array(elem_kind, elems) => {
			let id = store_array(*elem_kind, elems, strings, arrays)?;
			let mut tv = TypedValue::with_raw(*elem_kind, u64::from(id.0));
			tv.flags.insert(ValueFlags::ARRAY);
			Ok(tv)
		}
		CimValue::Instance(inst) => {
			let blob = inst.rebuild()?;
			let id = strings.add_bytes(&blob);
			hdr_flags.insert(HdrFlags::CONTAINS_EMBEDDED);
			Ok(TypedValue::with_raw(CimKind::Instance, u64::from(id.0)))
		}
		other => store_array_elem(other, strings),
	}
}

fn load_array_elem(tv: &TypedValue, strings: &StringTable) -> Result<CimValue> {
	if tv.is_null() {
		return Ok(CimValue::Null {
			kind: tv.kind,
			array: false,
		});
	}
	match tv.kind {
		CimKind::Char16 => {
			let text = strings.get_str(StringId(tv.raw as u32))?;
			Ok(CimValue::Char16(text.chars().next().unwrap_or('\0')))
		}
		CimKind::String => Ok(CimValue::String(strings.get_str(StringId(tv.raw as u32))?.to_string())),
		CimKind::DateTime => Ok(CimValue::DateTime(strings.get_str(StringId(tv.raw as u32))?.to_string())),
		CimKind::Reference => Ok(CimValue::Ref(strings.get_str(StringId(tv.raw as u32))?.to_string())),
		kind => CimValue::from_scalar_raw(kind, tv.raw).ok_or(RepError::UnknownValueKind { kind: kind as u8 }),
	}
}

/// Hydrate a stored record into a caller value.
///
/// Runs on every positional access; nothing caches the decoded form.
pub(crate) fn load_value(tv: &TypedValue, strings: &StringTable, arrays: &ArrayTable) -> Result<CimValue> {
	if tv.is_null() {
		return Ok(CimValue::Null {
			kind: tv.kind,
			array: tv.is_array(),
		});
	}
	if tv.is_array() {
		let id = ArrayId(tv.raw as u32);
		let elem_kind = arrays.elem_kind(id)?;
		let records = arrays.get(id)?;
		let mut elems = Vec::with_capacity(records.len());
		for record in records {
			elems.push(load_array_elem(record, strings)?);
		}
		return Ok(CimValue::Array(elem_kind, elems));
	}
	if tv.kind == CimKind::Instance {
		let blob = strings.get_bytes(StringId(tv.raw as u32))?;
		return Ok(CimValue::Instance(Box::new(Instance::relocate(blob)?)));
	}
	load_array_elem(tv, strings)
}

/// Append or replace a member record by case-insensitive name.
///
/// Replacement validates the stored kind, routes string-backed and
/// array payloads through table `replace`, and swaps embedded blobs
/// via `remove` plus a fresh append (sizes differ). A mismatch leaves
/// the stored value untouched.
pub(crate) fn add_member(
	props: &mut Section<Property>,
	strings: &mut StringTable,
	arrays: &mut ArrayTable,
	hdr_flags: &mut HdrFlags,
	name: &str,
	value: &CimValue,
	ref_class: Option<&str>,
	keyed: bool,
	allow_arrays: bool,
) -> Result<usize> {
	if value.is_array() && !allow_arrays {
		return Err(RepError::ArrayKeyUnsupported { name: name.to_string() });
	}

	match locate(props.iter().map(|p| p.name), strings, name) {
		None => {
			let name_id = strings.add_str(name);
			let ref_id = strings.add_opt(ref_class);
			let mut tv = store_value(value, strings, arrays, hdr_flags)?;
			if keyed {
				tv.flags.insert(ValueFlags::KEYED);
			}
			let mut flags = PropFlags::default();
			if matches!(value, CimValue::Instance(_)) {
				flags.insert(PropFlags::EMBEDDED_OBJECT);
			}
			Ok(props.push(Property {
				name: name_id,
				origin: StringId::NONE,
				ref_class: ref_id,
				flags,
				qualifiers: Section::new(QUALIFIER_SECTION_INIT),
				value: tv,
			}))
		}
		Some(idx) => {
			replace_member_value(props, strings, arrays, hdr_flags, idx, name, value)?;
			Ok(idx)
		}
	}
}

fn replace_member_value(
	props: &mut Section<Property>,
	strings: &mut StringTable,
	arrays: &mut ArrayTable,
	hdr_flags: &mut HdrFlags,
	idx: usize,
	name: &str,
	value: &CimValue,
) -> Result<()> {
	let (stored, prop_flags) = match props.get(idx) {
		Some(prop) => (prop.value, prop.flags),
		None => {
			return Err(RepError::IndexOutOfRange {
				what: "property",
				idx,
				count: props.len(),
			});
		}
	};

	// A null replacement adopts silently, keeping the supplied type.
	if value.is_null() {
		let keyed = stored.flags.contains(ValueFlags::KEYED);
		let mut tv = TypedValue::null(value.kind(), value.is_array());
		if keyed {
			tv.flags.insert(ValueFlags::KEYED);
		}
		if let Some(prop) = props.get_mut(idx) {
			prop.value = tv;
		}
		return Ok(());
	}

	if stored.kind != value.kind() || stored.is_array() != value.is_array() {
		return Err(RepError::TypeMismatch {
			name: name.to_string(),
			stored: stored.kind.as_str(),
			supplied: value.kind().as_str(),
		});
	}
	if prop_flags.contains(PropFlags::EMBEDDED_OBJECT) && stored.kind == CimKind::String {
		return Err(RepError::TypeMismatch {
			name: name.to_string(),
			stored: "embedded object",
			supplied: value.kind().as_str(),
		});
	}

	let keyed = stored.flags.contains(ValueFlags::KEYED);
	let mut tv = match value {
		CimValue::Array(elem_kind, elems) => {
			let mut records = Vec::with_capacity(elems.len());
			for elem in elems {
				records.push(store_array_elem(elem, strings)?);
			}
			let id = if stored.is_null() || stored.raw == 0 {
				arrays.add(*elem_kind, &records)
			} else {
				let id = ArrayId(stored.raw as u32);
				arrays.replace(id, *elem_kind, &records)?;
				id
			};
			let mut tv = TypedValue::with_raw(*elem_kind, u64::from(id.0));
			tv.flags.insert(ValueFlags::ARRAY);
			tv
		}
		CimValue::Instance(inst) => {
			let blob = inst.rebuild()?;
			let id = if stored.is_null() || stored.raw == 0 {
				strings.add_bytes(&blob)
			} else {
				strings.remove(StringId(stored.raw as u32))?;
				strings.add_bytes(&blob)
			};
			hdr_flags.insert(HdrFlags::CONTAINS_EMBEDDED);
			TypedValue::with_raw(CimKind::Instance, u64::from(id.0))
		}
		CimValue::Char16(c) => replace_string_backed(stored, &c.to_string(), strings)?,
		CimValue::String(s) | CimValue::DateTime(s) | CimValue::Ref(s) => {
			replace_string_backed(stored, s, strings)?
		}
		other => {
			let raw = other.scalar_raw().ok_or(RepError::UnknownValueKind {
				kind: other.kind() as u8,
			})?;
			TypedValue::with_raw(stored.kind, raw)
		}
	};
	if keyed {
		tv.flags.insert(ValueFlags::KEYED);
	}
	if let Some(prop) = props.get_mut(idx) {
		prop.value = tv;
		if matches!(value, CimValue::Instance(_)) {
			prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
		}
	}
	Ok(())
}

fn replace_string_backed(stored: TypedValue, text: &str, strings: &mut StringTable) -> Result<TypedValue> {
	let id = if stored.is_null() || stored.raw == 0 {
		strings.add_str(text)
	} else {
		let id = StringId(stored.raw as u32);
		strings.replace(id, text.as_bytes())?;
		id
	};
	Ok(TypedValue::with_raw(stored.kind, u64::from(id.0)))
}

/// Append a qualifier unless one with the same name exists.
///
/// Qualifier addition is idempotent by case-insensitive name: a
/// duplicate add keeps the stored value and reports the existing
/// position.
pub(crate) fn add_qualifier(
	quals: &mut Section<Qualifier>,
	strings: &mut StringTable,
	arrays: &mut ArrayTable,
	hdr_flags: &mut HdrFlags,
	name: &str,
	value: &CimValue,
) -> Result<usize> {
	if let Some(idx) = locate(quals.iter().map(|q| q.name), strings, name) {
		return Ok(idx);
	}
	let name_id = strings.add_str(name);
	let tv = store_value(value, strings, arrays, hdr_flags)?;
	Ok(quals.push(Qualifier { name: name_id, value: tv }))
}

/// Hydrate one qualifier record.
pub(crate) fn qualifier_view(
	qual: &Qualifier,
	strings: &StringTable,
	arrays: &ArrayTable,
) -> Result<QualifierView> {
	Ok(QualifierView {
		name: strings.get_str(qual.name)?.to_string(),
		value: load_value(&qual.value, strings, arrays)?,
	})
}

/// Hydrate one property record.
pub(crate) fn property_view(
	prop: &Property,
	strings: &StringTable,
	arrays: &ArrayTable,
) -> Result<PropertyView> {
	Ok(PropertyView {
		name: strings.get_str(prop.name)?.to_string(),
		value: load_value(&prop.value, strings, arrays)?,
		flags: prop.flags,
		origin: strings.get_opt_str(prop.origin)?.map(str::to_string),
		ref_class: strings.get_opt_str(prop.ref_class)?.map(str::to_string),
		qualifier_count: prop.qualifiers.len(),
	})
}

/// Hydrate one method record.
pub(crate) fn method_view(method: &Method, strings: &StringTable) -> Result<MethodView> {
	Ok(MethodView {
		name: strings.get_str(method.name)?.to_string(),
		return_kind: method.return_kind,
		return_array: method.return_array,
		flags: method.flags,
		qualifier_count: method.qualifiers.len(),
		parameter_count: method.parameters.len(),
	})
}

/// Hydrate one parameter record.
pub(crate) fn parameter_view(param: &Parameter, strings: &StringTable) -> Result<ParameterView> {
	Ok(ParameterView {
		name: strings.get_str(param.name)?.to_string(),
		kind: param.kind,
		array: param.array,
		array_size: param.array_size,
		ref_class: strings.get_opt_str(param.ref_class)?.map(str::to_string),
		qualifier_count: param.qualifiers.len(),
	})
}

// --- wire codecs -------------------------------------------------------

/// Claim `size` bytes at the running layout offset; 0 for empty
/// regions.
pub(crate) fn region_offset(offset: &mut usize, size: usize) -> u32 {
	if size == 0 {
		return 0;
	}
	let at = *offset;
	*offset += size;
	at as u32
}

/// Flattened byte length of a qualifier section.
pub(crate) fn qualifiers_wire_size(quals: &Section<Qualifier>) -> usize {
	quals.len() * QUALIFIER_WIRE
}

/// Flattened byte length of a property section, nested qualifiers
/// included.
pub(crate) fn properties_wire_size(props: &Section<Property>) -> usize {
	let mut size = props.len() * PROPERTY_WIRE;
	for prop in props.iter() {
		size += qualifiers_wire_size(&prop.qualifiers);
	}
	size
}

/// Flattened byte length of a method section, nested qualifier and
/// parameter sections included.
pub(crate) fn methods_wire_size(methods: &Section<Method>) -> usize {
	let mut size = methods.len() * METHOD_WIRE;
	for method in methods.iter() {
		size += qualifiers_wire_size(&method.qualifiers);
		size += method.parameters.len() * PARAMETER_WIRE;
		for param in method.parameters.iter() {
			size += qualifiers_wire_size(&param.qualifiers);
		}
	}
	size
}

/// Append a qualifier section.
pub(crate) fn encode_qualifiers(writer: &mut Writer, quals: &Section<Qualifier>) {
	for qual in quals.iter() {
		writer.put_u32(qual.name.0);
		qual.value.encode(writer);
	}
}

/// Decode `count` qualifier records.
pub(crate) fn decode_qualifiers(cursor: &mut Cursor<'_>, count: usize) -> Result<Section<Qualifier>> {
	let mut quals = Section::new(QUALIFIER_SECTION_INIT);
	for _ in 0..count {
		let name = StringId(cursor.read_u32()?);
		let value = TypedValue::decode(cursor)?;
		quals.push(Qualifier { name, value });
	}
	Ok(quals)
}

/// Append a property section: fixed records first, then each record's
/// qualifiers in order.
pub(crate) fn encode_properties(writer: &mut Writer, props: &Section<Property>) {
	for prop in props.iter() {
		writer.put_u32(prop.name.0);
		writer.put_u32(prop.origin.0);
		writer.put_u32(prop.ref_class.0);
		writer.put_u32(prop.flags.bits());
		writer.put_u32(prop.qualifiers.len() as u32);
		prop.value.encode(writer);
	}
	for prop in props.iter() {
		encode_qualifiers(writer, &prop.qualifiers);
	}
}

/// Decode `count` property records with their qualifier sections.
pub(crate) fn decode_properties(cursor: &mut Cursor<'_>, count: usize) -> Result<Section<Property>> {
	let mut props = Section::new(PROPERTY_SECTION_INIT);
	let mut qual_counts = Vec::with_capacity(count);
	for _ in 0..count {
		let name = StringId(cursor.read_u32()?);
		let origin = StringId(cursor.read_u32()?);
		let ref_class = StringId(cursor.read_u32()?);
		let flags = PropFlags::from_bits(cursor.read_u32()?);
		qual_counts.push(cursor.read_u32()? as usize);
		let value = TypedValue::decode(cursor)?;
		props.push(Property {
			name,
			origin,
			ref_class,
			flags,
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			value,
		});
	}
	for (idx, qual_count) in qual_counts.into_iter().enumerate() {
		let quals = decode_qualifiers(cursor, qual_count)?;
		if let Some(prop) = props.get_mut(idx) {
			prop.qualifiers = quals;
		}
	}
	Ok(props)
}

/// Append a method section: fixed records, then per method its
/// qualifiers, parameter records, and parameter qualifiers.
pub(crate) fn encode_methods(writer: &mut Writer, methods: &Section<Method>) {
	for method in methods.iter() {
		writer.put_u32(method.name.0);
		writer.put_u32(u32::from(method.return_kind as u8) | (u32::from(method.return_array) << 8));
		writer.put_u32(method.flags.bits());
		writer.put_u32(method.qualifiers.len() as u32);
		writer.put_u32(method.parameters.len() as u32);
	}
	for method in methods.iter() {
		encode_qualifiers(writer, &method.qualifiers);
		for param in method.parameters.iter() {
			writer.put_u32(param.name.0);
			writer.put_u32(u32::from(param.kind as u8) | (u32::from(param.array) << 8));
			writer.put_u32(param.array_size);
			writer.put_u32(param.ref_class.0);
			writer.put_u32(param.qualifiers.len() as u32);
		}
		for param in method.parameters.iter() {
			encode_qualifiers(writer, &param.qualifiers);
		}
	}
}

fn decode_kind_word(word: u32) -> Result<(CimKind, bool)> {
	let tag = (word & 0xFF) as u8;
	let kind = CimKind::from_u8(tag).ok_or(RepError::UnknownValueKind { kind: tag })?;
	Ok((kind, word & 0x100 != 0))
}

/// Decode `count` method records with their nested sections.
pub(crate) fn decode_methods(cursor: &mut Cursor<'_>, count: usize) -> Result<Section<Method>> {
	let mut methods = Section::new(METHOD_SECTION_INIT);
	let mut shapes = Vec::with_capacity(count);
	for _ in 0..count {
		let name = StringId(cursor.read_u32()?);
		let (return_kind, return_array) = decode_kind_word(cursor.read_u32()?)?;
		let flags = PropFlags::from_bits(cursor.read_u32()?);
		let qual_count = cursor.read_u32()? as usize;
		let param_count = cursor.read_u32()? as usize;
		shapes.push((qual_count, param_count));
		methods.push(Method {
			name,
			return_kind,
			return_array,
			flags,
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			parameters: Section::new(PARAMETER_SECTION_INIT),
		});
	}
	for (idx, (qual_count, param_count)) in shapes.into_iter().enumerate() {
		let quals = decode_qualifiers(cursor, qual_count)?;
		let mut params = Section::new(PARAMETER_SECTION_INIT);
		let mut param_qual_counts = Vec::with_capacity(param_count);
		for _ in 0..param_count {
			let name = StringId(cursor.read_u32()?);
			let (kind, array) = decode_kind_word(cursor.read_u32()?)?;
			let array_size = cursor.read_u32()?;
			let ref_class = StringId(cursor.read_u32()?);
			param_qual_counts.push(cursor.read_u32()? as usize);
			params.push(Parameter {
				name,
				kind,
				array,
				array_size,
				ref_class,
				qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			});
		}
		for (pidx, pq_count) in param_qual_counts.into_iter().enumerate() {
			let pq = decode_qualifiers(cursor, pq_count)?;
			if let Some(param) = params.get_mut(pidx) {
				param.qualifiers = pq;
			}
		}
		if let Some(method) = methods.get_mut(idx) {
			method.qualifiers = quals;
			method.parameters = params;
		}
	}
	Ok(methods)
}

#[cfg(test)]
mod tests;
