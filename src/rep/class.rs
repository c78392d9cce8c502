use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::{HdrFlags, ObjectHeader, ObjectKind};
use crate::rep::members::{
	self, METHOD_SECTION_INIT, Method, MethodView, PARAMETER_SECTION_INIT, PROPERTY_SECTION_INIT,
	Parameter, ParameterView, PropFlags, Property, PropertyView, QUALIFIER_SECTION_INIT, Qualifier,
	QualifierView,
};
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::{CimKind, CimValue};
use crate::rep::{RepError, Result};

const CLASS_FIXED: usize = 52;

const CLASS_ABSTRACT: u32 = 1;
const CLASS_ASSOCIATION: u32 = 2;
const CLASS_INDICATION: u32 = 4;

/// Shallow class facts decoded without materializing the full object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
	/// Class name.
	pub name: String,
	/// Superclass name, when declared.
	pub parent: Option<String>,
	/// Whether the Association bit is set.
	pub association: bool,
	/// Whether the record is a complete (non-reduced) class.
	pub complete: bool,
	/// Declared flattened byte length.
	pub size: usize,
}

/// Live management class: name, superclass, qualifiers, properties,
/// and methods backed by the object's own string and array tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
	hdr: ObjectHeader,
	name: StringId,
	parent: StringId,
	class_bits: u32,
	complete: bool,
	qualifiers: Section<Qualifier>,
	properties: Section<Property>,
	methods: Section<Method>,
	strings: StringTable,
	arrays: ArrayTable,
}

impl Class {
	/// Create a live class named `name` under superclass `parent`.
	pub fn new(name: Option<&str>, parent: Option<&str>) -> Self {
		let mut strings = StringTable::new();
		let name = strings.add_opt(name);
		let parent = strings.add_opt(parent);
		Self {
			hdr: ObjectHeader::new(ObjectKind::Class),
			name,
			parent,
			class_bits: 0,
			complete: true,
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			properties: Section::new(PROPERTY_SECTION_INIT),
			methods: Section::new(METHOD_SECTION_INIT),
			strings,
			arrays: ArrayTable::new(),
		}
	}

	/// Class name.
	pub fn name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.name).ok().flatten()
	}

	/// Superclass name, when declared.
	pub fn parent_name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.parent).ok().flatten()
	}

	/// Whether the Abstract bit is set.
	pub fn is_abstract(&self) -> bool {
		self.class_bits & CLASS_ABSTRACT != 0
	}

	/// Whether the Association bit is set.
	pub fn is_association(&self) -> bool {
		self.class_bits & CLASS_ASSOCIATION != 0
	}

	/// Whether the Indication bit is set.
	pub fn is_indication(&self) -> bool {
		self.class_bits & CLASS_INDICATION != 0
	}

	/// Whether this record carries its full member set.
	///
	/// Reduced-representation store records omit inherited members and
	/// flatten under the incomplete kind tag.
	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Mark this class as a reduced-representation record.
	pub fn mark_incomplete(&mut self) {
		self.complete = false;
	}

	/// Whether any property embeds a flattened nested object.
	pub fn contains_embedded(&self) -> bool {
		self.hdr.flags.contains(HdrFlags::CONTAINS_EMBEDDED)
	}

	pub(crate) fn class_bits(&self) -> u32 {
		self.class_bits
	}

	pub(crate) fn or_class_bits(&mut self, bits: u32) {
		self.class_bits |= bits;
	}

	pub(crate) fn set_abstract(&mut self, value: bool) {
		if value {
			self.class_bits |= CLASS_ABSTRACT;
		} else {
			self.class_bits &= !CLASS_ABSTRACT;
		}
	}

	/// Add a class qualifier; idempotent by case-insensitive name.
	///
	/// Abstract, Association, and Indication set class-level bits
	/// instead of occupying a section entry.
	pub fn add_qualifier(&mut self, name: &str, value: &CimValue) -> Result<()> {
		if name.eq_ignore_ascii_case("abstract") {
			self.class_bits |= CLASS_ABSTRACT;
		} else if name.eq_ignore_ascii_case("association") {
			self.class_bits |= CLASS_ASSOCIATION;
		} else if name.eq_ignore_ascii_case("indication") {
			self.class_bits |= CLASS_INDICATION;
		} else {
			members::add_qualifier(
				&mut self.qualifiers,
				&mut self.strings,
				&mut self.arrays,
				&mut self.hdr.flags,
				name,
				value,
			)?;
		}
		Ok(())
	}

	/// Number of class qualifiers, fast-path bits excluded.
	pub fn qualifier_count(&self) -> usize {
		self.qualifiers.len()
	}

	/// Hydrate the class qualifier at `idx`.
	pub fn qualifier_at(&self, idx: usize) -> Result<QualifierView> {
		let qual = self.qualifiers.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "qualifier",
			idx,
			count: self.qualifiers.len(),
		})?;
		members::qualifier_view(qual, &self.strings, &self.arrays)
	}

	/// Add or replace a property by case-insensitive name.
	///
	/// `ref_class` names the target class for reference-typed
	/// properties.
	pub fn add_property(&mut self, name: &str, value: &CimValue, ref_class: Option<&str>) -> Result<usize> {
		members::add_member(
			&mut self.properties,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
			ref_class,
			false,
			true,
		)
	}

	/// Number of properties.
	pub fn property_count(&self) -> usize {
		self.properties.len()
	}

	/// Position of the property named `name`, if present.
	pub fn locate_property(&self, name: &str) -> Option<usize> {
		members::locate(self.properties.iter().map(|p| p.name), &self.strings, name)
	}

	/// Hydrate the property at `idx`.
	pub fn property_at(&self, idx: usize) -> Result<PropertyView> {
		let prop = self.properties.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count: self.properties.len(),
		})?;
		members::property_view(prop, &self.strings, &self.arrays)
	}

	/// Add a qualifier to the property at `idx`.
	///
	/// Key, EmbeddedObject, and EmbeddedInstance set property flag bits
	/// instead of occupying a section entry; EmbeddedInstance implies
	/// EmbeddedObject but stays distinguishable.
	pub fn add_property_qualifier(&mut self, idx: usize, name: &str, value: &CimValue) -> Result<()> {
		let count = self.properties.len();
		let prop = self.properties.get_mut(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count,
		})?;
		if name.eq_ignore_ascii_case("key") {
			prop.flags.insert(PropFlags::KEY);
		} else if name.eq_ignore_ascii_case("embeddedobject") {
			prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
		} else if name.eq_ignore_ascii_case("embeddedinstance") {
			prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
			prop.flags.insert(PropFlags::EMBEDDED_INSTANCE);
		} else {
			members::add_qualifier(
				&mut prop.qualifiers,
				&mut self.strings,
				&mut self.arrays,
				&mut self.hdr.flags,
				name,
				value,
			)?;
		}
		Ok(())
	}

	/// Number of qualifiers on the property at `idx`.
	pub fn property_qualifier_count(&self, idx: usize) -> Result<usize> {
		let prop = self.properties.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count: self.properties.len(),
		})?;
		Ok(prop.qualifiers.len())
	}

	/// Hydrate qualifier `qidx` of the property at `idx`.
	pub fn property_qualifier_at(&self, idx: usize, qidx: usize) -> Result<QualifierView> {
		let prop = self.properties.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count: self.properties.len(),
		})?;
		let qual = prop.qualifiers.get(qidx).ok_or(RepError::IndexOutOfRange {
			what: "property qualifier",
			idx: qidx,
			count: prop.qualifiers.len(),
		})?;
		members::qualifier_view(qual, &self.strings, &self.arrays)
	}

	pub(crate) fn or_property_flags(&mut self, idx: usize, flags: PropFlags) {
		if let Some(prop) = self.properties.get_mut(idx) {
			prop.flags.insert(flags);
		}
	}

	/// Record the class that declares the property at `idx`.
	pub fn set_property_origin(&mut self, idx: usize, origin: &str) -> Result<()> {
		let count = self.properties.len();
		let current = match self.properties.get(idx) {
			Some(prop) => prop.origin,
			None => {
				return Err(RepError::IndexOutOfRange {
					what: "property",
					idx,
					count,
				});
			}
		};
		let id = if current.is_none() {
			self.strings.add_str(origin)
		} else {
			self.strings.replace(current, origin.as_bytes())?;
			current
		};
		if let Some(prop) = self.properties.get_mut(idx) {
			prop.origin = id;
		}
		Ok(())
	}

	/// Mark the property at `idx` as filtered.
	pub fn filter_property(&mut self, idx: usize) -> Result<()> {
		let count = self.properties.len();
		let prop = self.properties.get_mut(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count,
		})?;
		prop.flags.insert(PropFlags::FILTERED);
		self.hdr.flags.insert(HdrFlags::HAS_FILTERED_PROPS);
		Ok(())
	}

	/// Whether the property at `idx` carries the filtered bit.
	pub fn is_property_filtered(&self, idx: usize) -> Result<bool> {
		let prop = self.properties.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "property",
			idx,
			count: self.properties.len(),
		})?;
		Ok(prop.flags.contains(PropFlags::FILTERED))
	}

	/// Whether any member carries the filtered bit.
	pub fn has_filtered_props(&self) -> bool {
		self.hdr.flags.contains(HdrFlags::HAS_FILTERED_PROPS)
	}

	/// Add a method; idempotent by case-insensitive name.
	pub fn add_method(&mut self, name: &str, return_kind: CimKind, return_array: bool) -> Result<usize> {
		if let Some(idx) = members::locate(self.methods.iter().map(|m| m.name), &self.strings, name) {
			return Ok(idx);
		}
		let name_id = self.strings.add_str(name);
		Ok(self.methods.push(Method {
			name: name_id,
			return_kind,
			return_array,
			flags: PropFlags::default(),
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			parameters: Section::new(PARAMETER_SECTION_INIT),
		}))
	}

	/// Number of methods.
	pub fn method_count(&self) -> usize {
		self.methods.len()
	}

	/// Position of the method named `name`, if present.
	pub fn locate_method(&self, name: &str) -> Option<usize> {
		members::locate(self.methods.iter().map(|m| m.name), &self.strings, name)
	}

	/// Hydrate the method at `idx`.
	pub fn method_at(&self, idx: usize) -> Result<MethodView> {
		let method = self.methods.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "method",
			idx,
			count: self.methods.len(),
		})?;
		members::method_view(method, &self.strings)
	}

	fn method_mut(&mut self, idx: usize) -> Result<&mut Method> {
		let count = self.methods.len();
		self.methods.get_mut(idx).ok_or(RepError::IndexOutOfRange {
			what: "method",
			idx,
			count,
		})
	}

	fn method_ref(&self, idx: usize) -> Result<&Method> {
		self.methods.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "method",
			idx,
			count: self.methods.len(),
		})
	}

	/// Add a qualifier to the method at `idx`; idempotent by name.
	pub fn add_method_qualifier(&mut self, idx: usize, name: &str, value: &CimValue) -> Result<()> {
		let count = self.methods.len();
		let method = self.methods.get_mut(idx).ok_or(RepError::IndexOutOfRange {
			what: "method",
			idx,
			count,
		})?;
		members::add_qualifier(
			&mut method.qualifiers,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
		)?;
		Ok(())
	}

	/// Number of qualifiers on the method at `idx`.
	pub fn method_qualifier_count(&self, idx: usize) -> Result<usize> {
		Ok(self.method_ref(idx)?.qualifiers.len())
	}

	/// Hydrate qualifier `qidx` of the method at `idx`.
	pub fn method_qualifier_at(&self, idx: usize, qidx: usize) -> Result<QualifierView> {
		let method = self.method_ref(idx)?;
		let qual = method.qualifiers.get(qidx).ok_or(RepError::IndexOutOfRange {
			what: "method qualifier",
			idx: qidx,
			count: method.qualifiers.len(),
		})?;
		members::qualifier_view(qual, &self.strings, &self.arrays)
	}

	/// Add a parameter to the method at `idx`; idempotent by name.
	pub fn add_method_parameter(
		&mut self,
		idx: usize,
		name: &str,
		kind: CimKind,
		array: bool,
		array_size: u32,
		ref_class: Option<&str>,
	) -> Result<usize> {
		let existing = {
			let method = self.method_ref(idx)?;
			members::locate(method.parameters.iter().map(|p| p.name), &self.strings, name)
		};
		if let Some(pidx) = existing {
			return Ok(pidx);
		}
		let name_id = self.strings.add_str(name);
		let ref_id = self.strings.add_opt(ref_class);
		let method = self.method_mut(idx)?;
		Ok(method.parameters.push(Parameter {
			name: name_id,
			kind,
			array,
			array_size,
			ref_class: ref_id,
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
		}))
	}

	/// Number of parameters on the method at `idx`.
	pub fn method_parameter_count(&self, idx: usize) -> Result<usize> {
		Ok(self.method_ref(idx)?.parameters.len())
	}

	/// Hydrate parameter `pidx` of the method at `idx`.
	pub fn method_parameter_at(&self, idx: usize, pidx: usize) -> Result<ParameterView> {
		let method = self.method_ref(idx)?;
		let param = method.parameters.get(pidx).ok_or(RepError::IndexOutOfRange {
			what: "parameter",
			idx: pidx,
			count: method.parameters.len(),
		})?;
		members::parameter_view(param, &self.strings)
	}

	/// Add a qualifier to parameter `pidx` of the method at `idx`.
	pub fn add_parameter_qualifier(&mut self, idx: usize, pidx: usize, name: &str, value: &CimValue) -> Result<()> {
		let count = self.methods.len();
		let method = self.methods.get_mut(idx).ok_or(RepError::IndexOutOfRange {
			what: "method",
			idx,
			count,
		})?;
		let param_count = method.parameters.len();
		let param = method.parameters.get_mut(pidx).ok_or(RepError::IndexOutOfRange {
			what: "parameter",
			idx: pidx,
			count: param_count,
		})?;
		members::add_qualifier(
			&mut param.qualifiers,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
		)?;
		Ok(())
	}

	/// Number of qualifiers on parameter `pidx` of the method at `idx`.
	pub fn parameter_qualifier_count(&self, idx: usize, pidx: usize) -> Result<usize> {
		let method = self.method_ref(idx)?;
		let param = method.parameters.get(pidx).ok_or(RepError::IndexOutOfRange {
			what: "parameter",
			idx: pidx,
			count: method.parameters.len(),
		})?;
		Ok(param.qualifiers.len())
	}

	/// Hydrate qualifier `qidx` of parameter `pidx` of method `idx`.
	pub fn parameter_qualifier_at(&self, idx: usize, pidx: usize, qidx: usize) -> Result<QualifierView> {
		let method = self.method_ref(idx)?;
		let param = method.parameters.get(pidx).ok_or(RepError::IndexOutOfRange {
			what: "parameter",
			idx: pidx,
			count: method.parameters.len(),
		})?;
		let qual = param.qualifiers.get(qidx).ok_or(RepError::IndexOutOfRange {
			what: "parameter qualifier",
			idx: qidx,
			count: param.qualifiers.len(),
		})?;
		members::qualifier_view(qual, &self.strings, &self.arrays)
	}

	/// Mark the method at `idx` as filtered.
	pub fn filter_method(&mut self, idx: usize) -> Result<()> {
		let method = self.method_mut(idx)?;
		method.flags.insert(PropFlags::FILTERED);
		self.hdr.flags.insert(HdrFlags::HAS_FILTERED_PROPS);
		Ok(())
	}

	/// Whether the method at `idx` carries the filtered bit.
	pub fn is_method_filtered(&self, idx: usize) -> Result<bool> {
		Ok(self.method_ref(idx)?.flags.contains(PropFlags::FILTERED))
	}

	/// Exact flattened byte length.
	pub fn size(&self) -> usize {
		let mut size = CLASS_FIXED;
		size += members::qualifiers_wire_size(&self.qualifiers);
		size += members::properties_wire_size(&self.properties);
		size += members::methods_wire_size(&self.methods);
		if !self.strings.is_empty() {
			size += self.strings.wire_size();
		}
		if !self.arrays.is_empty() {
			size += self.arrays.wire_size();
		}
		size
	}

	/// Flatten into one contiguous buffer of exactly `size()` bytes.
	pub fn rebuild(&self) -> Result<Vec<u8>> {
		let size = self.size();
		let mut writer = Writer::with_capacity(size);

		let mut offset = CLASS_FIXED;
		let qual_off = members::region_offset(&mut offset, members::qualifiers_wire_size(&self.qualifiers));
		let prop_off = members::region_offset(&mut offset, members::properties_wire_size(&self.properties));
		let meth_off = members::region_offset(&mut offset, members::methods_wire_size(&self.methods));
		let str_off =
			members::region_offset(&mut offset, if self.strings.is_empty() { 0 } else { self.strings.wire_size() });
		let arr_off =
			members::region_offset(&mut offset, if self.arrays.is_empty() { 0 } else { self.arrays.wire_size() });

		let mut hdr = self.hdr;
		hdr.kind = if self.complete { ObjectKind::Class } else { ObjectKind::IncompleteClass };
		hdr.size = size as u32;
		hdr.encode(&mut writer);
		writer.put_u32(self.name.0);
		writer.put_u32(self.parent.0);
		writer.put_u32(self.class_bits);
		writer.put_u32(qual_off);
		writer.put_u32(self.qualifiers.len() as u32);
		writer.put_u32(prop_off);
		writer.put_u32(self.properties.len() as u32);
		writer.put_u32(meth_off);
		writer.put_u32(self.methods.len() as u32);
		writer.put_u32(str_off);
		writer.put_u32(arr_off);

		members::encode_qualifiers(&mut writer, &self.qualifiers);
		members::encode_properties(&mut writer, &self.properties);
		members::encode_methods(&mut writer, &self.methods);
		if !self.strings.is_empty() {
			self.strings.encode(&mut writer);
		}
		if !self.arrays.is_empty() {
			self.arrays.encode(&mut writer);
		}

		let bytes = writer.into_bytes();
		if bytes.len() != size {
			return Err(RepError::SizeMismatch {
				computed: size,
				written: bytes.len(),
			});
		}
		Ok(bytes)
	}

	/// Decode a flattened buffer back into an owned live class.
	pub fn relocate(bytes: &[u8]) -> Result<Self> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::Class)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let name = StringId(cursor.read_u32()?);
		let parent = StringId(cursor.read_u32()?);
		let class_bits = cursor.read_u32()?;
		let qual_off = cursor.read_u32()? as usize;
		let qual_count = cursor.read_u32()? as usize;
		let prop_off = cursor.read_u32()? as usize;
		let prop_count = cursor.read_u32()? as usize;
		let meth_off = cursor.read_u32()? as usize;
		let meth_count = cursor.read_u32()? as usize;
		let str_off = cursor.read_u32()? as usize;
		let arr_off = cursor.read_u32()? as usize;

		let qualifiers = if qual_off == 0 {
			Section::new(QUALIFIER_SECTION_INIT)
		} else {
			members::decode_qualifiers(&mut Cursor::at(bytes, qual_off)?, qual_count)?
		};
		let properties = if prop_off == 0 {
			Section::new(PROPERTY_SECTION_INIT)
		} else {
			members::decode_properties(&mut Cursor::at(bytes, prop_off)?, prop_count)?
		};
		let methods = if meth_off == 0 {
			Section::new(METHOD_SECTION_INIT)
		} else {
			members::decode_methods(&mut Cursor::at(bytes, meth_off)?, meth_count)?
		};
		let strings = if str_off == 0 {
			StringTable::new()
		} else {
			StringTable::decode(&mut Cursor::at(bytes, str_off)?)?
		};
		let arrays = if arr_off == 0 {
			ArrayTable::new()
		} else {
			ArrayTable::decode(&mut Cursor::at(bytes, arr_off)?)?
		};

		Ok(Self {
			hdr: ObjectHeader {
				kind: ObjectKind::Class,
				flags: hdr.flags,
				size: hdr.size,
			},
			name,
			parent,
			class_bits,
			complete: hdr.kind == ObjectKind::Class,
			qualifiers,
			properties,
			methods,
			strings,
			arrays,
		})
	}

	/// Decode only name, parent, and flag facts from a flattened
	/// buffer.
	///
	/// Used by the store loader, which indexes every record without
	/// materializing class bodies.
	pub fn peek(bytes: &[u8]) -> Result<ClassSummary> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::Class)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let name = StringId(cursor.read_u32()?);
		let parent = StringId(cursor.read_u32()?);
		let class_bits = cursor.read_u32()?;
		for _ in 0..6 {
			let _ = cursor.read_u32()?;
		}
		let str_off = cursor.read_u32()? as usize;

		let strings = if str_off == 0 {
			StringTable::new()
		} else {
			StringTable::decode(&mut Cursor::at(bytes, str_off)?)?
		};

		Ok(ClassSummary {
			name: strings.get_str(name)?.to_string(),
			parent: strings.get_opt_str(parent)?.map(str::to_string),
			association: class_bits & CLASS_ASSOCIATION != 0,
			complete: hdr.kind == ObjectKind::Class,
			size: hdr.size as usize,
		})
	}
}
