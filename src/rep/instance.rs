use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::{HdrFlags, ObjectHeader, ObjectKind};
use crate::rep::members::{
	self, PROPERTY_SECTION_INIT, PropFlags, Property, PropertyView, QUALIFIER_SECTION_INIT, Qualifier,
	QualifierView,
};
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::CimValue;
use crate::rep::{RepError, Result};

const INSTANCE_FIXED: usize = 40;

/// Live class instance: namespace, class name, qualifiers, and
/// properties backed by the object's own string and array tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
	hdr: ObjectHeader,
	namespace: StringId,
	class_name: StringId,
	qualifiers: Section<Qualifier>,
	properties: Section<Property>,
	strings: StringTable,
	arrays: ArrayTable,
}

impl Instance {
	/// Create a live instance of `class_name` in `namespace`.
	pub fn new(namespace: Option<&str>, class_name: Option<&str>) -> Self {
		let mut strings = StringTable::new();
		let namespace = strings.add_opt(namespace);
		let class_name = strings.add_opt(class_name);
		Self {
			hdr: ObjectHeader::new(ObjectKind::Instance),
			namespace,
			class_name,
			qualifiers: Section::new(QUALIFIER_SECTION_INIT),
			properties: Section::new(PROPERTY_SECTION_INIT),
			strings,
			arrays: ArrayTable::new(),
		}
	}

	/// Create an instance marked as originating outside the broker.
	pub fn new_external(namespace: Option<&str>, class_name: Option<&str>) -> Self {
		let mut instance = Self::new(namespace, class_name);
		instance.hdr.flags.insert(HdrFlags::EXTERNAL);
		instance
	}

	/// Namespace this instance belongs to.
	pub fn namespace(&self) -> Option<&str> {
		self.strings.get_opt_str(self.namespace).ok().flatten()
	}

	/// Class this instance instantiates.
	pub fn class_name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.class_name).ok().flatten()
	}

	/// Whether the object originated outside the broker.
	pub fn is_external(&self) -> bool {
		self.hdr.flags.contains(HdrFlags::EXTERNAL)
	}

	/// Whether any property embeds a flattened nested object.
	pub fn contains_embedded(&self) -> bool {
		self.hdr.flags.contains(HdrFlags::CONTAINS_EMBEDDED)
	}

	/// Add or replace a property by case-insensitive name.
	pub fn add_property(&mut self, name: &str, value: &CimValue) -> Result<usize> {
		members::add_member(
			&mut self.properties,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
			None,
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

	/// Flag the named property as an embedded object or instance.
	///
	/// EmbeddedInstance implies EmbeddedObject but stays
	/// distinguishable; any other qualifier name is ignored here.
	pub fn flag_property_embedded(&mut self, name: &str, qualifier: &str) -> Result<()> {
		let idx = self.locate_property(name).ok_or_else(|| RepError::NoSuchProperty {
			name: name.to_string(),
		})?;
		if let Some(prop) = self.properties.get_mut(idx) {
			if qualifier.eq_ignore_ascii_case("embeddedinstance") {
				prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
				prop.flags.insert(PropFlags::EMBEDDED_INSTANCE);
			} else if qualifier.eq_ignore_ascii_case("embeddedobject") {
				prop.flags.insert(PropFlags::EMBEDDED_OBJECT);
			}
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

	/// Add an instance-level qualifier; idempotent by name.
	pub fn add_qualifier(&mut self, name: &str, value: &CimValue) -> Result<usize> {
		members::add_qualifier(
			&mut self.qualifiers,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
		)
	}

	/// Number of instance-level qualifiers.
	pub fn qualifier_count(&self) -> usize {
		self.qualifiers.len()
	}

	/// Hydrate the qualifier at `idx`.
	pub fn qualifier_at(&self, idx: usize) -> Result<QualifierView> {
		let qual = self.qualifiers.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "qualifier",
			idx,
			count: self.qualifiers.len(),
		})?;
		members::qualifier_view(qual, &self.strings, &self.arrays)
	}

	/// Exact flattened byte length.
	pub fn size(&self) -> usize {
		let mut size = INSTANCE_FIXED;
		size += members::qualifiers_wire_size(&self.qualifiers);
		size += members::properties_wire_size(&self.properties);
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

		let mut offset = INSTANCE_FIXED;
		let qual_off = members::region_offset(&mut offset, members::qualifiers_wire_size(&self.qualifiers));
		let prop_off = members::region_offset(&mut offset, members::properties_wire_size(&self.properties));
		let str_off =
			members::region_offset(&mut offset, if self.strings.is_empty() { 0 } else { self.strings.wire_size() });
		let arr_off =
			members::region_offset(&mut offset, if self.arrays.is_empty() { 0 } else { self.arrays.wire_size() });

		let mut hdr = self.hdr;
		hdr.size = size as u32;
		hdr.encode(&mut writer);
		writer.put_u32(self.namespace.0);
		writer.put_u32(self.class_name.0);
		writer.put_u32(qual_off);
		writer.put_u32(self.qualifiers.len() as u32);
		writer.put_u32(prop_off);
		writer.put_u32(self.properties.len() as u32);
		writer.put_u32(str_off);
		writer.put_u32(arr_off);

		members::encode_qualifiers(&mut writer, &self.qualifiers);
		members::encode_properties(&mut writer, &self.properties);
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

	/// Decode a flattened buffer back into an owned live instance.
	pub fn relocate(bytes: &[u8]) -> Result<Self> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::Instance)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let namespace = StringId(cursor.read_u32()?);
		let class_name = StringId(cursor.read_u32()?);
		let qual_off = cursor.read_u32()? as usize;
		let qual_count = cursor.read_u32()? as usize;
		let prop_off = cursor.read_u32()? as usize;
		let prop_count = cursor.read_u32()? as usize;
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
			hdr,
			namespace,
			class_name,
			qualifiers,
			properties,
			strings,
			arrays,
		})
	}
}
