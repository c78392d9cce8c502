use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::{ObjectHeader, ObjectKind};
use crate::rep::members::{self, QUALIFIER_SECTION_INIT, Qualifier};
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::{CimKind, CimValue};
use crate::rep::{RepError, Result};

const QUALDECL_FIXED: usize = 48;

/// Qualifier scope bits.
pub mod scope {
	/// Applies to classes.
	pub const CLASS: u32 = 1;
	/// Applies to associations.
	pub const ASSOCIATION: u32 = 2;
	/// Applies to indications.
	pub const INDICATION: u32 = 4;
	/// Applies to properties.
	pub const PROPERTY: u32 = 8;
	/// Applies to references.
	pub const REFERENCE: u32 = 16;
	/// Applies to methods.
	pub const METHOD: u32 = 32;
	/// Applies to parameters.
	pub const PARAMETER: u32 = 64;
	/// Applies everywhere.
	pub const ANY: u32 = 127;
}

/// Qualifier flavor bits.
pub mod flavor {
	/// Subclasses may override the value.
	pub const OVERRIDABLE: u32 = 1;
	/// Propagates to subclasses.
	pub const TO_SUBCLASS: u32 = 2;
	/// Value is translatable.
	pub const TRANSLATABLE: u32 = 4;
	/// Subclasses must not override the value.
	pub const DISABLE_OVERRIDE: u32 = 8;
}

/// Live qualifier declaration: name, scope, flavor, declared type, and
/// the default value record.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifierDeclaration {
	hdr: ObjectHeader,
	name: StringId,
	namespace: StringId,
	scope: u32,
	flavor: u32,
	declared_kind: CimKind,
	declared_array: bool,
	array_size: u32,
	data: Section<Qualifier>,
	strings: StringTable,
	arrays: ArrayTable,
}

impl QualifierDeclaration {
	/// Create a live declaration named `name` in `namespace`.
	pub fn new(namespace: Option<&str>, name: Option<&str>) -> Self {
		let mut strings = StringTable::new();
		let name = strings.add_opt(name);
		let namespace = strings.add_opt(namespace);
		Self {
			hdr: ObjectHeader::new(ObjectKind::QualifierDeclaration),
			name,
			namespace,
			scope: 0,
			flavor: 0,
			declared_kind: CimKind::Boolean,
			declared_array: false,
			array_size: 0,
			data: Section::new(QUALIFIER_SECTION_INIT),
			strings,
			arrays: ArrayTable::new(),
		}
	}

	/// Qualifier name.
	pub fn name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.name).ok().flatten()
	}

	/// Namespace this declaration belongs to.
	pub fn namespace(&self) -> Option<&str> {
		self.strings.get_opt_str(self.namespace).ok().flatten()
	}

	/// Scope bits (see [`scope`]).
	pub fn scope(&self) -> u32 {
		self.scope
	}

	/// Set the scope bits.
	pub fn set_scope(&mut self, scope: u32) {
		self.scope = scope;
	}

	/// Flavor bits (see [`flavor`]).
	pub fn flavor(&self) -> u32 {
		self.flavor
	}

	/// Set the flavor bits.
	pub fn set_flavor(&mut self, flavor: u32) {
		self.flavor = flavor;
	}

	/// Declared value kind and array-ness.
	pub fn declared(&self) -> (CimKind, bool) {
		(self.declared_kind, self.declared_array)
	}

	/// Set the declared value kind and array-ness.
	pub fn set_declared(&mut self, kind: CimKind, array: bool) {
		self.declared_kind = kind;
		self.declared_array = array;
	}

	/// Declared array size; 0 when unbounded.
	pub fn array_size(&self) -> u32 {
		self.array_size
	}

	/// Set the declared array size.
	pub fn set_array_size(&mut self, size: u32) {
		self.array_size = size;
	}

	/// Set the default value record.
	pub fn set_data(&mut self, value: &CimValue) -> Result<()> {
		let name_id = self.name;
		let tv = members::store_value(value, &mut self.strings, &mut self.arrays, &mut self.hdr.flags)?;
		if let Some(existing) = self.data.get_mut(0) {
			existing.value = tv;
		} else {
			self.data.push(Qualifier { name: name_id, value: tv });
		}
		Ok(())
	}

	/// Hydrate the default value record, when one was set.
	pub fn data(&self) -> Result<Option<CimValue>> {
		match self.data.get(0) {
			Some(qual) => Ok(Some(members::load_value(&qual.value, &self.strings, &self.arrays)?)),
			None => Ok(None),
		}
	}

	/// Exact flattened byte length.
	pub fn size(&self) -> usize {
		let mut size = QUALDECL_FIXED;
		size += members::qualifiers_wire_size(&self.data);
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

		let mut offset = QUALDECL_FIXED;
		let data_off = members::region_offset(&mut offset, members::qualifiers_wire_size(&self.data));
		let str_off =
			members::region_offset(&mut offset, if self.strings.is_empty() { 0 } else { self.strings.wire_size() });
		let arr_off =
			members::region_offset(&mut offset, if self.arrays.is_empty() { 0 } else { self.arrays.wire_size() });

		let mut hdr = self.hdr;
		hdr.size = size as u32;
		hdr.encode(&mut writer);
		writer.put_u32(self.name.0);
		writer.put_u32(self.namespace.0);
		writer.put_u32(self.scope);
		writer.put_u32(self.flavor);
		writer.put_u32(u32::from(self.declared_kind as u8) | (u32::from(self.declared_array) << 8));
		writer.put_u32(self.array_size);
		writer.put_u32(data_off);
		writer.put_u32(self.data.len() as u32);
		writer.put_u32(str_off);
		writer.put_u32(arr_off);

		members::encode_qualifiers(&mut writer, &self.data);
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

	/// Decode a flattened buffer back into an owned live declaration.
	pub fn relocate(bytes: &[u8]) -> Result<Self> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::QualifierDeclaration)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let name = StringId(cursor.read_u32()?);
		let namespace = StringId(cursor.read_u32()?);
		let scope = cursor.read_u32()?;
		let flavor = cursor.read_u32()?;
		let kind_word = cursor.read_u32()?;
		let array_size = cursor.read_u32()?;
		let data_off = cursor.read_u32()? as usize;
		let data_count = cursor.read_u32()? as usize;
		let str_off = cursor.read_u32()? as usize;
		let arr_off = cursor.read_u32()? as usize;

		let tag = (kind_word & 0xFF) as u8;
		let declared_kind = CimKind::from_u8(tag).ok_or(RepError::UnknownValueKind { kind: tag })?;

		let data = if data_off == 0 {
			Section::new(QUALIFIER_SECTION_INIT)
		} else {
			members::decode_qualifiers(&mut Cursor::at(bytes, data_off)?, data_count)?
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
			name,
			namespace,
			scope,
			flavor,
			declared_kind,
			declared_array: kind_word & 0x100 != 0,
			array_size,
			data,
			strings,
			arrays,
		})
	}
}

#[cfg(test)]
mod tests;
