use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::{HdrFlags, ObjectHeader, ObjectKind};
use crate::rep::members::{self, PROPERTY_SECTION_INIT, Property, PropertyView};
use crate::rep::section::Section;
use crate::rep::strings::StringTable;
use crate::rep::value::CimValue;
use crate::rep::{RepError, Result};

const ARGS_FIXED: usize = 24;

/// Live method invocation argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentList {
	hdr: ObjectHeader,
	arguments: Section<Property>,
	strings: StringTable,
	arrays: ArrayTable,
}

impl Default for ArgumentList {
	fn default() -> Self {
		Self::new()
	}
}

impl ArgumentList {
	/// Create an empty argument list.
	pub fn new() -> Self {
		Self {
			hdr: ObjectHeader::new(ObjectKind::ArgumentList),
			arguments: Section::new(PROPERTY_SECTION_INIT),
			strings: StringTable::new(),
			arrays: ArrayTable::new(),
		}
	}

	/// Whether any argument embeds a flattened nested object.
	pub fn contains_embedded(&self) -> bool {
		self.hdr.flags.contains(HdrFlags::CONTAINS_EMBEDDED)
	}

	/// Add or replace an argument by case-insensitive name.
	pub fn add_argument(&mut self, name: &str, value: &CimValue) -> Result<usize> {
		members::add_member(
			&mut self.arguments,
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

	/// Number of arguments.
	pub fn argument_count(&self) -> usize {
		self.arguments.len()
	}

	/// Position of the argument named `name`, if present.
	pub fn locate_argument(&self, name: &str) -> Option<usize> {
		members::locate(self.arguments.iter().map(|a| a.name), &self.strings, name)
	}

	/// Hydrate the argument at `idx`.
	pub fn argument_at(&self, idx: usize) -> Result<PropertyView> {
		let arg = self.arguments.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "argument",
			idx,
			count: self.arguments.len(),
		})?;
		members::property_view(arg, &self.strings, &self.arrays)
	}

	/// Exact flattened byte length.
	pub fn size(&self) -> usize {
		let mut size = ARGS_FIXED;
		size += members::properties_wire_size(&self.arguments);
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

		let mut offset = ARGS_FIXED;
		let arg_off = members::region_offset(&mut offset, members::properties_wire_size(&self.arguments));
		let str_off =
			members::region_offset(&mut offset, if self.strings.is_empty() { 0 } else { self.strings.wire_size() });
		let arr_off =
			members::region_offset(&mut offset, if self.arrays.is_empty() { 0 } else { self.arrays.wire_size() });

		let mut hdr = self.hdr;
		hdr.size = size as u32;
		hdr.encode(&mut writer);
		writer.put_u32(arg_off);
		writer.put_u32(self.arguments.len() as u32);
		writer.put_u32(str_off);
		writer.put_u32(arr_off);

		members::encode_properties(&mut writer, &self.arguments);
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

	/// Decode a flattened buffer back into an owned live list.
	pub fn relocate(bytes: &[u8]) -> Result<Self> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::ArgumentList)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let arg_off = cursor.read_u32()? as usize;
		let arg_count = cursor.read_u32()? as usize;
		let str_off = cursor.read_u32()? as usize;
		let arr_off = cursor.read_u32()? as usize;

		let arguments = if arg_off == 0 {
			Section::new(PROPERTY_SECTION_INIT)
		} else {
			members::decode_properties(&mut Cursor::at(bytes, arg_off)?, arg_count)?
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
			arguments,
			strings,
			arrays,
		})
	}
}

#[cfg(test)]
mod tests;
