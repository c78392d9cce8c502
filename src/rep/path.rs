use std::fmt;

use crate::rep::arrays::ArrayTable;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::header::{ObjectHeader, ObjectKind};
use crate::rep::members::{self, PROPERTY_SECTION_INIT, Property, PropertyView};
use crate::rep::section::Section;
use crate::rep::strings::{StringId, StringTable};
use crate::rep::value::CimValue;
use crate::rep::{RepError, Result};

const PATH_FIXED: usize = 32;

/// Live object path: namespace, class name, host name, and key
/// properties.
///
/// Paths carry no array table; array-valued keys are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPath {
	hdr: ObjectHeader,
	namespace: StringId,
	class_name: StringId,
	host_name: StringId,
	keys: Section<Property>,
	strings: StringTable,
	arrays: ArrayTable,
}

impl ObjectPath {
	/// Create a live path naming `class_name` in `namespace`.
	pub fn new(namespace: Option<&str>, class_name: Option<&str>) -> Self {
		let mut strings = StringTable::new();
		let namespace = strings.add_opt(namespace);
		let class_name = strings.add_opt(class_name);
		Self {
			hdr: ObjectHeader::new(ObjectKind::ObjectPath),
			namespace,
			class_name,
			host_name: StringId::NONE,
			keys: Section::new(PROPERTY_SECTION_INIT),
			strings,
			arrays: ArrayTable::new(),
		}
	}

	/// Namespace component.
	pub fn namespace(&self) -> Option<&str> {
		self.strings.get_opt_str(self.namespace).ok().flatten()
	}

	/// Class name component.
	pub fn class_name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.class_name).ok().flatten()
	}

	/// Host name component.
	pub fn host_name(&self) -> Option<&str> {
		self.strings.get_opt_str(self.host_name).ok().flatten()
	}

	/// Set or clear the namespace component.
	pub fn set_namespace(&mut self, value: Option<&str>) -> Result<()> {
		self.namespace = set_component(&mut self.strings, self.namespace, value)?;
		Ok(())
	}

	/// Set or clear the class name component.
	pub fn set_class_name(&mut self, value: Option<&str>) -> Result<()> {
		self.class_name = set_component(&mut self.strings, self.class_name, value)?;
		Ok(())
	}

	/// Set or clear the host name component.
	pub fn set_host_name(&mut self, value: Option<&str>) -> Result<()> {
		self.host_name = set_component(&mut self.strings, self.host_name, value)?;
		Ok(())
	}

	/// Add or replace a key property by case-insensitive name.
	pub fn add_key(&mut self, name: &str, value: &CimValue) -> Result<usize> {
		members::add_member(
			&mut self.keys,
			&mut self.strings,
			&mut self.arrays,
			&mut self.hdr.flags,
			name,
			value,
			None,
			true,
			false,
		)
	}

	/// Number of key properties.
	pub fn key_count(&self) -> usize {
		self.keys.len()
	}

	/// Position of the key named `name`, if present.
	pub fn locate_key(&self, name: &str) -> Option<usize> {
		members::locate(self.keys.iter().map(|k| k.name), &self.strings, name)
	}

	/// Hydrate the key at `idx`.
	pub fn key_at(&self, idx: usize) -> Result<PropertyView> {
		let key = self.keys.get(idx).ok_or(RepError::IndexOutOfRange {
			what: "key",
			idx,
			count: self.keys.len(),
		})?;
		members::property_view(key, &self.strings, &self.arrays)
	}

	/// Exact flattened byte length.
	pub fn size(&self) -> usize {
		let mut size = PATH_FIXED;
		size += members::properties_wire_size(&self.keys);
		if !self.strings.is_empty() {
			size += self.strings.wire_size();
		}
		size
	}

	/// Flatten into one contiguous buffer of exactly `size()` bytes.
	pub fn rebuild(&self) -> Result<Vec<u8>> {
		let size = self.size();
		let mut writer = Writer::with_capacity(size);

		let mut offset = PATH_FIXED;
		let key_off = members::region_offset(&mut offset, members::properties_wire_size(&self.keys));
		let str_off =
			members::region_offset(&mut offset, if self.strings.is_empty() { 0 } else { self.strings.wire_size() });

		let mut hdr = self.hdr;
		hdr.size = size as u32;
		hdr.encode(&mut writer);
		writer.put_u32(self.namespace.0);
		writer.put_u32(self.class_name.0);
		writer.put_u32(self.host_name.0);
		writer.put_u32(key_off);
		writer.put_u32(self.keys.len() as u32);
		writer.put_u32(str_off);

		members::encode_properties(&mut writer, &self.keys);
		if !self.strings.is_empty() {
			self.strings.encode(&mut writer);
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

	/// Decode a flattened buffer back into an owned live path.
	pub fn relocate(bytes: &[u8]) -> Result<Self> {
		let hdr = ObjectHeader::expect(bytes, ObjectKind::ObjectPath)?;
		let bytes = &bytes[..hdr.size as usize];
		let mut cursor = Cursor::at(bytes, 8)?;

		let namespace = StringId(cursor.read_u32()?);
		let class_name = StringId(cursor.read_u32()?);
		let host_name = StringId(cursor.read_u32()?);
		let key_off = cursor.read_u32()? as usize;
		let key_count = cursor.read_u32()? as usize;
		let str_off = cursor.read_u32()? as usize;

		let keys = if key_off == 0 {
			Section::new(PROPERTY_SECTION_INIT)
		} else {
			members::decode_properties(&mut Cursor::at(bytes, key_off)?, key_count)?
		};
		let strings = if str_off == 0 {
			StringTable::new()
		} else {
			StringTable::decode(&mut Cursor::at(bytes, str_off)?)?
		};

		Ok(Self {
			hdr,
			namespace,
			class_name,
			host_name,
			keys,
			strings,
			arrays: ArrayTable::new(),
		})
	}
}

fn set_component(strings: &mut StringTable, current: StringId, value: Option<&str>) -> Result<StringId> {
	match value {
		Some(value) if !current.is_none() => {
			strings.replace(current, value.as_bytes())?;
			Ok(current)
		}
		Some(value) => Ok(strings.add_str(value)),
		None => Ok(StringId::NONE),
	}
}

impl fmt::Display for ObjectPath {
	/// Render the canonical `[//host/]namespace:Class.Key=value` form.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(host) = self.host_name() {
			write!(f, "//{host}/")?;
		}
		if let Some(namespace) = self.namespace() {
			write!(f, "{namespace}:")?;
		}
		write!(f, "{}", self.class_name().unwrap_or(""))?;
		for idx in 0..self.key_count() {
			let Ok(key) = self.key_at(idx) else {
				continue;
			};
			let sep = if idx == 0 { '.' } else { ',' };
			write!(f, "{sep}{}=", key.name)?;
			match key.value {
				CimValue::String(ref v) | CimValue::DateTime(ref v) | CimValue::Ref(ref v) => {
					write!(f, "\"{v}\"")?;
				}
				CimValue::Char16(v) => write!(f, "\"{v}\"")?,
				CimValue::Boolean(v) => write!(f, "{}", if v { "TRUE" } else { "FALSE" })?,
				CimValue::Uint8(v) => write!(f, "{v}")?,
				CimValue::Sint8(v) => write!(f, "{v}")?,
				CimValue::Uint16(v) => write!(f, "{v}")?,
				CimValue::Sint16(v) => write!(f, "{v}")?,
				CimValue::Uint32(v) => write!(f, "{v}")?,
				CimValue::Sint32(v) => write!(f, "{v}")?,
				CimValue::Uint64(v) => write!(f, "{v}")?,
				CimValue::Sint64(v) => write!(f, "{v}")?,
				CimValue::Real32(v) => write!(f, "{v}")?,
				CimValue::Real64(v) => write!(f, "{v}")?,
				_ => write!(f, "NULL")?,
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
