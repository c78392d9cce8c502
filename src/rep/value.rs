use crate::rep::bytes::{Cursor, Writer};
use crate::rep::instance::Instance;
use crate::rep::{RepError, Result};

/// Byte length of one flattened typed value record.
pub const VALUE_WIRE: usize = 12;

/// Value kind tags carried by stored typed value records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CimKind {
	/// Boolean scalar.
	Boolean = 1,
	/// Single UTF-16 character, stored as a string entry.
	Char16 = 2,
	/// Unsigned 8-bit integer.
	Uint8 = 3,
	/// Signed 8-bit integer.
	Sint8 = 4,
	/// Unsigned 16-bit integer.
	Uint16 = 5,
	/// Signed 16-bit integer.
	Sint16 = 6,
	/// Unsigned 32-bit integer.
	Uint32 = 7,
	/// Signed 32-bit integer.
	Sint32 = 8,
	/// Unsigned 64-bit integer.
	Uint64 = 9,
	/// Signed 64-bit integer.
	Sint64 = 10,
	/// 32-bit float.
	Real32 = 11,
	/// 64-bit float.
	Real64 = 12,
	/// UTF-8 string, stored as a string entry.
	String = 13,
	/// CIM datetime in its 25-character string form.
	DateTime = 14,
	/// Object path reference in string form.
	Reference = 15,
	/// Embedded instance, stored as a flattened blob.
	Instance = 16,
}

impl CimKind {
	/// Decode a wire tag; `None` for unknown tags.
	pub fn from_u8(tag: u8) -> Option<Self> {
		Some(match tag {
			1 => Self::Boolean,
			2 => Self::Char16,
			3 => Self::Uint8,
			4 => Self::Sint8,
			5 => Self::Uint16,
			6 => Self::Sint16,
			7 => Self::Uint32,
			8 => Self::Sint32,
			9 => Self::Uint64,
			10 => Self::Sint64,
			11 => Self::Real32,
			12 => Self::Real64,
			13 => Self::String,
			14 => Self::DateTime,
			15 => Self::Reference,
			16 => Self::Instance,
			_ => return None,
		})
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Boolean => "boolean",
			Self::Char16 => "char16",
			Self::Uint8 => "uint8",
			Self::Sint8 => "sint8",
			Self::Uint16 => "uint16",
			Self::Sint16 => "sint16",
			Self::Uint32 => "uint32",
			Self::Sint32 => "sint32",
			Self::Uint64 => "uint64",
			Self::Sint64 => "sint64",
			Self::Real32 => "real32",
			Self::Real64 => "real64",
			Self::String => "string",
			Self::DateTime => "datetime",
			Self::Reference => "reference",
			Self::Instance => "instance",
		}
	}

	/// Whether values of this kind live in the string table.
	pub fn is_string_backed(self) -> bool {
		matches!(self, Self::Char16 | Self::String | Self::DateTime | Self::Reference)
	}
}

/// State bits carried by a stored typed value record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueFlags(u8);

impl ValueFlags {
	/// Value is null; the payload is meaningless.
	pub const NULL: ValueFlags = ValueFlags(1);
	/// Value participates in an object path key.
	pub const KEYED: ValueFlags = ValueFlags(2);
	/// Payload is an array table id.
	pub const ARRAY: ValueFlags = ValueFlags(4);

	/// Build from raw wire bits, dropping unknown bits.
	pub fn from_bits(bits: u8) -> Self {
		Self(bits & 0x07)
	}

	/// Raw wire bits.
	pub fn bits(self) -> u8 {
		self.0
	}

	/// Whether all bits of `other` are set.
	pub fn contains(self, other: ValueFlags) -> bool {
		self.0 & other.0 == other.0
	}

	/// Set all bits of `other`.
	pub fn insert(&mut self, other: ValueFlags) {
		self.0 |= other.0;
	}

	/// Clear all bits of `other`.
	pub fn remove(&mut self, other: ValueFlags) {
		self.0 &= !other.0;
	}
}

/// One stored typed value: kind tag, state bits, and a raw payload.
///
/// The payload holds scalar bits directly, a string table id for
/// string-backed kinds and embedded blobs, or an array table id when
/// the ARRAY bit is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedValue {
	/// Value kind tag.
	pub kind: CimKind,
	/// State bits.
	pub flags: ValueFlags,
	/// Raw payload.
	pub raw: u64,
}

impl TypedValue {
	/// Build a null record of the given kind.
	pub fn null(kind: CimKind, array: bool) -> Self {
		let mut flags = ValueFlags::NULL;
		if array {
			flags.insert(ValueFlags::ARRAY);
		}
		Self { kind, flags, raw: 0 }
	}

	/// Build a non-null record with a raw payload.
	pub fn with_raw(kind: CimKind, raw: u64) -> Self {
		Self {
			kind,
			flags: ValueFlags::default(),
			raw,
		}
	}

	/// Whether the NULL bit is set.
	pub fn is_null(&self) -> bool {
		self.flags.contains(ValueFlags::NULL)
	}

	/// Whether the ARRAY bit is set.
	pub fn is_array(&self) -> bool {
		self.flags.contains(ValueFlags::ARRAY)
	}

	/// Append the fixed-size wire form.
	pub fn encode(&self, writer: &mut Writer) {
		writer.put_u8(self.kind as u8);
		writer.put_u8(self.flags.bits());
		writer.put_u16(0);
		writer.put_u64(self.raw);
	}

	/// Read one fixed-size wire record.
	pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
		let tag = cursor.read_u8()?;
		let kind = CimKind::from_u8(tag).ok_or(RepError::UnknownValueKind { kind: tag })?;
		let flags = ValueFlags::from_bits(cursor.read_u8()?);
		let _ = cursor.read_u16()?;
		let raw = cursor.read_u64()?;
		Ok(Self { kind, flags, raw })
	}
}

/// Hydrated value handed to and returned from object accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum CimValue {
	/// Typed null.
	Null {
		/// Kind the null is typed as.
		kind: CimKind,
		/// Whether the null is array-valued.
		array: bool,
	},
	/// Boolean scalar.
	Boolean(bool),
	/// Single character.
	Char16(char),
	/// Unsigned 8-bit integer.
	Uint8(u8),
	/// Signed 8-bit integer.
	Sint8(i8),
	/// Unsigned 16-bit integer.
	Uint16(u16),
	/// Signed 16-bit integer.
	Sint16(i16),
	/// Unsigned 32-bit integer.
	Uint32(u32),
	/// Signed 32-bit integer.
	Sint32(i32),
	/// Unsigned 64-bit integer.
	Uint64(u64),
	/// Signed 64-bit integer.
	Sint64(i64),
	/// 32-bit float.
	Real32(f32),
	/// 64-bit float.
	Real64(f64),
	/// UTF-8 string.
	String(String),
	/// CIM datetime in string form.
	DateTime(String),
	/// Object path reference in string form.
	Ref(String),
	/// Embedded instance.
	Instance(Box<Instance>),
	/// Homogeneous array of the given element kind.
	Array(CimKind, Vec<CimValue>),
}

impl CimValue {
	/// Kind tag of this value (element kind for arrays).
	pub fn kind(&self) -> CimKind {
		match self {
			Self::Null { kind, .. } => *kind,
			Self::Boolean(_) => CimKind::Boolean,
			Self::Char16(_) => CimKind::Char16,
			Self::Uint8(_) => CimKind::Uint8,
			Self::Sint8(_) => CimKind::Sint8,
			Self::Uint16(_) => CimKind::Uint16,
			Self::Sint16(_) => CimKind::Sint16,
			Self::Uint32(_) => CimKind::Uint32,
			Self::Sint32(_) => CimKind::Sint32,
			Self::Uint64(_) => CimKind::Uint64,
			Self::Sint64(_) => CimKind::Sint64,
			Self::Real32(_) => CimKind::Real32,
			Self::Real64(_) => CimKind::Real64,
			Self::String(_) => CimKind::String,
			Self::DateTime(_) => CimKind::DateTime,
			Self::Ref(_) => CimKind::Reference,
			Self::Instance(_) => CimKind::Instance,
			Self::Array(kind, _) => *kind,
		}
	}

	/// Whether this value is array-valued.
	pub fn is_array(&self) -> bool {
		matches!(self, Self::Array(_, _) | Self::Null { array: true, .. })
	}

	/// Whether this value is null.
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null { .. })
	}

	/// Scalar payload bits for inline storage; `None` for table-backed
	/// kinds, nulls, and arrays.
	pub(crate) fn scalar_raw(&self) -> Option<u64> {
		Some(match self {
			Self::Boolean(v) => u64::from(*v),
			Self::Uint8(v) => u64::from(*v),
			Self::Sint8(v) => *v as u8 as u64,
			Self::Uint16(v) => u64::from(*v),
			Self::Sint16(v) => *v as u16 as u64,
			Self::Uint32(v) => u64::from(*v),
			Self::Sint32(v) => *v as u32 as u64,
			Self::Uint64(v) => *v,
			Self::Sint64(v) => *v as u64,
			Self::Real32(v) => u64::from(v.to_bits()),
			Self::Real64(v) => v.to_bits(),
			_ => return None,
		})
	}

	/// Rebuild a scalar from inline payload bits.
	pub(crate) fn from_scalar_raw(kind: CimKind, raw: u64) -> Option<Self> {
		Some(match kind {
			CimKind::Boolean => Self::Boolean(raw != 0),
			CimKind::Uint8 => Self::Uint8(raw as u8),
			CimKind::Sint8 => Self::Sint8(raw as u8 as i8),
			CimKind::Uint16 => Self::Uint16(raw as u16),
			CimKind::Sint16 => Self::Sint16(raw as u16 as i16),
			CimKind::Uint32 => Self::Uint32(raw as u32),
			CimKind::Sint32 => Self::Sint32(raw as u32 as i32),
			CimKind::Uint64 => Self::Uint64(raw),
			CimKind::Sint64 => Self::Sint64(raw as i64),
			CimKind::Real32 => Self::Real32(f32::from_bits(raw as u32)),
			CimKind::Real64 => Self::Real64(f64::from_bits(raw)),
			_ => return None,
		})
	}
}
