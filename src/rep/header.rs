use crate::rep::bytes::{Cursor, Writer};
use crate::rep::{RepError, Result};

/// Byte length of the common flattened object header.
pub const HEADER_WIRE: usize = 8;

/// Kind tag carried by every flattened object and store record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectKind {
	/// Management class with full member sections.
	Class = 1,
	/// Class instance.
	Instance = 2,
	/// Object path naming one instance or class.
	ObjectPath = 3,
	/// Method invocation argument list.
	ArgumentList = 4,
	/// Qualifier declaration.
	QualifierDeclaration = 5,
	/// Store version record.
	Version = 6,
	/// Reduced-representation class record; inherited members omitted.
	IncompleteClass = 7,
}

impl ObjectKind {
	/// Decode a wire tag; `None` for unknown tags.
	pub fn from_u8(tag: u8) -> Option<Self> {
		Some(match tag {
			1 => Self::Class,
			2 => Self::Instance,
			3 => Self::ObjectPath,
			4 => Self::ArgumentList,
			5 => Self::QualifierDeclaration,
			6 => Self::Version,
			7 => Self::IncompleteClass,
			_ => return None,
		})
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Class => "class",
			Self::Instance => "instance",
			Self::ObjectPath => "objectpath",
			Self::ArgumentList => "argumentlist",
			Self::QualifierDeclaration => "qualifierdeclaration",
			Self::Version => "version",
			Self::IncompleteClass => "incompleteclass",
		}
	}
}

/// Flag bits carried by the common object header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HdrFlags(u16);

impl HdrFlags {
	/// Object embeds at least one flattened nested object.
	pub const CONTAINS_EMBEDDED: HdrFlags = HdrFlags(1);
	/// Some properties or methods carry the filtered bit.
	pub const HAS_FILTERED_PROPS: HdrFlags = HdrFlags(2);
	/// Object originated outside the broker (e.g. compiled from MOF).
	pub const EXTERNAL: HdrFlags = HdrFlags(4);

	/// Build from raw wire bits, dropping unknown bits.
	pub fn from_bits(bits: u16) -> Self {
		Self(bits & 0x0007)
	}

	/// Raw wire bits.
	pub fn bits(self) -> u16 {
		self.0
	}

	/// Whether all bits of `other` are set.
	pub fn contains(self, other: HdrFlags) -> bool {
		self.0 & other.0 == other.0
	}

	/// Set all bits of `other`.
	pub fn insert(&mut self, other: HdrFlags) {
		self.0 |= other.0;
	}
}

/// Common header shared by every object kind.
///
/// `size` is the total flattened byte length and is only meaningful on
/// a flattened buffer; live objects carry 0 until rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
	/// Object kind tag.
	pub kind: ObjectKind,
	/// Header flag bits.
	pub flags: HdrFlags,
	/// Total flattened byte length.
	pub size: u32,
}

impl ObjectHeader {
	/// Create a live header for `kind`.
	pub fn new(kind: ObjectKind) -> Self {
		Self {
			kind,
			flags: HdrFlags::default(),
			size: 0,
		}
	}

	/// Append the fixed-size wire form.
	pub fn encode(&self, writer: &mut Writer) {
		writer.put_u32(self.size);
		writer.put_u8(self.kind as u8);
		writer.put_u8(0);
		writer.put_u16(self.flags.bits());
	}

	/// Read one fixed-size wire header.
	pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
		let size = cursor.read_u32()?;
		let tag = cursor.read_u8()?;
		let kind = ObjectKind::from_u8(tag).ok_or(RepError::UnknownKind { kind: tag })?;
		let _ = cursor.read_u8()?;
		let flags = HdrFlags::from_bits(cursor.read_u16()?);
		Ok(Self { kind, flags, size })
	}

	/// Decode the header at the start of `bytes`.
	pub fn peek(bytes: &[u8]) -> Result<Self> {
		Self::decode(&mut Cursor::new(bytes))
	}

	/// Verify the buffer kind and declared size before relocation.
	pub fn expect(bytes: &[u8], kind: ObjectKind) -> Result<Self> {
		let header = Self::peek(bytes)?;
		let accepted = header.kind == kind
			|| (kind == ObjectKind::Class && header.kind == ObjectKind::IncompleteClass);
		if !accepted {
			return Err(RepError::KindMismatch {
				expected: kind.as_str(),
				got: header.kind.as_str(),
			});
		}
		if header.size as usize > bytes.len() {
			return Err(RepError::BadDeclaredSize {
				declared: header.size as usize,
				have: bytes.len(),
			});
		}
		Ok(header)
	}
}
