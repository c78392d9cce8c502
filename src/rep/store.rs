use std::path::Path;

use crate::rep::bytes::{Cursor, Writer};
use crate::rep::class::Class;
use crate::rep::compression::{self, Compression};
use crate::rep::header::{HEADER_WIRE, ObjectHeader, ObjectKind};
use crate::rep::{RepError, Result};

/// Store magic carried by every version record.
pub const STORE_MAGIC: [u8; 8] = *b"sfcb-rep";

/// Store format version this implementation writes.
pub const CURRENT_VERSION: u16 = 2;
/// Store schema level this implementation writes.
pub const CURRENT_LEVEL: u16 = 1;
/// Object implementation level this implementation understands.
pub const CURRENT_OBJ_IMPL_LEVEL: u16 = 7;

/// Options bit marking a reduced-representation store.
pub const OPT_REDUCED_REP: u16 = 1;

/// Byte length of the fixed version record.
pub const VERSION_RECORD_WIRE: usize = 60;

const CREATION_DATE_LEN: usize = 32;
const VERSION_TRAILER: u32 = 0x2525_2525;

/// Store version record: magic, format levels, options, and creation
/// timestamp.
///
/// The leading header `size` field doubles as the endianness sentinel:
/// a foreign-endian writer produces the byte-swapped record size,
/// which the loader rejects instead of misreading every record that
/// follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
	/// Store format version.
	pub version: u16,
	/// Store schema level.
	pub level: u16,
	/// Object implementation level the records were flattened with.
	pub obj_impl_level: u16,
	/// Store options bitfield; bit 0 marks reduced representation.
	pub options: u16,
	/// Creation timestamp string, at most 31 bytes.
	pub creation_date: String,
}

impl VersionRecord {
	/// Build a current-level record; `reduced` sets the representation
	/// bit.
	pub fn new(reduced: bool, creation_date: &str) -> Self {
		Self {
			version: CURRENT_VERSION,
			level: CURRENT_LEVEL,
			obj_impl_level: CURRENT_OBJ_IMPL_LEVEL,
			options: if reduced { OPT_REDUCED_REP } else { 0 },
			creation_date: creation_date.to_string(),
		}
	}

	/// Whether the store holds reduced-representation class records.
	pub fn is_reduced(&self) -> bool {
		self.options & OPT_REDUCED_REP != 0
	}

	/// Append the fixed-size wire form.
	pub fn encode(&self, writer: &mut Writer) {
		let hdr = ObjectHeader {
			kind: ObjectKind::Version,
			flags: crate::rep::header::HdrFlags::default(),
			size: VERSION_RECORD_WIRE as u32,
		};
		hdr.encode(writer);
		writer.put_bytes(&STORE_MAGIC);
		writer.put_u16(self.version);
		writer.put_u16(self.level);
		writer.put_u16(self.obj_impl_level);
		writer.put_u16(self.options);
		let mut date = [0_u8; CREATION_DATE_LEN];
		let text = self.creation_date.as_bytes();
		let take = text.len().min(CREATION_DATE_LEN - 1);
		date[..take].copy_from_slice(&text[..take]);
		writer.put_bytes(&date);
		writer.put_u32(VERSION_TRAILER);
	}

	/// Decode and validate the version record at the start of `bytes`.
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let size = cursor.read_u32().map_err(|_| RepError::InvalidVersionRecord)?;
		if size != VERSION_RECORD_WIRE as u32 {
			if size == (VERSION_RECORD_WIRE as u32).swap_bytes() {
				return Err(RepError::ForeignEndian);
			}
			return Err(RepError::InvalidVersionRecord);
		}
		let kind = cursor.read_u8()?;
		if kind != ObjectKind::Version as u8 {
			return Err(RepError::InvalidVersionRecord);
		}
		let _ = cursor.read_u8()?;
		let _ = cursor.read_u16()?;

		let mut magic = [0_u8; 8];
		magic.copy_from_slice(cursor.read_exact(8)?);
		if magic != STORE_MAGIC {
			return Err(RepError::BadMagic {
				expected: STORE_MAGIC,
				got: magic,
			});
		}

		let version = cursor.read_u16()?;
		let level = cursor.read_u16()?;
		let obj_impl_level = cursor.read_u16()?;
		let options = cursor.read_u16()?;

		let raw_date = cursor.read_exact(CREATION_DATE_LEN)?;
		let end = raw_date.iter().position(|b| *b == 0).unwrap_or(CREATION_DATE_LEN);
		let creation_date = String::from_utf8_lossy(&raw_date[..end]).into_owned();

		if cursor.read_u32()? != VERSION_TRAILER {
			return Err(RepError::InvalidVersionRecord);
		}

		Ok(Self {
			version,
			level,
			obj_impl_level,
			options,
			creation_date,
		})
	}
}

/// One raw record inside a store image.
#[derive(Debug, Clone, Copy)]
pub struct StoreRecord<'a> {
	/// Byte offset of the record header inside the image.
	pub offset: usize,
	/// Record kind tag.
	pub kind: ObjectKind,
	/// The record's flattened bytes.
	pub bytes: &'a [u8],
}

/// Decoded class store: decompressed image plus validated version
/// record.
#[derive(Debug)]
pub struct StoreReader {
	bytes: Vec<u8>,
	compression: Compression,
	version: VersionRecord,
}

impl StoreReader {
	/// Read and validate a `classSchemas[.gz]` file from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let raw = std::fs::read(path)?;
		Self::from_raw(raw)
	}

	/// Validate a store from raw (possibly gzip'd) bytes.
	pub fn from_raw(raw: Vec<u8>) -> Result<Self> {
		let (compression, bytes) = compression::decode_bytes(raw)?;
		let version = VersionRecord::decode(&bytes)?;
		if version.obj_impl_level != CURRENT_OBJ_IMPL_LEVEL {
			return Err(RepError::UnsupportedImplLevel {
				level: version.obj_impl_level,
				expected: CURRENT_OBJ_IMPL_LEVEL,
			});
		}
		Ok(Self {
			bytes,
			compression,
			version,
		})
	}

	/// Decompressed store image.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Consume the reader and return the decompressed image.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	/// Compression mode the file was stored with.
	pub fn compression(&self) -> Compression {
		self.compression
	}

	/// Validated version record.
	pub fn version(&self) -> &VersionRecord {
		&self.version
	}

	/// Iterate the records following the version record.
	pub fn records(&self) -> RecordIter<'_> {
		RecordIter {
			bytes: &self.bytes,
			pos: VERSION_RECORD_WIRE,
		}
	}
}

/// Sequential record iterator over a store image.
pub struct RecordIter<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Iterator for RecordIter<'a> {
	type Item = Result<StoreRecord<'a>>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.pos >= self.bytes.len() {
			return None;
		}
		let at = self.pos;
		let rem = self.bytes.len() - at;
		if rem < HEADER_WIRE {
			self.pos = self.bytes.len();
			return Some(Err(RepError::RecordOutOfRange {
				at,
				len: HEADER_WIRE,
				rem,
			}));
		}
		let header = match ObjectHeader::peek(&self.bytes[at..]) {
			Ok(header) => header,
			Err(err) => {
				self.pos = self.bytes.len();
				return Some(Err(err));
			}
		};
		let len = header.size as usize;
		if len < HEADER_WIRE || len > rem {
			self.pos = self.bytes.len();
			return Some(Err(RepError::RecordOutOfRange { at, len, rem }));
		}
		self.pos = at + len;
		Some(Ok(StoreRecord {
			offset: at,
			kind: header.kind,
			bytes: &self.bytes[at..at + len],
		}))
	}
}

/// Builder producing a store image from rebuilt class records.
pub struct StoreWriter {
	writer: Writer,
}

impl StoreWriter {
	/// Start a store image with the given version record.
	pub fn new(version: &VersionRecord) -> Self {
		let mut writer = Writer::with_capacity(VERSION_RECORD_WIRE);
		version.encode(&mut writer);
		Self { writer }
	}

	/// Append one class record, flattening it in place.
	pub fn add_class(&mut self, class: &Class) -> Result<()> {
		let bytes = class.rebuild()?;
		self.writer.put_bytes(&bytes);
		Ok(())
	}

	/// Append a pre-flattened record verbatim.
	pub fn add_record(&mut self, bytes: &[u8]) {
		self.writer.put_bytes(bytes);
	}

	/// Finish and return the plain store image.
	pub fn finish(self) -> Vec<u8> {
		self.writer.into_bytes()
	}

	/// Finish and return the gzip-compressed store image.
	pub fn finish_gzip(self) -> Result<Vec<u8>> {
		compression::encode_gzip(&self.writer.into_bytes())
	}
}
