use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, RepError>;

/// Errors produced while building, flattening, relocating, and loading
/// management objects and class stores.
#[derive(Debug, Error)]
pub enum RepError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Version record does not carry the expected store magic.
	#[error("invalid store magic {got:?} (expected {expected:?})")]
	BadMagic {
		/// Expected magic bytes.
		expected: [u8; 8],
		/// Actual magic bytes.
		got: [u8; 8],
	},
	/// Version record was written on a foreign-endian host.
	#[error("store written in foreign endian format")]
	ForeignEndian,
	/// Version record is truncated or structurally invalid.
	#[error("invalid version record")]
	InvalidVersionRecord,
	/// Store carries an unsupported object implementation level.
	#[error("unsupported object implementation level {level} (expected {expected})")]
	UnsupportedImplLevel {
		/// Level found in the version record.
		level: u16,
		/// Level this implementation supports.
		expected: u16,
	},
	/// Store record is not a class record.
	#[error("non-class record (kind {kind}) at offset {at}")]
	UnexpectedRecord {
		/// Raw kind tag of the offending record.
		kind: u8,
		/// Byte offset of the record header.
		at: usize,
	},
	/// Store record length exceeds the remaining stream.
	#[error("record at offset {at} declares {len} bytes, remaining {rem}")]
	RecordOutOfRange {
		/// Byte offset of the record header.
		at: usize,
		/// Declared record length.
		len: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Decompression output exceeded the configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Unknown object kind tag in a flattened header.
	#[error("unknown object kind tag {kind}")]
	UnknownKind {
		/// Offending kind tag.
		kind: u8,
	},
	/// Unknown value kind tag in a flattened typed value.
	#[error("unknown value kind tag {kind}")]
	UnknownValueKind {
		/// Offending kind tag.
		kind: u8,
	},
	/// Flattened buffer holds a different object kind than requested.
	#[error("object kind mismatch: expected {expected}, got {got}")]
	KindMismatch {
		/// Requested object kind.
		expected: &'static str,
		/// Kind found in the buffer header.
		got: &'static str,
	},
	/// Rebuild wrote a different byte count than the size pass computed.
	#[error("rebuild size mismatch: computed {computed}, written {written}")]
	SizeMismatch {
		/// Bytes computed by the size pass.
		computed: usize,
		/// Bytes actually written.
		written: usize,
	},
	/// Flattened header declares a size the buffer cannot satisfy.
	#[error("declared object size {declared} exceeds buffer length {have}")]
	BadDeclaredSize {
		/// Size field from the object header.
		declared: usize,
		/// Bytes actually available.
		have: usize,
	},
	/// String table id is zero or past the index.
	#[error("invalid string id {id}")]
	BadStringId {
		/// Offending logical id.
		id: u32,
	},
	/// Array table id is zero or past the index.
	#[error("invalid array id {id}")]
	BadArrayId {
		/// Offending logical id.
		id: u32,
	},
	/// String table entry is not valid UTF-8.
	#[error("string entry {id} is not valid utf-8")]
	NotUtf8 {
		/// Offending logical id.
		id: u32,
	},
	/// Positional accessor index past the section's used count.
	#[error("{what} index {idx} out of range (count {count})")]
	IndexOutOfRange {
		/// Logical record kind being indexed.
		what: &'static str,
		/// Offending index.
		idx: usize,
		/// Number of records in the section.
		count: usize,
	},
	/// Named property lookup found nothing.
	#[error("no such property '{name}'")]
	NoSuchProperty {
		/// Name that failed to resolve.
		name: String,
	},
	/// Replacement value kind does not match the stored kind.
	#[error("type mismatch on '{name}': stored {stored}, supplied {supplied}")]
	TypeMismatch {
		/// Member name being replaced.
		name: String,
		/// Kind of the stored value.
		stored: &'static str,
		/// Kind of the supplied value.
		supplied: &'static str,
	},
	/// Object paths do not carry an array table.
	#[error("array-valued key '{name}' not supported on object paths")]
	ArrayKeyUnsupported {
		/// Offending key name.
		name: String,
	},
	/// Array element kind that cannot be stored in the array table.
	#[error("unsupported array element kind {kind}")]
	UnsupportedArrayElement {
		/// Offending element kind.
		kind: &'static str,
	},
	/// Requested class name is not indexed by the register.
	#[error("class not found: {name}")]
	ClassNotFound {
		/// Requested class name.
		name: String,
	},
	/// Ancestor named by a class record is missing from the register.
	#[error("invalid superclass '{parent}' of '{class}'")]
	InvalidSuperclass {
		/// Class whose resolution failed.
		class: String,
		/// Ancestor that could not be found.
		parent: String,
	},
	/// Ancestor chain revisits a class name.
	#[error("ancestor cycle detected at '{class}'")]
	AncestorCycle {
		/// Class name seen twice on the chain.
		class: String,
	},
}
