use crate::rep::bytes::{Cursor, Writer};
use crate::rep::value::{CimKind, TypedValue, VALUE_WIRE, ValueFlags};
use crate::rep::{RepError, Result};

/// First allocation for a table index.
const INDEX_INITIAL: usize = 16;

/// Logical id of an array table entry; 0 is the absent sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayId(pub u32);

impl ArrayId {
	/// Sentinel id for an absent entry.
	pub const NONE: ArrayId = ArrayId(0);

	/// Whether this id is the absent sentinel.
	pub fn is_none(self) -> bool {
		self.0 == 0
	}
}

/// Append-only arena of typed value records indexed by 1-based ids.
///
/// Each stored array is prefixed by one record whose payload holds the
/// element count, so every entry's extent is self-describing. This is
/// deliberately different from the string table, whose entries carry
/// explicit lengths in the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayTable {
	arena: Vec<TypedValue>,
	index: Vec<u32>,
}

impl ArrayTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.index.len()
	}

	/// Whether the table holds no entries.
	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	/// Append an array of `elem_kind` records, returning its 1-based id.
	pub fn add(&mut self, elem_kind: CimKind, elems: &[TypedValue]) -> ArrayId {
		if self.index.capacity() == 0 {
			self.index.reserve(INDEX_INITIAL);
		}
		self.index.push(self.arena.len() as u32);
		let mut prefix = TypedValue::with_raw(elem_kind, elems.len() as u64);
		prefix.flags.insert(ValueFlags::ARRAY);
		self.arena.push(prefix);
		self.arena.extend_from_slice(elems);
		ArrayId(self.index.len() as u32)
	}

	fn offset(&self, id: ArrayId) -> Result<usize> {
		if id.is_none() || id.0 as usize > self.index.len() {
			return Err(RepError::BadArrayId { id: id.0 });
		}
		Ok(self.index[id.0 as usize - 1] as usize)
	}

	/// Return the elements stored under `id`, count prefix stripped.
	pub fn get(&self, id: ArrayId) -> Result<&[TypedValue]> {
		let off = self.offset(id)?;
		let count = self.arena[off].raw as usize;
		Ok(&self.arena[off + 1..off + 1 + count])
	}

	/// Return the element kind recorded in the count prefix of `id`.
	pub fn elem_kind(&self, id: ArrayId) -> Result<CimKind> {
		let off = self.offset(id)?;
		Ok(self.arena[off].kind)
	}

	/// Replace the array under `id`.
	///
	/// Compacts every other entry, deriving each extent from its own
	/// count prefix, then appends the new array and repoints the entry.
	pub fn replace(&mut self, id: ArrayId, elem_kind: CimKind, elems: &[TypedValue]) -> Result<()> {
		let _ = self.offset(id)?;
		let skip = id.0 as usize - 1;

		let mut arena = Vec::with_capacity(self.arena.len());
		for (i, off) in self.index.iter_mut().enumerate() {
			if i == skip {
				continue;
			}
			let from = *off as usize;
			let extent = self.arena[from].raw as usize + 1;
			*off = arena.len() as u32;
			arena.extend_from_slice(&self.arena[from..from + extent]);
		}

		self.index[skip] = arena.len() as u32;
		let mut prefix = TypedValue::with_raw(elem_kind, elems.len() as u64);
		prefix.flags.insert(ValueFlags::ARRAY);
		arena.push(prefix);
		arena.extend_from_slice(elems);
		self.arena = arena;
		Ok(())
	}

	/// Flattened byte length of this table.
	pub fn wire_size(&self) -> usize {
		8 + self.index.len() * 4 + self.arena.len() * VALUE_WIRE
	}

	/// Append the flattened form.
	pub fn encode(&self, writer: &mut Writer) {
		writer.put_u32(self.index.len() as u32);
		writer.put_u32(self.arena.len() as u32);
		for off in &self.index {
			writer.put_u32(*off);
		}
		for record in &self.arena {
			record.encode(writer);
		}
	}

	/// Decode a flattened table.
	pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
		let used = cursor.read_u32()? as usize;
		let arena_len = cursor.read_u32()? as usize;
		let mut index = Vec::with_capacity(used);
		for _ in 0..used {
			index.push(cursor.read_u32()?);
		}
		let mut arena = Vec::with_capacity(arena_len);
		for _ in 0..arena_len {
			arena.push(TypedValue::decode(cursor)?);
		}
		for (i, off) in index.iter().enumerate() {
			let off = *off as usize;
			if off >= arena.len() || arena[off].raw > (arena.len() - off - 1) as u64 {
				return Err(RepError::BadArrayId { id: i as u32 + 1 });
			}
		}
		Ok(Self { arena, index })
	}
}
