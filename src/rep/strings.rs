use crate::rep::bytes::{Cursor, Writer, align4};
use crate::rep::{RepError, Result};

/// First allocation for a table index.
const INDEX_INITIAL: usize = 16;

/// Logical id of a string table entry; 0 is the absent-name sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringId(pub u32);

impl StringId {
	/// Sentinel id for an absent entry.
	pub const NONE: StringId = StringId(0);

	/// Whether this id is the absent sentinel.
	pub fn is_none(self) -> bool {
		self.0 == 0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StrEntry {
	off: u32,
	len: u32,
}

/// Append-only byte arena indexed by 1-based logical ids.
///
/// Stores member names and opaque blobs, including flattened nested
/// objects. Ids stay stable for the table's live lifetime; `replace`
/// and `remove` compact the arena but never renumber entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTable {
	arena: Vec<u8>,
	index: Vec<StrEntry>,
}

impl StringTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of entries (live and emptied).
	pub fn len(&self) -> usize {
		self.index.len()
	}

	/// Whether the table holds no entries.
	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	/// Append a UTF-8 string, returning its 1-based id.
	pub fn add_str(&mut self, value: &str) -> StringId {
		self.add_bytes(value.as_bytes())
	}

	/// Append `value` when present, else return the absent sentinel.
	pub fn add_opt(&mut self, value: Option<&str>) -> StringId {
		match value {
			Some(value) => self.add_str(value),
			None => StringId::NONE,
		}
	}

	/// Append raw bytes verbatim, returning their 1-based id.
	///
	/// Used for names and for embedding pre-flattened nested objects as
	/// opaque blobs in the same arena.
	pub fn add_bytes(&mut self, value: &[u8]) -> StringId {
		if self.index.capacity() == 0 {
			self.index.reserve(INDEX_INITIAL);
		}
		let entry = StrEntry {
			off: self.arena.len() as u32,
			len: value.len() as u32,
		};
		self.arena.extend_from_slice(value);
		self.index.push(entry);
		StringId(self.index.len() as u32)
	}

	fn entry(&self, id: StringId) -> Result<StrEntry> {
		if id.is_none() || id.0 as usize > self.index.len() {
			return Err(RepError::BadStringId { id: id.0 });
		}
		Ok(self.index[id.0 as usize - 1])
	}

	/// Return the raw bytes stored under `id`.
	pub fn get_bytes(&self, id: StringId) -> Result<&[u8]> {
		let entry = self.entry(id)?;
		Ok(&self.arena[entry.off as usize..(entry.off + entry.len) as usize])
	}

	/// Return the UTF-8 string stored under `id`.
	pub fn get_str(&self, id: StringId) -> Result<&str> {
		let bytes = self.get_bytes(id)?;
		std::str::from_utf8(bytes).map_err(|_| RepError::NotUtf8 { id: id.0 })
	}

	/// Return the string under `id`, or `None` for the absent sentinel.
	pub fn get_opt_str(&self, id: StringId) -> Result<Option<&str>> {
		if id.is_none() {
			return Ok(None);
		}
		self.get_str(id).map(Some)
	}

	/// Replace the entry under `id` with new bytes.
	///
	/// Every other entry is compacted into a fresh arena in index
	/// order, then the new value is appended at the end and the entry
	/// repointed. O(table size) per call; repeating the same
	/// replacement does not grow the arena further.
	pub fn replace(&mut self, id: StringId, value: &[u8]) -> Result<()> {
		let _ = self.entry(id)?;
		self.compact_without(id.0 as usize - 1);
		let target = &mut self.index[id.0 as usize - 1];
		target.off = self.arena.len() as u32;
		target.len = value.len() as u32;
		self.arena.extend_from_slice(value);
		Ok(())
	}

	/// Empty the entry under `id` without renumbering.
	///
	/// The caller must immediately append a replacement blob; the
	/// emptied slot stays allocated so other ids remain valid.
	pub fn remove(&mut self, id: StringId) -> Result<()> {
		let _ = self.entry(id)?;
		self.compact_without(id.0 as usize - 1);
		let target = &mut self.index[id.0 as usize - 1];
		target.off = self.arena.len() as u32;
		target.len = 0;
		Ok(())
	}

	fn compact_without(&mut self, skip: usize) {
		let mut arena = Vec::with_capacity(self.arena.len());
		for (i, entry) in self.index.iter_mut().enumerate() {
			if i == skip {
				continue;
			}
			let from = entry.off as usize..(entry.off + entry.len) as usize;
			entry.off = arena.len() as u32;
			arena.extend_from_slice(&self.arena[from]);
		}
		self.arena = arena;
	}

	/// Flattened byte length of this table, including padding.
	pub fn wire_size(&self) -> usize {
		8 + self.index.len() * 8 + align4(self.arena.len())
	}

	/// Append the flattened form.
	pub fn encode(&self, writer: &mut Writer) {
		writer.put_u32(self.index.len() as u32);
		writer.put_u32(self.arena.len() as u32);
		for entry in &self.index {
			writer.put_u32(entry.off);
			writer.put_u32(entry.len);
		}
		writer.put_bytes(&self.arena);
		writer.pad4();
	}

	/// Decode a flattened table.
	pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
		let used = cursor.read_u32()? as usize;
		let arena_len = cursor.read_u32()? as usize;
		let mut index = Vec::with_capacity(used);
		for _ in 0..used {
			let off = cursor.read_u32()?;
			let len = cursor.read_u32()?;
			if u64::from(off) + u64::from(len) > arena_len as u64 {
				return Err(RepError::BadStringId { id: index.len() as u32 + 1 });
			}
			index.push(StrEntry { off, len });
		}
		let arena = cursor.read_exact(arena_len)?.to_vec();
		cursor.align4()?;
		Ok(Self { arena, index })
	}
}

#[cfg(test)]
mod tests;
