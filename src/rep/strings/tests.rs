use crate::rep::RepError;
use crate::rep::bytes::{Cursor, Writer};
use crate::rep::strings::{StringId, StringTable};

#[test]
fn ids_are_one_based_and_monotonic() {
	let mut table = StringTable::new();
	let values = ["alpha", "beta", "gamma", "delta"];
	for (i, value) in values.iter().enumerate() {
		let id = table.add_str(value);
		assert_eq!(id, StringId(i as u32 + 1));
	}
	for (i, value) in values.iter().enumerate() {
		let got = table.get_str(StringId(i as u32 + 1)).expect("entry resolves");
		assert_eq!(got, *value);
	}
}

#[test]
fn sentinel_and_out_of_range_ids_are_rejected() {
	let mut table = StringTable::new();
	table.add_str("only");
	assert!(matches!(table.get_bytes(StringId::NONE), Err(RepError::BadStringId { id: 0 })));
	assert!(matches!(table.get_bytes(StringId(2)), Err(RepError::BadStringId { id: 2 })));
	assert_eq!(table.get_opt_str(StringId::NONE).expect("sentinel maps to none"), None);
}

#[test]
fn replace_rewrites_one_entry_and_keeps_the_rest() {
	let mut table = StringTable::new();
	let a = table.add_str("first");
	let b = table.add_str("second");
	let c = table.add_str("third");

	table.replace(b, b"replacement").expect("replace succeeds");

	assert_eq!(table.get_str(a).expect("a resolves"), "first");
	assert_eq!(table.get_str(b).expect("b resolves"), "replacement");
	assert_eq!(table.get_str(c).expect("c resolves"), "third");
}

#[test]
fn replace_is_idempotent_in_space() {
	let mut table = StringTable::new();
	table.add_str("one");
	let id = table.add_str("two");
	table.add_str("three");

	table.replace(id, b"longer-value").expect("first replace succeeds");
	let size_after_first = table.wire_size();

	table.replace(id, b"longer-value").expect("second replace succeeds");
	assert_eq!(table.get_str(id).expect("entry resolves"), "longer-value");
	assert_eq!(table.wire_size(), size_after_first);
}

#[test]
fn remove_empties_the_slot_without_renumbering() {
	let mut table = StringTable::new();
	let a = table.add_str("keep");
	let b = table.add_bytes(b"blob-to-drop");
	let c = table.add_str("also-keep");

	table.remove(b).expect("remove succeeds");

	assert_eq!(table.get_str(a).expect("a resolves"), "keep");
	assert_eq!(table.get_bytes(b).expect("emptied slot resolves"), b"");
	assert_eq!(table.get_str(c).expect("c resolves"), "also-keep");

	let fresh = table.add_bytes(b"replacement-blob");
	assert_eq!(fresh, StringId(4));
	assert_eq!(table.get_bytes(fresh).expect("fresh resolves"), b"replacement-blob");
}

#[test]
fn raw_blobs_with_interior_nuls_survive() {
	let mut table = StringTable::new();
	let blob = [0_u8, 1, 0, 2, 0, 3];
	let id = table.add_bytes(&blob);
	assert_eq!(table.get_bytes(id).expect("blob resolves"), &blob);
}

#[test]
fn wire_round_trip_preserves_entries() {
	let mut table = StringTable::new();
	table.add_str("name");
	let replaced = table.add_str("will-change");
	table.add_bytes(&[9, 8, 7]);
	table.replace(replaced, b"changed").expect("replace succeeds");

	let mut writer = Writer::with_capacity(table.wire_size());
	table.encode(&mut writer);
	let bytes = writer.into_bytes();
	assert_eq!(bytes.len(), table.wire_size());

	let decoded = StringTable::decode(&mut Cursor::new(&bytes)).expect("table decodes");
	assert_eq!(decoded, table);
}

#[test]
fn decode_rejects_entry_past_arena() {
	let mut writer = Writer::with_capacity(24);
	writer.put_u32(1);
	writer.put_u32(4);
	writer.put_u32(2);
	writer.put_u32(4);
	writer.put_bytes(&[0; 4]);
	let bytes = writer.into_bytes();
	assert!(StringTable::decode(&mut Cursor::new(&bytes)).is_err());
}
