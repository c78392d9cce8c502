use crate::rep::args::ArgumentList;
use crate::rep::instance::Instance;
use crate::rep::value::{CimKind, CimValue};

fn sample_args() -> ArgumentList {
	let mut args = ArgumentList::new();
	args.add_argument("MethodName", &CimValue::String("RequestStateChange".into())).expect("argument adds");
	args.add_argument("RequestedState", &CimValue::Uint16(3)).expect("argument adds");
	args.add_argument(
		"Tags",
		&CimValue::Array(CimKind::String, vec![CimValue::String("fast".into()), CimValue::String("safe".into())]),
	)
	.expect("array argument adds");
	args
}

#[test]
fn arguments_read_back_by_position_and_name() {
	let args = sample_args();
	assert_eq!(args.argument_count(), 3);
	assert_eq!(args.locate_argument("requestedstate"), Some(1));
	assert_eq!(args.argument_at(1).expect("argument hydrates").value, CimValue::Uint16(3));
}

#[test]
fn empty_list_round_trips() {
	let args = ArgumentList::new();
	let bytes = args.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), args.size());
	let back = ArgumentList::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.argument_count(), 0);
}

#[test]
fn rebuild_then_relocate_round_trips() {
	let args = sample_args();
	let bytes = args.rebuild().expect("rebuild succeeds");
	assert_eq!(bytes.len(), args.size());

	let back = ArgumentList::relocate(&bytes).expect("relocate succeeds");
	assert_eq!(back.argument_count(), args.argument_count());
	for idx in 0..args.argument_count() {
		assert_eq!(
			back.argument_at(idx).expect("argument hydrates"),
			args.argument_at(idx).expect("argument hydrates"),
		);
	}
}

#[test]
fn embedded_argument_replacement_swaps_blobs() {
	let mut args = ArgumentList::new();

	let mut first = Instance::new(Some("root/cimv2"), Some("Linux_Job"));
	first.add_property("Id", &CimValue::Uint32(1)).expect("property adds");
	args.add_argument("Job", &CimValue::Instance(Box::new(first))).expect("embedded adds");
	assert!(args.contains_embedded());

	let mut second = Instance::new(Some("root/cimv2"), Some("Linux_Job"));
	second.add_property("Id", &CimValue::Uint32(2)).expect("property adds");
	second.add_property("Owner", &CimValue::String("operator".into())).expect("property adds");
	args.add_argument("Job", &CimValue::Instance(Box::new(second))).expect("embedded replaces");

	assert_eq!(args.argument_count(), 1);
	match args.argument_at(0).expect("argument hydrates").value {
		CimValue::Instance(decoded) => {
			let idx = decoded.locate_property("Id").expect("property located");
			assert_eq!(decoded.property_at(idx).expect("property hydrates").value, CimValue::Uint32(2));
		}
		other => panic!("expected embedded instance, got {other:?}"),
	}
}
