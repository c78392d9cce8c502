use std::path::PathBuf;

use cimrep::rep::{CacheLimits, ClassRegister, Result};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct Row {
	name: String,
	parent: Option<String>,
	association: bool,
	complete: bool,
	offset: usize,
	length: usize,
}

/// List every class record in a store.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let register = ClassRegister::open(&path, CacheLimits::default())?;
	let mut records = register.records();
	records.sort_by(|left, right| left.name.cmp(&right.name));

	if json {
		let rows: Vec<Row> = records
			.into_iter()
			.map(|record| Row {
				name: record.name,
				parent: record.parent,
				association: record.association,
				complete: record.complete,
				offset: record.offset,
				length: record.length,
			})
			.collect();
		println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
		return Ok(());
	}

	for record in records {
		let mut tags = Vec::new();
		if record.association {
			tags.push("association");
		}
		if !record.complete {
			tags.push("reduced");
		}
		let tags = if tags.is_empty() { String::new() } else { format!(" [{}]", tags.join(",")) };
		match &record.parent {
			Some(parent) => println!("{}: {parent}{tags}", record.name),
			None => println!("{}:{tags}", record.name),
		}
	}

	Ok(())
}
