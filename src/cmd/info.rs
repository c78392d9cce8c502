use std::path::PathBuf;

use cimrep::rep::{CacheLimits, ClassRegister, Result};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
}

/// Print version record fields and record counts for one store.
pub fn run(args: Args) -> Result<()> {
	let Args { path } = args;

	let register = ClassRegister::open(&path, CacheLimits::default())?;
	let version = register.version();

	println!("path: {}", path.display());
	println!("namespace: {}", register.namespace());
	println!("compression: {}", register.compression().as_str());
	println!("version: {}", version.version);
	println!("level: {}", version.level);
	println!("obj_impl_level: {}", version.obj_impl_level);
	println!("representation: {}", if version.is_reduced() { "reduced" } else { "full" });
	println!("created: {}", version.creation_date);
	println!("class_count: {}", register.class_count());
	println!("association_count: {}", register.association_count());
	println!("top_association_count: {}", register.top_association_count());

	Ok(())
}
