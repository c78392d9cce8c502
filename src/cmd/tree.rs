use std::collections::HashSet;
use std::path::PathBuf;

use cimrep::rep::{CacheLimits, ClassRegister, Result};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
}

/// Print the inheritance hierarchy derived from the children table.
pub fn run(args: Args) -> Result<()> {
	let Args { path } = args;

	let register = ClassRegister::open(&path, CacheLimits::default())?;
	let mut roots: Vec<String> = register
		.records()
		.into_iter()
		.filter(|record| record.parent.is_none())
		.map(|record| record.name)
		.collect();
	roots.sort_unstable();

	let mut visited = HashSet::new();
	for root in roots {
		print_subtree(&register, &root, 0, &mut visited);
	}
	Ok(())
}

fn print_subtree(register: &ClassRegister, name: &str, depth: usize, visited: &mut HashSet<String>) {
	let indent = "  ".repeat(depth);
	if !visited.insert(name.to_ascii_lowercase()) {
		println!("{indent}{name} (cycle)");
		return;
	}
	println!("{indent}{name}");

	let mut children = register.children(name);
	children.sort_unstable();
	for child in children {
		print_subtree(register, &child, depth + 1, visited);
	}
}
