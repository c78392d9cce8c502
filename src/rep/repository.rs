use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::rep::register::{CacheLimits, ClassRegister};
use crate::rep::{RepError, Result};

/// Store file name inside each namespace directory.
pub const STORE_FILE: &str = "classSchemas";

/// All namespace registers below one repository root.
///
/// Built exactly once at startup and passed by reference to callers;
/// there is no process-global instance.
pub struct Repository {
	root: PathBuf,
	registers: HashMap<String, ClassRegister>,
}

impl Repository {
	/// Scan `root` recursively, opening every namespace store found.
	///
	/// Directory paths relative to `root` become namespace names. A
	/// namespace whose store fails validation is logged and left out;
	/// lookups then report it as unknown rather than failing the whole
	/// repository.
	pub fn open(root: impl AsRef<Path>, limits: CacheLimits) -> Result<Self> {
		let root = root.as_ref().to_path_buf();
		if !root.is_dir() {
			return Err(RepError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("repository root {} not found", root.display()),
			)));
		}

		let mut registers = HashMap::new();
		scan_namespaces(&root, &root, limits, &mut registers)?;
		info!("repository {} serves {} namespace(s)", root.display(), registers.len());
		Ok(Self { root, registers })
	}

	/// Repository root directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Register for `namespace`, matched case-insensitively.
	pub fn register(&self, namespace: &str) -> Option<&ClassRegister> {
		self.registers.get(&namespace.to_ascii_lowercase())
	}

	/// Namespace names in sorted order.
	pub fn namespaces(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.registers.values().map(ClassRegister::namespace).collect();
		names.sort_unstable();
		names
	}

	/// Number of loaded namespaces.
	pub fn len(&self) -> usize {
		self.registers.len()
	}

	/// Whether no namespace store was loaded.
	pub fn is_empty(&self) -> bool {
		self.registers.is_empty()
	}
}

fn scan_namespaces(
	root: &Path,
	dir: &Path,
	limits: CacheLimits,
	registers: &mut HashMap<String, ClassRegister>,
) -> Result<()> {
	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		if !path.is_dir() {
			continue;
		}

		let store = find_store(&path);
		if let Some(store) = store {
			let namespace = namespace_name(root, &path);
			match std::fs::read(&store).map_err(RepError::from).and_then(|raw| {
				ClassRegister::load(&namespace, raw, limits)
			}) {
				Ok(register) => {
					registers.insert(namespace.to_ascii_lowercase(), register);
				}
				Err(err) => {
					warn!("skipping namespace {namespace}: {err}");
				}
			}
		}

		scan_namespaces(root, &path, limits, registers)?;
	}
	Ok(())
}

fn find_store(dir: &Path) -> Option<PathBuf> {
	let plain = dir.join(STORE_FILE);
	if plain.is_file() {
		return Some(plain);
	}
	let gz = dir.join(format!("{STORE_FILE}.gz"));
	if gz.is_file() {
		return Some(gz);
	}
	None
}

fn namespace_name(root: &Path, dir: &Path) -> String {
	let rel = dir.strip_prefix(root).unwrap_or(dir);
	let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
	parts.join("/")
}
