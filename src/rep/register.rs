use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;

use crate::rep::cache::LruChain;
use crate::rep::class::Class;
use crate::rep::compression::Compression;
use crate::rep::header::ObjectKind;
use crate::rep::store::{StoreReader, VersionRecord};
use crate::rep::{RepError, Result};

/// Class names with this prefix are loader tombstones and are skipped.
const TOMBSTONE_PREFIX: &str = "DMY_";

/// Cache capacities supplied by the startup initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
	/// Base-class cache capacity.
	pub base_classes: usize,
	/// Resolved-class cache capacity.
	pub resolved_classes: usize,
}

impl Default for CacheLimits {
	fn default() -> Self {
		Self {
			base_classes: 10,
			resolved_classes: 10,
		}
	}
}

/// Read intent passed to class lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCtl {
	/// Decode without touching the cache.
	Transient,
	/// Cache the decoded class at the head of the LRU chain.
	Cached,
}

/// Shallow record facts exposed for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInfo {
	/// Class name as stored.
	pub name: String,
	/// Superclass name, when declared.
	pub parent: Option<String>,
	/// Whether the Association bit is set.
	pub association: bool,
	/// Whether the record carries its full member set.
	pub complete: bool,
	/// Record offset inside the store image.
	pub offset: usize,
	/// Record byte length.
	pub length: usize,
}

/// One indexed class record with its two independent cache slots.
///
/// The record itself is never evicted; eviction only drops the decoded
/// objects the slots may hold.
#[derive(Debug)]
struct ClassRecord {
	name: String,
	parent: Option<String>,
	offset: usize,
	length: usize,
	association: bool,
	complete: bool,
	base: Option<Arc<Class>>,
	resolved: Option<Arc<Class>>,
}

#[derive(Debug)]
pub(crate) struct RegisterCache {
	records: HashMap<String, ClassRecord>,
	base_lru: LruChain,
	resolved_lru: LruChain,
}

/// Per-namespace class index over one decompressed store image, with
/// two independent LRU caches behind a reader/writer lock.
#[derive(Debug)]
pub struct ClassRegister {
	namespace: String,
	version: VersionRecord,
	compression: Compression,
	image: Vec<u8>,
	children: HashMap<String, Vec<String>>,
	assocs: usize,
	top_assocs: usize,
	cache: RwLock<RegisterCache>,
}

impl ClassRegister {
	/// Open a `classSchemas[.gz]` file; the namespace label is taken
	/// from the parent directory name.
	pub fn open(path: impl AsRef<Path>, limits: CacheLimits) -> Result<Self> {
		let path = path.as_ref();
		let namespace = path
			.parent()
			.and_then(|p| p.file_name())
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_default();
		let raw = std::fs::read(path)?;
		Self::load(&namespace, raw, limits)
	}

	/// Validate and index a store from raw (possibly gzip'd) bytes.
	///
	/// Scans every record once for name, parent, and association
	/// facts, then derives the parent-to-children table in a second
	/// pass; class bodies stay undecoded until first access.
	pub fn load(namespace: &str, raw: Vec<u8>, limits: CacheLimits) -> Result<Self> {
		let reader = StoreReader::from_raw(raw)?;
		let version = reader.version().clone();
		let compression = reader.compression();

		let mut records = HashMap::new();
		let mut assocs = 0;
		let mut top_assocs = 0;
		for record in reader.records() {
			let record = record?;
			if record.kind != ObjectKind::Class && record.kind != ObjectKind::IncompleteClass {
				return Err(RepError::UnexpectedRecord {
					kind: record.kind as u8,
					at: record.offset,
				});
			}
			let summary = Class::peek(record.bytes)?;
			if summary.name.starts_with(TOMBSTONE_PREFIX) {
				debug!("{namespace}: skipping tombstone record {}", summary.name);
				continue;
			}
			if summary.association {
				assocs += 1;
				if summary.parent.is_none() {
					top_assocs += 1;
				}
			}
			records.insert(
				summary.name.to_ascii_lowercase(),
				ClassRecord {
					name: summary.name,
					parent: summary.parent,
					offset: record.offset,
					length: record.bytes.len(),
					association: summary.association,
					complete: summary.complete,
					base: None,
					resolved: None,
				},
			);
		}

		let mut children: HashMap<String, Vec<String>> = HashMap::new();
		for record in records.values() {
			if let Some(parent) = &record.parent {
				children.entry(parent.to_ascii_lowercase()).or_default().push(record.name.clone());
			}
		}

		info!(
			"caching class register for {namespace} ({}.{}-{}, {} classes, {} associations)",
			version.version,
			version.level,
			version.obj_impl_level,
			records.len(),
			assocs,
		);

		Ok(Self {
			namespace: namespace.to_string(),
			version,
			compression,
			image: reader.into_bytes(),
			children,
			assocs,
			top_assocs,
			cache: RwLock::new(RegisterCache {
				records,
				base_lru: LruChain::new(limits.base_classes),
				resolved_lru: LruChain::new(limits.resolved_classes),
			}),
		})
	}

	/// Namespace label this register serves.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Validated store version record.
	pub fn version(&self) -> &VersionRecord {
		&self.version
	}

	/// Compression mode the store file used.
	pub fn compression(&self) -> Compression {
		self.compression
	}

	/// Whether resolution must merge ancestor members on read.
	pub fn is_reduced(&self) -> bool {
		self.version.is_reduced()
	}

	/// Number of indexed class records.
	pub fn class_count(&self) -> usize {
		self.cache.read().records.len()
	}

	/// Number of association classes.
	pub fn association_count(&self) -> usize {
		self.assocs
	}

	/// Number of association classes without a superclass.
	pub fn top_association_count(&self) -> usize {
		self.top_assocs
	}

	/// Whether `name` is indexed, matched case-insensitively.
	pub fn contains(&self, name: &str) -> bool {
		self.cache.read().records.contains_key(&name.to_ascii_lowercase())
	}

	/// Shallow facts for every indexed record, unordered.
	pub fn records(&self) -> Vec<RecordInfo> {
		self.cache
			.read()
			.records
			.values()
			.map(|record| RecordInfo {
				name: record.name.clone(),
				parent: record.parent.clone(),
				association: record.association,
				complete: record.complete,
				offset: record.offset,
				length: record.length,
			})
			.collect()
	}

	/// Direct children of `name`, unsorted, matched case-insensitively.
	pub fn children(&self, name: &str) -> Vec<String> {
		self.children.get(&name.to_ascii_lowercase()).cloned().unwrap_or_default()
	}

	/// Cached base-class names, most recently used first.
	pub fn cached_base_classes(&self) -> Vec<String> {
		self.cache.read().base_lru.keys().map(str::to_string).collect()
	}

	/// Cached resolved-class names, most recently used first.
	pub fn cached_resolved_classes(&self) -> Vec<String> {
		self.cache.read().resolved_lru.keys().map(str::to_string).collect()
	}

	fn decode_at(&self, offset: usize, length: usize) -> Result<Class> {
		Class::relocate(&self.image[offset..offset + length])
	}

	/// Fetch a class as stored, without ancestor resolution.
	///
	/// `Transient` reads run under the reader lock and leave the cache
	/// untouched; `Cached` reads insert at the head of the base LRU,
	/// evicting past capacity.
	pub fn get_class(&self, name: &str, ctl: ReadCtl) -> Result<Option<Arc<Class>>> {
		let key = name.to_ascii_lowercase();
		match ctl {
			ReadCtl::Transient => {
				let cache = self.cache.read();
				let Some(record) = cache.records.get(&key) else {
					return Ok(None);
				};
				if let Some(cached) = &record.base {
					return Ok(Some(cached.clone()));
				}
				Ok(Some(Arc::new(self.decode_at(record.offset, record.length)?)))
			}
			ReadCtl::Cached => {
				let mut cache = self.cache.write();
				self.get_class_locked(&mut cache, &key)
			}
		}
	}

	pub(crate) fn get_class_locked(&self, cache: &mut RegisterCache, key: &str) -> Result<Option<Arc<Class>>> {
		let (offset, length) = {
			let Some(record) = cache.records.get(key) else {
				return Ok(None);
			};
			if let Some(cached) = &record.base {
				let cached = cached.clone();
				cache.base_lru.touch(key);
				return Ok(Some(cached));
			}
			(record.offset, record.length)
		};

		let decoded = Arc::new(self.decode_at(offset, length)?);
		if let Some(record) = cache.records.get_mut(key) {
			record.base = Some(decoded.clone());
		}
		if let Some(evicted) = cache.base_lru.insert(key.to_string())
			&& let Some(record) = cache.records.get_mut(&evicted)
		{
			record.base = None;
		}
		Ok(Some(decoded))
	}

	/// Fetch a class with every inherited member present.
	///
	/// On a full-representation store this is a plain cached read. On
	/// a reduced store the ancestor chain is folded into a synthetic
	/// class which is cached in the independent resolved LRU; a failed
	/// merge is never cached.
	pub fn get_resolved_class(&self, name: &str) -> Result<Option<Arc<Class>>> {
		if !self.version.is_reduced() {
			return self.get_class(name, ReadCtl::Cached);
		}

		let key = name.to_ascii_lowercase();
		let mut cache = self.cache.write();

		{
			let Some(record) = cache.records.get(&key) else {
				return Ok(None);
			};
			if let Some(cached) = &record.resolved {
				let cached = cached.clone();
				cache.resolved_lru.touch(&key);
				return Ok(Some(cached));
			}
		}

		let Some(base) = self.get_class_locked(&mut cache, &key)? else {
			return Ok(None);
		};
		if base.is_complete() || base.parent_name().is_none() {
			return Ok(Some(base));
		}

		debug!("{}: merging ancestors of {name}", self.namespace);
		let merged = Arc::new(crate::rep::resolve::merge_ancestors(self, &mut cache, &base)?);
		if let Some(record) = cache.records.get_mut(&key) {
			record.resolved = Some(merged.clone());
		}
		if let Some(evicted) = cache.resolved_lru.insert(key)
			&& let Some(record) = cache.records.get_mut(&evicted)
		{
			record.resolved = None;
		}
		Ok(Some(merged))
	}
}
