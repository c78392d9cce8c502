mod args;
mod arrays;
mod bytes;
mod cache;
mod class;
mod compression;
mod error;
mod header;
mod instance;
mod members;
mod path;
mod qualdecl;
mod register;
mod repository;
mod resolve;
mod section;
mod store;
mod strings;
mod value;

/// Method invocation argument lists.
pub use args::ArgumentList;
/// Array table and its 1-based ids.
pub use arrays::{ArrayId, ArrayTable};
/// Management class object and shallow record summaries.
pub use class::{Class, ClassSummary};
/// Compression detection for store files.
pub use compression::{Compression, decode_bytes, encode_gzip};
/// Error and result aliases.
pub use error::{RepError, Result};
/// Common flattened object header types.
pub use header::{HdrFlags, ObjectHeader, ObjectKind};
/// Class instance object.
pub use instance::Instance;
/// Hydrated member views and member flag bits.
pub use members::{MethodView, ParameterView, PropFlags, PropertyView, QualifierView};
/// Object path object.
pub use path::ObjectPath;
/// Qualifier declaration object with scope and flavor bits.
pub use qualdecl::{QualifierDeclaration, flavor, scope};
/// Per-namespace class register, cache limits, and read intents.
pub use register::{CacheLimits, ClassRegister, ReadCtl, RecordInfo};
/// Namespace repository scan.
pub use repository::{Repository, STORE_FILE};
/// Section storage for member records.
pub use section::Section;
/// Class store reader/writer and version record.
pub use store::{
	CURRENT_LEVEL, CURRENT_OBJ_IMPL_LEVEL, CURRENT_VERSION, STORE_MAGIC, StoreReader, StoreRecord,
	StoreWriter, VERSION_RECORD_WIRE, VersionRecord,
};
/// String table and its 1-based ids.
pub use strings::{StringId, StringTable};
/// Typed value records and hydrated values.
pub use value::{CimKind, CimValue, TypedValue, ValueFlags};
