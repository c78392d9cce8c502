//! Public library API for the relocatable CIM object representation
//! and the per-namespace class repository built on it.

/// Object model, flatten/relocate codecs, class stores, and the
/// namespace repository.
pub mod rep;
