/// Single-class dump command.
pub mod class;
/// Class record listing command.
pub mod classes;
/// Store-level information command.
pub mod info;
/// Inheritance tree command.
pub mod tree;

pub(crate) mod util;
