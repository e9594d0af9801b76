//! Tree-sitter parser pool (spec §4.2).

mod pool;

pub use pool::{ParsedFile, ParserPool};
