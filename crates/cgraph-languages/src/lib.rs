//! Per-language AST adapters implementing the language-processor interface
//! (spec §6.4). Each module is a tagged variant paired with a record of
//! adapter functions (spec §9: "Polymorphism over language AST"); the
//! engine dispatches through a single `&dyn LanguageSupport` match.

mod registry;
mod traits;

pub mod go_lang;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust_lang;
pub mod typescript;

pub use registry::{support_for_language, support_for_path, supported_languages};
pub use traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
