//! Dispatch from `SourceLanguage` (or a file path) to the matching
//! `LanguageSupport` adapter. Mirrors the teacher's `get_support`/
//! `support_for_path` lookup.

use crate::traits::LanguageSupport;
use crate::{go_lang, java, javascript, python, rust_lang, typescript};
use cgraph_core::SourceLanguage;
use std::path::Path;

/// Look up the adapter for a language.
pub fn support_for_language(lang: SourceLanguage) -> &'static dyn LanguageSupport {
    match lang {
        SourceLanguage::Python => &python::Python,
        SourceLanguage::Java => &java::Java,
        SourceLanguage::JavaScript => &javascript::JavaScript,
        SourceLanguage::TypeScript => &typescript::TypeScript,
        SourceLanguage::Go => &go_lang::Go,
        SourceLanguage::Rust => &rust_lang::Rust,
    }
}

/// Look up the adapter for a file by its extension.
pub fn support_for_path(path: &Path) -> Option<&'static dyn LanguageSupport> {
    SourceLanguage::from_path(path).map(support_for_language)
}

pub fn supported_languages() -> &'static [SourceLanguage] {
    SourceLanguage::ALL
}
