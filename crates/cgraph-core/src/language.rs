//! Language identification and the walker's file classification (spec §4.1).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A language with a registered `LanguageSupport` adapter in `cgraph-languages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLanguage {
    Python,
    Java,
    JavaScript,
    TypeScript,
    Go,
    Rust,
}

impl SourceLanguage {
    pub const ALL: &'static [SourceLanguage] = &[
        SourceLanguage::Python,
        SourceLanguage::Java,
        SourceLanguage::JavaScript,
        SourceLanguage::TypeScript,
        SourceLanguage::Go,
        SourceLanguage::Rust,
    ];

    /// Extension table used by the walker's classification pass (§4.1:
    /// "Language classification is by extension table only").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Some(SourceLanguage::Python),
            "java" => Some(SourceLanguage::Java),
            "js" | "mjs" | "cjs" | "jsx" => Some(SourceLanguage::JavaScript),
            "ts" | "mts" | "cts" | "tsx" => Some(SourceLanguage::TypeScript),
            "go" => Some(SourceLanguage::Go),
            "rs" => Some(SourceLanguage::Rust),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::Python => "Python",
            SourceLanguage::Java => "Java",
            SourceLanguage::JavaScript => "JavaScript",
            SourceLanguage::TypeScript => "TypeScript",
            SourceLanguage::Go => "Go",
            SourceLanguage::Rust => "Rust",
        }
    }
}

/// Extensions the walker recognizes as configuration/text (not parsed for
/// symbols, but still emitted as `File` nodes with no `DEFINES` edges).
const CONFIGURABLE_TEXT_EXTENSIONS: &[&str] = &[
    "toml", "yaml", "yml", "json", "md", "txt", "cfg", "ini", "xml",
];

/// Extensions treated as binary (never read as UTF-8).
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "tar", "gz", "so", "dylib", "dll", "class",
    "jar", "pyc", "o", "a", "exe",
];

/// The walker's classification of a file (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Source(SourceLanguage),
    ConfigurableText,
    Binary,
    Skip,
}

impl FileClass {
    pub fn classify(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileClass::Skip;
        };
        if let Some(lang) = SourceLanguage::from_extension(ext) {
            return FileClass::Source(lang);
        }
        let ext_lower = ext.to_ascii_lowercase();
        if BINARY_EXTENSIONS.contains(&ext_lower.as_str()) {
            return FileClass::Binary;
        }
        if CONFIGURABLE_TEXT_EXTENSIONS.contains(&ext_lower.as_str()) {
            return FileClass::ConfigurableText;
        }
        FileClass::Skip
    }

    pub fn is_source(&self) -> bool {
        matches!(self, FileClass::Source(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(
            FileClass::classify(&PathBuf::from("a.py")),
            FileClass::Source(SourceLanguage::Python)
        );
        assert_eq!(FileClass::classify(&PathBuf::from("a.json")), FileClass::ConfigurableText);
        assert_eq!(FileClass::classify(&PathBuf::from("a.so")), FileClass::Binary);
        assert_eq!(FileClass::classify(&PathBuf::from("a.xyz")), FileClass::Skip);
        assert_eq!(FileClass::classify(&PathBuf::from("no_extension")), FileClass::Skip);
    }
}
