//! The parser pool (spec §4.2): lazily loads one Tree-sitter grammar per
//! supported language via `arborium`'s grammar store, parses files to ASTs,
//! and caches them by path for the rest of the run. Grounded on the
//! teacher's `moss-core::parsers::Parsers`.

use arborium::GrammarStore;
use cgraph_core::SourceLanguage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::warn;
use tree_sitter::{Parser, Tree};

fn arborium_name(lang: SourceLanguage) -> &'static str {
    match lang {
        SourceLanguage::Python => "python",
        SourceLanguage::Java => "java",
        SourceLanguage::JavaScript => "javascript",
        SourceLanguage::TypeScript => "typescript",
        SourceLanguage::Go => "go",
        SourceLanguage::Rust => "rust",
    }
}

/// A parsed file: the immutable tree plus the source text its byte ranges
/// index into (tree-sitter nodes carry no owned text).
pub struct ParsedFile {
    pub language: SourceLanguage,
    pub tree: Tree,
    pub source: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Lazily-loaded grammars plus an AST cache, shared read-only once the
/// structural pass has populated it (spec §5: "AST cache: write-once per
/// file, then read-only").
pub struct ParserPool {
    store: GrammarStore,
    cache: RwLock<HashMap<PathBuf, Arc<ParsedFile>>>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self { store: GrammarStore::new(), cache: RwLock::new(HashMap::new()) }
    }

    fn parser_for(&self, lang: SourceLanguage) -> Option<Parser> {
        let grammar = self.store.get(arborium_name(lang))?;
        let mut parser = Parser::new();
        parser.set_language(grammar.language()).ok()?;
        Some(parser)
    }

    /// Parse `path` as `lang`, caching the result. A missing grammar or
    /// unreadable file is logged and yields `None` (spec §4.2: "missing
    /// grammars cause the file to be skipped with a warning, never a fatal
    /// error").
    pub fn parse(&self, path: &Path, lang: SourceLanguage) -> Option<Arc<ParsedFile>> {
        if let Some(existing) = self.cache.read().ok()?.get(path) {
            return Some(Arc::clone(existing));
        }

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read source file, skipping");
                return None;
            }
        };

        let Some(mut parser) = self.parser_for(lang) else {
            warn!(language = ?lang, path = %path.display(), "no grammar available for language, skipping file");
            return None;
        };

        let Some(tree) = parser.parse(&source, None) else {
            warn!(path = %path.display(), "tree-sitter failed to produce a tree, skipping file");
            return None;
        };

        let parsed = Arc::new(ParsedFile { language: lang, tree, source });
        self.cache.write().ok()?.insert(path.to_path_buf(), Arc::clone(&parsed));
        Some(parsed)
    }

    /// Look up an already-parsed file without re-parsing. Used by the
    /// type-inference engine to re-enter a module's AST (spec §4.3: "module
    /// file index... used by type inference to re-enter an AST").
    pub fn ast_for(&self, path: &Path) -> Option<Arc<ParsedFile>> {
        self.cache.read().ok()?.get(path).cloned()
    }

    pub fn cached_paths(&self) -> Vec<PathBuf> {
        self.cache.read().map(|c| c.keys().cloned().collect()).unwrap_or_default()
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_and_caches_rust_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fn main() {{}}").unwrap();
        let pool = ParserPool::new();
        let parsed = pool.parse(file.path(), SourceLanguage::Rust);
        assert!(parsed.is_some());
        assert!(pool.ast_for(file.path()).is_some());
    }

    #[test]
    fn repeated_parse_reuses_cache_entry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fn main() {{}}").unwrap();
        let pool = ParserPool::new();
        let first = pool.parse(file.path(), SourceLanguage::Rust).unwrap();
        let second = pool.parse(file.path(), SourceLanguage::Rust).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
