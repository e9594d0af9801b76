//! `.cgrignore` parsing (spec §6.3): line-oriented, `#` comments, a leading
//! `!` re-includes, and matching is by exact path *segment* — no glob
//! semantics. Grounded on the original's `test_cgrignore.py` fixture set.

use std::collections::HashSet;
use std::path::Path;

/// Directory/file segment names excluded by default, independent of any
/// `.cgrignore` file (spec §4.1: "Default excludes").
const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "target",
    "build",
    "dist",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".vscode",
];

/// Parsed exclude/unignore segment sets, ready to test path components
/// against. Hidden (dot-prefixed) segments are excluded by default unless
/// explicitly re-included.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    exclude: HashSet<String>,
    unignore: HashSet<String>,
}

impl IgnoreRules {
    /// The built-in default excludes, with no `.cgrignore` overlay.
    pub fn defaults() -> Self {
        let mut rules = IgnoreRules::default();
        rules.exclude.extend(DEFAULT_EXCLUDES.iter().map(|s| s.to_string()));
        rules
    }

    /// Parse `.cgrignore` contents and merge them over the defaults.
    pub fn from_str(contents: &str) -> Self {
        let mut rules = Self::defaults();
        rules.merge_str(contents);
        rules
    }

    /// Read `<root>/.cgrignore` if present, merged over the defaults.
    /// A missing file is not an error: absence means "use defaults".
    pub fn load(root: &Path) -> std::io::Result<Self> {
        let path = root.join(".cgrignore");
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Self::from_str(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::defaults()),
            Err(e) => Err(e),
        }
    }

    fn merge_str(&mut self, contents: &str) {
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(pattern) = line.strip_prefix('!') {
                let pattern = pattern.trim();
                if pattern.is_empty() {
                    continue;
                }
                self.unignore.insert(pattern.to_string());
                self.exclude.remove(pattern);
            } else {
                self.exclude.insert(line.to_string());
                self.unignore.remove(line);
            }
        }
    }

    /// Layer extra exclude/unignore patterns on top of rules already
    /// loaded, same precedence as a `.cgrignore` line (last write wins).
    /// Used to apply `PipelineConfig.exclude`/`unignore` on top of the
    /// repo's own `.cgrignore`.
    pub fn extend(&mut self, extra_exclude: &[String], extra_unignore: &[String]) {
        for pattern in extra_exclude {
            self.exclude.insert(pattern.clone());
            self.unignore.remove(pattern);
        }
        for pattern in extra_unignore {
            self.unignore.insert(pattern.clone());
            self.exclude.remove(pattern);
        }
    }

    fn segment_excluded(&self, segment: &str) -> bool {
        if self.unignore.contains(segment) {
            return false;
        }
        if self.exclude.contains(segment) {
            return true;
        }
        segment.starts_with('.') && segment != "." && segment != ".."
    }

    /// Whether `rel` (relative to the repo root) should be excluded: true if
    /// any path component matches an exclude rule and isn't re-included.
    pub fn is_excluded(&self, rel: &Path) -> bool {
        rel.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.segment_excluded(&name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let rules = IgnoreRules::from_str("# comment\n\n  \nvendor\n");
        assert!(rules.is_excluded(Path::new("vendor/lib.rs")));
    }

    #[test]
    fn leading_bang_reincludes() {
        let rules = IgnoreRules::from_str("build\n!build\n");
        assert!(!rules.is_excluded(Path::new("build/out.rs")));
    }

    #[test]
    fn matches_are_exact_segments_not_globs() {
        let rules = IgnoreRules::from_str("test\n");
        assert!(rules.is_excluded(Path::new("test/a.py")));
        assert!(!rules.is_excluded(Path::new("testing/a.py")));
    }

    #[test]
    fn hidden_directories_excluded_by_default() {
        let rules = IgnoreRules::defaults();
        assert!(rules.is_excluded(Path::new(".hidden/file.rs")));
    }

    #[test]
    fn default_excludes_apply_without_cgrignore() {
        let rules = IgnoreRules::defaults();
        assert!(rules.is_excluded(Path::new("node_modules/pkg/index.js")));
        assert!(!rules.is_excluded(Path::new("src/main.rs")));
    }

    #[test]
    fn extend_layers_config_patterns_over_cgrignore() {
        let mut rules = IgnoreRules::from_str("vendor\n");
        rules.extend(&["generated".to_string()], &["vendor".to_string()]);
        assert!(!rules.is_excluded(Path::new("vendor/lib.rs")));
        assert!(rules.is_excluded(Path::new("generated/out.rs")));
    }
}
