//! The import pass (spec §4.4): builds, per module, a map from the local
//! name an import binds to the fully-qualified name it resolves to (a
//! project module/class/function, or a synthetic `ExternalPackage` stub
//! when the target isn't part of this repository). Wildcard imports are
//! recorded separately and resolved lazily, since the names they bring into
//! scope depend on what the target module ends up defining.

use cgraph_core::{EdgeKind, NodeKind, NodePayload, NodeRef, PipelineConfig, Sink};
use cgraph_languages::{support_for_language, Import, LanguageSupport};
use cgraph_parse::ParserPool;
use cgraph_registry::SymbolRegistry;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

use crate::run_summary::RunSummary;
use crate::structural::ModuleRecord;

#[derive(Debug, Clone, Default)]
pub struct ModuleImports {
    /// Local name -> resolved absolute QN (module, class, function, or an
    /// `ExternalPackage` name for anything outside the repository).
    pub aliases: HashMap<String, String>,
    /// Module QNs reachable from this module via a wildcard import, tried
    /// in declaration order when a plain alias lookup misses.
    pub wildcard_modules: Vec<String>,
}

#[derive(Default)]
pub struct ImportIndex {
    by_module: HashMap<String, ModuleImports>,
}

impl ImportIndex {
    /// Resolve `name` as used inside `module_qn`: first the module's own
    /// import aliases, then each wildcard-imported module's exports, in
    /// import order (spec §9: "wildcard imports are resolved against the
    /// registry once all modules are known").
    pub fn resolve(&self, module_qn: &str, name: &str, registry: &SymbolRegistry) -> Option<String> {
        let map = self.by_module.get(module_qn)?;
        if let Some(qn) = map.aliases.get(name) {
            return Some(qn.clone());
        }
        for wildcard in &map.wildcard_modules {
            let candidate = format!("{wildcard}.{name}");
            if registry.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn module_imports(&self, module_qn: &str) -> Option<&ModuleImports> {
        self.by_module.get(module_qn)
    }
}

/// Strip path separators/relative markers and rejoin with `.`, so Go's
/// `"pkg/sub"` and JS's `"./sub/mod"` land in the same dotted shape Python
/// and Java already use.
fn normalize_path(raw: &str) -> String {
    raw.trim_start_matches("./")
        .trim_start_matches("../")
        .trim_matches('"')
        .replace(['/', ':'], ".")
        .split('.')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn current_package(module_qn: &str) -> &str {
    module_qn.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or(module_qn)
}

/// Resolve an import's module path against the registry: a hit under the
/// project namespace is a module/package; otherwise it's treated as
/// external and a stub `ExternalPackage` node is emitted the first time
/// it's seen.
fn resolve_module_target(
    raw: &str,
    is_relative: bool,
    project_name: &str,
    module_qn: &str,
    registry: &SymbolRegistry,
    sink: &dyn Sink,
    summary: &RunSummary,
    seen_externals: &mut HashSet<String>,
) -> String {
    let normalized = normalize_path(raw);
    let candidate = if is_relative {
        format!("{}.{normalized}", current_package(module_qn))
    } else {
        format!("{project_name}.{normalized}")
    };
    if registry.contains(&candidate) {
        return candidate;
    }
    if seen_externals.insert(normalized.clone()) {
        if sink.upsert_node(NodePayload::ExternalPackage { name: normalized.clone() }).is_ok() {
            summary.record_node();
        }
    }
    normalized
}

/// Recursively collect every import-statement node in `node`'s subtree,
/// without descending into a matched import node (its subtree is already
/// fully consumed by `extract_imports`).
fn collect_import_nodes<'a>(node: Node<'a>, import_kinds: &[&str], out: &mut Vec<Node<'a>>) {
    if import_kinds.contains(&node.kind()) {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_import_nodes(child, import_kinds, out);
    }
}

pub fn run(
    project_name: &str,
    modules: &[ModuleRecord],
    pool: &ParserPool,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
) -> ImportIndex {
    let mut index = ImportIndex::default();
    let mut seen_externals = HashSet::new();

    for module in modules {
        let Some(parsed) = pool.ast_for(&module.path) else { continue };
        let adapter = support_for_language(module.language);
        let mut import_nodes = Vec::new();
        collect_import_nodes(parsed.root_node(), adapter.import_kinds(), &mut import_nodes);

        let mut mod_imports = ModuleImports::default();
        for node in import_nodes {
            for import in adapter.extract_imports(&node, &parsed.source) {
                bind_import(
                    &import,
                    project_name,
                    &module.qn,
                    registry,
                    config,
                    sink,
                    summary,
                    &mut seen_externals,
                    &mut mod_imports,
                );
            }
        }
        index.by_module.insert(module.qn.clone(), mod_imports);
    }

    index
}

#[allow(clippy::too_many_arguments)]
fn bind_import(
    import: &Import,
    project_name: &str,
    module_qn: &str,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
    seen_externals: &mut HashSet<String>,
    mod_imports: &mut ModuleImports,
) {
    let target = resolve_module_target(
        &import.module,
        import.is_relative,
        project_name,
        module_qn,
        registry,
        sink,
        summary,
        seen_externals,
    );

    emit_import_edge(module_qn, &target, registry, sink, summary);

    if import.is_wildcard {
        if config.resolve_wildcard_imports {
            mod_imports.wildcard_modules.push(target);
        }
        return;
    }

    if import.names.is_empty() {
        let bound = import.alias.clone().unwrap_or_else(|| target.rsplit('.').next().unwrap_or(&target).to_string());
        mod_imports.aliases.insert(bound, target);
        return;
    }

    for name in &import.names {
        let qn = format!("{target}.{name}");
        let bound = if import.names.len() == 1 { import.alias.clone().unwrap_or_else(|| name.clone()) } else { name.clone() };
        mod_imports.aliases.insert(bound, qn);
    }
}

fn emit_import_edge(module_qn: &str, target: &str, registry: &SymbolRegistry, sink: &dyn Sink, summary: &RunSummary) {
    let target_kind = registry.kind_of(target).unwrap_or(NodeKind::ExternalPackage);
    if sink
        .upsert_edge(
            NodeRef::new(NodeKind::Module, module_qn.to_string()),
            EdgeKind::Imports,
            NodeRef::new(target_kind, target.to_string()),
            Default::default(),
        )
        .is_ok()
    {
        summary.record_edge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slash_and_relative_paths() {
        assert_eq!(normalize_path("pkg/sub"), "pkg.sub");
        assert_eq!(normalize_path("./sub/mod"), "sub.mod");
        assert_eq!(normalize_path("\"pkg/sub\""), "pkg.sub");
    }

    #[test]
    fn current_package_strips_last_segment() {
        assert_eq!(current_package("demo.pkg.mod"), "demo.pkg");
        assert_eq!(current_package("demo"), "demo");
    }

    #[test]
    fn resolve_falls_back_to_wildcard_module_export() {
        let registry = SymbolRegistry::new();
        registry.define("demo.other.Helper", NodeKind::Class).unwrap();
        let mut index = ImportIndex::default();
        index.by_module.insert(
            "demo.main".to_string(),
            ModuleImports { aliases: HashMap::new(), wildcard_modules: vec!["demo.other".to_string()] },
        );
        assert_eq!(index.resolve("demo.main", "Helper", &registry), Some("demo.other.Helper".to_string()));
        assert_eq!(index.resolve("demo.main", "Missing", &registry), None);
    }
}
