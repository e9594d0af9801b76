//! The inheritance pass: resolves each class's raw superclass/interface
//! name strings (gathered by the structural pass) into qualified names,
//! emits `INHERITS`/`IMPLEMENTS` edges, and feeds the registry's
//! inheritance index the reference pass's `OVERRIDES` resolution and
//! `cgraph-registry::ancestors_bfs` both depend on. Also where Rust's
//! `impl Trait for Type` blocks turn into `IMPLEMENTS` edges, once their
//! target struct/enum QN is known from the structural pass.

use cgraph_core::{EdgeKind, NodeKind, NodePayload, NodeRef, PipelineConfig, Sink};
use cgraph_registry::SymbolRegistry;
use std::collections::HashSet;

use crate::imports::ImportIndex;
use crate::run_summary::RunSummary;
use crate::structural::{ClassRecord, ImplRecord};

fn current_package(module_qn: &str) -> &str {
    module_qn.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or(module_qn)
}

/// Resolve a raw, as-written base-type name to the qualified name(s) it
/// refers to: an import alias, then same-package lookup, then a
/// registry-wide simple-name fallback (ambiguous matches are only kept
/// when `speculative_edges` is enabled, spec §9's first open question),
/// and finally an external-package stub for anything outside the repo.
fn resolve_type_name(
    raw: &str,
    module_qn: &str,
    imports: &ImportIndex,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
    seen_externals: &mut HashSet<String>,
) -> Vec<String> {
    let simple = raw.rsplit(['.', ':']).next().unwrap_or(raw);

    if let Some(qn) = imports.resolve(module_qn, simple, registry) {
        return vec![qn];
    }
    let same_package = format!("{}.{simple}", current_package(module_qn));
    if registry.contains(&same_package) {
        return vec![same_package];
    }
    let candidates = registry.simple_name_lookup(simple);
    match candidates.len() {
        0 => {}
        1 => return candidates,
        _ => {
            return if config.speculative_edges { candidates } else { Vec::new() };
        }
    }

    if seen_externals.insert(raw.to_string()) {
        if sink.upsert_node(NodePayload::ExternalPackage { name: raw.to_string() }).is_ok() {
            summary.record_node();
        }
    }
    vec![raw.to_string()]
}

fn emit_parent_edge(
    class_qn: &str,
    target: &str,
    kind: EdgeKind,
    registry: &SymbolRegistry,
    sink: &dyn Sink,
    summary: &RunSummary,
) {
    let class_kind = registry.kind_of(class_qn).unwrap_or(NodeKind::Class);
    let target_kind = registry.kind_of(target).unwrap_or(NodeKind::ExternalPackage);
    if sink
        .upsert_edge(NodeRef::new(class_kind, class_qn.to_string()), kind, NodeRef::new(target_kind, target.to_string()), Default::default())
        .is_ok()
    {
        summary.record_edge();
    }
    // Only real (non-stub) parents feed the ancestors walk: an external
    // base class has no further ancestry to traverse.
    if registry.contains(target) {
        let _ = registry.add_parent(class_qn, target.to_string());
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    classes: &[ClassRecord],
    rust_impls: &[ImplRecord],
    imports: &ImportIndex,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
) {
    let mut seen_externals = HashSet::new();

    for class in classes {
        for raw in &class.raw_supers {
            for target in
                resolve_type_name(raw, &class.module_qn, imports, registry, config, sink, summary, &mut seen_externals)
            {
                emit_parent_edge(&class.qn, &target, EdgeKind::Inherits, registry, sink, summary);
            }
        }
        for raw in &class.raw_interfaces {
            for target in
                resolve_type_name(raw, &class.module_qn, imports, registry, config, sink, summary, &mut seen_externals)
            {
                emit_parent_edge(&class.qn, &target, EdgeKind::Implements, registry, sink, summary);
            }
        }
    }

    for impl_block in rust_impls {
        let Some(trait_raw) = &impl_block.trait_name else { continue };
        for target in resolve_type_name(
            trait_raw,
            &impl_block.module_qn,
            imports,
            registry,
            config,
            sink,
            summary,
            &mut seen_externals,
        ) {
            emit_parent_edge(&impl_block.type_qn, &target, EdgeKind::Implements, registry, sink, summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgraph_core::PipelineConfig;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        edges: Mutex<Vec<(NodeRef, EdgeKind, NodeRef)>>,
    }

    impl Sink for CollectingSink {
        fn ensure_constraints(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn connect(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn disconnect(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn upsert_node(&self, _node: NodePayload) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn upsert_edge(
            &self,
            from: NodeRef,
            kind: EdgeKind,
            to: NodeRef,
            _props: BTreeMap<String, String>,
        ) -> Result<(), cgraph_core::CgraphError> {
            self.edges.lock().unwrap().push((from, kind, to));
            Ok(())
        }
        fn flush_nodes(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn flush_edges(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn clean(&self) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn list_projects(&self) -> Result<Vec<String>, cgraph_core::CgraphError> {
            Ok(Vec::new())
        }
        fn delete_project(&self, _name: &str) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
    }

    #[test]
    fn resolves_same_package_superclass_and_records_ancestor() {
        let registry = SymbolRegistry::new();
        registry.define("demo.pkg.Animal", cgraph_core::NodeKind::Class).unwrap();
        registry.define("demo.pkg.Dog", cgraph_core::NodeKind::Class).unwrap();
        let classes = vec![ClassRecord {
            qn: "demo.pkg.Dog".to_string(),
            module_qn: "demo.pkg.dog".to_string(),
            is_interface: false,
            raw_supers: vec!["Animal".to_string()],
            raw_interfaces: vec![],
            file_path: std::path::PathBuf::from("dog.py"),
            language: cgraph_core::SourceLanguage::Python,
            byte_range: (0, 0),
        }];
        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        let sink = CollectingSink::default();
        let summary = RunSummary::new();

        run(&classes, &[], &imports, &registry, &config, &sink, &summary);

        assert_eq!(registry.parents_of("demo.pkg.Dog"), vec!["demo.pkg.Animal".to_string()]);
        let edges = sink.edges.lock().unwrap();
        assert!(edges.iter().any(|(from, kind, to)| from.key == "demo.pkg.Dog"
            && *kind == EdgeKind::Inherits
            && to.key == "demo.pkg.Animal"));
    }

    #[test]
    fn unresolvable_superclass_becomes_external_stub() {
        let registry = SymbolRegistry::new();
        registry.define("demo.pkg.Handler", cgraph_core::NodeKind::Class).unwrap();
        let classes = vec![ClassRecord {
            qn: "demo.pkg.Handler".to_string(),
            module_qn: "demo.pkg.handler".to_string(),
            is_interface: false,
            raw_supers: vec!["unittest.TestCase".to_string()],
            raw_interfaces: vec![],
            file_path: std::path::PathBuf::from("handler.py"),
            language: cgraph_core::SourceLanguage::Python,
            byte_range: (0, 0),
        }];
        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        let sink = CollectingSink::default();
        let summary = RunSummary::new();

        run(&classes, &[], &imports, &registry, &config, &sink, &summary);

        assert!(registry.parents_of("demo.pkg.Handler").is_empty());
        let edges = sink.edges.lock().unwrap();
        assert!(edges.iter().any(|(_, kind, to)| *kind == EdgeKind::Inherits && to.key == "unittest.TestCase"));
    }
}
