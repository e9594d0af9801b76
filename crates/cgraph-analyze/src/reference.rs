//! The reference pass (spec §4.7): resolves call expressions to `CALLS`
//! edges via the type-inference engine, and emits `OVERRIDES` edges for
//! methods that shadow an ancestor's method of the same name. The only
//! pass run with `rayon` (spec §5): the registry is frozen and read-only
//! by the time this runs, so each function/method can be resolved
//! independently.

use cgraph_core::{EdgeKind, NodeKind, NodeRef, PipelineConfig, Sink};
use cgraph_languages::{support_for_language, FieldDecl, LanguageSupport};
use cgraph_parse::ParserPool;
use cgraph_registry::SymbolRegistry;
use rayon::prelude::*;
use std::collections::HashMap;
use tree_sitter::Node;

use crate::imports::ImportIndex;
use crate::run_summary::RunSummary;
use crate::structural::{ClassRecord, FunctionRecord};
use crate::type_infer::{Scope, TypeResolver};

fn current_package(module_qn: &str) -> &str {
    module_qn.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or(module_qn)
}

/// Per-class field-type map, built once up front (spec §4.5 step 4) so the
/// parallel sweep over functions never needs to re-walk a class body.
fn collect_class_fields(
    classes: &[ClassRecord],
    pool: &ParserPool,
    resolver: &TypeResolver,
) -> HashMap<String, HashMap<String, String>> {
    let mut out = HashMap::new();
    for class in classes {
        let Some(parsed) = pool.ast_for(&class.file_path) else { continue };
        let adapter = support_for_language(class.language);
        let Some(node) = parsed.root_node().descendant_for_byte_range(class.byte_range.0, class.byte_range.1) else {
            continue;
        };
        let Some(body) = adapter.container_body(&node) else { continue };
        let mut fields = HashMap::new();
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if !adapter.field_decl_kinds().contains(&child.kind()) {
                continue;
            }
            if let Some(FieldDecl { name, declared_type: Some(ty) }) = adapter.extract_field_decl(&child, &parsed.source) {
                if let Some(qn) = resolver.resolve_type_name(adapter, &class.module_qn, &ty, 0) {
                    fields.insert(name, qn);
                }
            }
        }
        out.insert(class.qn.clone(), fields);
    }
    out
}

/// Resolve a bare (receiver-less) call to a function/method QN: an import
/// alias, then a same-package function, then a registry-wide simple-name
/// fallback.
fn resolve_bare_call(module_qn: &str, name: &str, registry: &SymbolRegistry, imports: &ImportIndex, config: &PipelineConfig) -> Option<String> {
    if let Some(qn) = imports.resolve(module_qn, name, registry) {
        return Some(qn);
    }
    let same_package = format!("{}.{name}", current_package(module_qn));
    if registry.contains(&same_package) {
        return Some(same_package);
    }
    let candidates = registry.simple_name_lookup(name);
    match candidates.len() {
        1 => candidates.into_iter().next(),
        n if n > 1 && config.speculative_edges => candidates.into_iter().next(),
        _ => None,
    }
}

fn walk_calls(
    node: Node,
    adapter: &dyn LanguageSupport,
    src: &str,
    scope: &mut Scope,
    resolver: &TypeResolver,
    module_qn: &str,
    function_qn: &str,
    imports: &ImportIndex,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
) {
    let kind = node.kind();

    // Nested function/class definitions are resolved as their own
    // `FunctionRecord`/`ClassRecord` entries; don't double-walk their body.
    if adapter.function_kinds().contains(&kind) || adapter.class_kinds().contains(&kind) || adapter.interface_kinds().contains(&kind) {
        return;
    }

    if adapter.local_decl_kinds().contains(&kind) {
        if let Some(local) = adapter.extract_local_decl(&node, src) {
            let resolved = local
                .declared_type
                .as_deref()
                .and_then(|t| resolver.resolve_type_name(adapter, module_qn, t, 0))
                .or_else(|| local.initializer.as_ref().and_then(|init| adapter.infer_initializer_hint(init, src)).and_then(|hint| resolver.resolve_type_name(adapter, module_qn, &hint, 0)));
            if let Some(qn) = resolved {
                scope.bind_local(local.name, qn);
            }
        }
    } else if adapter.assignment_kinds().contains(&kind) {
        if let Some((name, rhs)) = adapter.extract_assignment(&node, src) {
            if let Some(hint) = adapter.infer_initializer_hint(&rhs, src) {
                if let Some(qn) = resolver.resolve_type_name(adapter, module_qn, &hint, 0) {
                    scope.bind_local(name.to_string(), qn);
                }
            }
        }
    } else if adapter.enhanced_for_kinds().contains(&kind) {
        if let Some((name, declared_type, _iterable)) = adapter.extract_enhanced_for(&node, src) {
            if let Some(ty) = declared_type {
                if let Some(qn) = resolver.resolve_type_name(adapter, module_qn, &ty, 0) {
                    scope.bind_local(name, qn);
                }
            }
        }
    } else if adapter.call_kinds().contains(&kind) {
        if let Some(call) = adapter.extract_call(&node, src) {
            resolve_call(&call.receiver, &call.method_name, adapter, src, scope, resolver, module_qn, function_qn, imports, registry, config, sink, summary);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, adapter, src, scope, resolver, module_qn, function_qn, imports, registry, config, sink, summary);
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_call(
    receiver: &Option<Node>,
    method_name: &str,
    adapter: &dyn LanguageSupport,
    src: &str,
    scope: &Scope,
    resolver: &TypeResolver,
    module_qn: &str,
    function_qn: &str,
    imports: &ImportIndex,
    registry: &SymbolRegistry,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
) {
    let targets: Vec<String> = match receiver {
        None => resolve_bare_call(module_qn, method_name, registry, imports, config).into_iter().collect(),
        Some(recv) => match resolver.resolve_receiver_class(adapter, recv, src, scope) {
            Some(class_qn) => resolver.lookup_method(&class_qn, method_name).into_iter().collect(),
            None if config.speculative_edges => {
                let mut candidates = registry.simple_name_lookup(method_name);
                candidates.retain(|qn| registry.kind_of(qn) == Some(NodeKind::Method));
                candidates
            }
            None => Vec::new(),
        },
    };

    if targets.is_empty() {
        summary.record_edge_dropped();
        return;
    }

    for target in targets {
        let target_kind = registry.kind_of(&target).unwrap_or(NodeKind::Function);
        if sink
            .upsert_edge(
                NodeRef::new(NodeKind::Function, function_qn.to_string()),
                EdgeKind::Calls,
                NodeRef::new(target_kind, target),
                Default::default(),
            )
            .is_ok()
        {
            summary.record_edge();
        }
    }
}

fn emit_overrides(func: &FunctionRecord, registry: &SymbolRegistry, sink: &dyn Sink, summary: &RunSummary) {
    let Some(class_qn) = &func.enclosing_class_qn else { return };
    let method_name = func.qn.rsplit('.').next().unwrap_or(&func.qn);
    for ancestor in registry.ancestors_bfs(class_qn) {
        let candidate = format!("{ancestor}.{method_name}");
        if registry.contains(&candidate) {
            if sink
                .upsert_edge(
                    NodeRef::new(NodeKind::Method, func.qn.clone()),
                    EdgeKind::Overrides,
                    NodeRef::new(NodeKind::Method, candidate),
                    Default::default(),
                )
                .is_ok()
            {
                summary.record_edge();
            }
            return;
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    classes: &[ClassRecord],
    functions: &[FunctionRecord],
    pool: &ParserPool,
    registry: &SymbolRegistry,
    imports: &ImportIndex,
    config: &PipelineConfig,
    sink: &dyn Sink,
    summary: &RunSummary,
) {
    let resolver = TypeResolver::new(registry, imports, config);
    let class_fields = collect_class_fields(classes, pool, &resolver);
    resolver.set_all_fields(class_fields.clone());

    functions.par_iter().for_each(|func| {
        emit_overrides(func, registry, sink, summary);

        let Some(parsed) = pool.ast_for(&func.file_path) else { return };
        let adapter = support_for_language(func.language);
        let Some(node) = parsed.root_node().descendant_for_byte_range(func.byte_range.0, func.byte_range.1) else {
            return;
        };

        let fields = func
            .enclosing_class_qn
            .as_ref()
            .and_then(|c| class_fields.get(c))
            .cloned()
            .unwrap_or_default();
        let mut scope = Scope::for_method(func.enclosing_class_qn.clone(), fields);
        for param in adapter.parameters(&node, &parsed.source) {
            if let Some(ty) = param.declared_type.as_deref().and_then(|t| resolver.resolve_type_name(adapter, &func.module_qn, t, 0)) {
                scope.bind_local(param.name, ty);
            }
        }

        if let Some(body) = adapter.container_body(&node) {
            walk_calls(body, adapter, &parsed.source, &mut scope, &resolver, &func.module_qn, &func.qn, imports, registry, config, sink, summary);
        } else {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk_calls(child, adapter, &parsed.source, &mut scope, &resolver, &func.module_qn, &func.qn, imports, registry, config, sink, summary);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural;
    use cgraph_walk::walk_repo;
    use std::fs;
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
        fn upsert_node(&self, _node: cgraph_core::NodePayload) -> Result<(), cgraph_core::CgraphError> {
            Ok(())
        }
        fn upsert_edge(
            &self,
            from: NodeRef,
            kind: EdgeKind,
            to: NodeRef,
            _props: std::collections::BTreeMap<String, String>,
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
    fn resolves_self_method_call_within_same_class() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("svc.py"),
            "class Service:\n    def run(self):\n        self.helper()\n    def helper(self):\n        pass\n",
        )
        .unwrap();

        let files = walk_repo(dir.path()).unwrap();
        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();
        let struct_sink = CollectingSink::default();
        let summary = RunSummary::new();
        let struct_out = structural::run("demo", dir.path(), &files, &pool, &registry, &struct_sink, &summary);

        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        registry.freeze();

        let sink = CollectingSink::default();
        run(&struct_out.classes, &struct_out.functions, &pool, &registry, &imports, &config, &sink, &summary);

        let edges = sink.edges.lock().unwrap();
        assert!(edges.iter().any(|(from, kind, to)| from.key == "demo.svc.Service.run"
            && *kind == EdgeKind::Calls
            && to.key == "demo.svc.Service.helper"));
    }

    #[test]
    fn overriding_method_emits_overrides_edge() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("animals.py"),
            "class Animal:\n    def speak(self):\n        pass\n\nclass Dog(Animal):\n    def speak(self):\n        pass\n",
        )
        .unwrap();

        let files = walk_repo(dir.path()).unwrap();
        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();
        let struct_sink = CollectingSink::default();
        let summary = RunSummary::new();
        let struct_out = structural::run("demo", dir.path(), &files, &pool, &registry, &struct_sink, &summary);

        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        crate::inheritance::run(&struct_out.classes, &struct_out.rust_impls, &imports, &registry, &config, &struct_sink, &summary);
        registry.freeze();

        let sink = CollectingSink::default();
        run(&struct_out.classes, &struct_out.functions, &pool, &registry, &imports, &config, &sink, &summary);

        let edges = sink.edges.lock().unwrap();
        assert!(edges.iter().any(|(from, kind, to)| from.key == "demo.animals.Dog.speak"
            && *kind == EdgeKind::Overrides
            && to.key == "demo.animals.Animal.speak"));
    }
}
