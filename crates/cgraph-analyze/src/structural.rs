//! The structural pass (spec §4.6): emits Project/Folder/File and
//! Package/Module nodes plus top-level class/interface/function/method
//! definitions and their `DEFINES`/`DEFINES_METHOD` edges. Also gathers the
//! raw (unresolved) superclass/interface name lists the inheritance pass
//! consumes, and the byte ranges the reference pass re-enters.

use cgraph_core::{EdgeKind, FileClass, NodeKind, NodePayload, NodeRef, Sink, SourceLanguage};
use cgraph_languages::{go_lang, rust_lang, support_for_language, LanguageSupport};
use cgraph_parse::ParserPool;
use cgraph_registry::SymbolRegistry;
use cgraph_walk::FileDescriptor;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tree_sitter::Node;

use crate::run_summary::RunSummary;

#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub qn: String,
    pub path: PathBuf,
    pub language: SourceLanguage,
}

#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub qn: String,
    pub module_qn: String,
    pub is_interface: bool,
    pub raw_supers: Vec<String>,
    pub raw_interfaces: Vec<String>,
    pub file_path: PathBuf,
    pub language: SourceLanguage,
    pub byte_range: (usize, usize),
}

#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub qn: String,
    pub module_qn: String,
    pub enclosing_class_qn: Option<String>,
    pub file_path: PathBuf,
    pub language: SourceLanguage,
    pub byte_range: (usize, usize),
}

/// A Rust `impl` block (spec: "Rust's `impl Trait for Type` is modelled as
/// an IMPLEMENTS edge once the structural pass merges the block's methods
/// into `Type`'s `Class` node"). Tracked separately from `ClassRecord`
/// because the struct/enum declaration and its impl blocks are independent
/// AST sites, possibly in either order.
#[derive(Debug, Clone)]
pub struct ImplRecord {
    pub type_qn: String,
    pub module_qn: String,
    pub trait_name: Option<String>,
}

#[derive(Default)]
pub struct StructuralOutput {
    pub modules: Vec<ModuleRecord>,
    pub classes: Vec<ClassRecord>,
    pub functions: Vec<FunctionRecord>,
    pub rust_impls: Vec<ImplRecord>,
}

struct Emitter<'a> {
    sink: &'a dyn Sink,
    registry: &'a SymbolRegistry,
    summary: &'a RunSummary,
    emitted_folders: HashSet<String>,
    emitted_packages: HashSet<String>,
}

impl<'a> Emitter<'a> {
    fn emit_node(&self, payload: NodePayload) {
        if self.sink.upsert_node(payload).is_ok() {
            self.summary.record_node();
        }
    }

    fn emit_edge(&self, from: NodeRef, kind: EdgeKind, to: NodeRef) {
        if self.sink.upsert_edge(from, kind, to, BTreeMap::new()).is_ok() {
            self.summary.record_edge();
        }
    }

    fn ensure_folder_chain(&mut self, relative_dir: &Path) {
        let mut acc = PathBuf::new();
        let mut parent: Option<String> = None;
        for segment in relative_dir.iter() {
            acc.push(segment);
            let path_str = acc.to_string_lossy().replace('\\', "/");
            if self.emitted_folders.insert(path_str.clone()) {
                self.emit_node(NodePayload::Folder { path: path_str.clone() });
                if let Some(p) = &parent {
                    self.emit_edge(
                        NodeRef::new(NodeKind::Folder, p.clone()),
                        EdgeKind::Contains,
                        NodeRef::new(NodeKind::Folder, path_str.clone()),
                    );
                }
            }
            parent = Some(path_str);
        }
    }

    fn ensure_package_chain(&mut self, project: &str, segments: &[String]) {
        let mut parent_qn = project.to_string();
        let mut acc = project.to_string();
        for (i, segment) in segments.iter().enumerate() {
            acc.push('.');
            acc.push_str(segment);
            if self.emitted_packages.insert(acc.clone()) {
                self.emit_node(NodePayload::Package { qn: acc.clone() });
                let _ = self.registry.define(&acc, NodeKind::Package);
                let from_kind = if i == 0 { NodeKind::Project } else { NodeKind::Package };
                self.emit_edge(
                    NodeRef::new(from_kind, parent_qn.clone()),
                    EdgeKind::ContainsPackage,
                    NodeRef::new(NodeKind::Package, acc.clone()),
                );
            }
            parent_qn = acc.clone();
        }
    }
}

/// Module-path segments for a file: directory components plus the file
/// stem, used to build both the Package chain and the Module QN.
fn module_segments(relative_path: &Path) -> Vec<String> {
    let mut segments: Vec<String> =
        relative_path.parent().into_iter().flat_map(|p| p.iter()).map(|s| s.to_string_lossy().to_string()).collect();
    if let Some(stem) = relative_path.file_stem() {
        segments.push(stem.to_string_lossy().to_string());
    }
    segments
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    project_name: &str,
    root: &Path,
    files: &[FileDescriptor],
    pool: &ParserPool,
    registry: &SymbolRegistry,
    sink: &dyn Sink,
    summary: &RunSummary,
) -> StructuralOutput {
    let mut emitter =
        Emitter { sink, registry, summary, emitted_folders: HashSet::new(), emitted_packages: HashSet::new() };
    emitter.emit_node(NodePayload::Project { name: project_name.to_string() });
    let _ = registry.define(project_name, NodeKind::Package);

    let mut output = StructuralOutput::default();

    for file in files {
        summary.record_file_visited();
        if let Some(parent) = file.relative_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            emitter.ensure_folder_chain(parent);
        }
        let file_path_str = file.relative_path.to_string_lossy().replace('\\', "/");
        emitter.emit_node(NodePayload::File {
            path: file_path_str.clone(),
            language: match &file.class {
                FileClass::Source(lang) => Some(*lang),
                _ => None,
            },
            size: std::fs::metadata(&file.path).map(|m| m.len()).unwrap_or(0),
        });
        if let Some(dir) = file.relative_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let dir_str = dir.to_string_lossy().replace('\\', "/");
            emitter.emit_edge(
                NodeRef::new(NodeKind::Folder, dir_str),
                EdgeKind::Contains,
                NodeRef::new(NodeKind::File, file_path_str.clone()),
            );
        }

        let FileClass::Source(lang) = file.class else { continue };
        let Some(parsed) = pool.parse(&file.path, lang) else { continue };
        summary.record_file_parsed();

        let segments = module_segments(&file.relative_path);
        if segments.is_empty() {
            continue;
        }
        let module_qn = format!("{project_name}.{}", segments.join("."));
        emitter.ensure_package_chain(project_name, &segments[..segments.len().saturating_sub(1)]);
        let package_qn = if segments.len() > 1 {
            format!("{project_name}.{}", segments[..segments.len() - 1].join("."))
        } else {
            project_name.to_string()
        };
        let package_from_kind = if segments.len() > 1 { NodeKind::Package } else { NodeKind::Project };
        emitter.emit_node(NodePayload::Module { qn: module_qn.clone(), path: file_path_str.clone() });
        let _ = registry.define(&module_qn, NodeKind::Module);
        let _ = registry.set_module_file(&module_qn, file.path.clone());
        emitter.emit_edge(
            NodeRef::new(package_from_kind, package_qn),
            EdgeKind::ContainsModule,
            NodeRef::new(NodeKind::Module, module_qn.clone()),
        );

        output.modules.push(ModuleRecord { qn: module_qn.clone(), path: file.path.clone(), language: lang });

        let adapter = support_for_language(lang);
        let mut walker =
            Walker { adapter, src: &parsed.source, lang, module_qn: &module_qn, file_path: &file.path, emitter: &mut emitter, output: &mut output };
        let root_node = parsed.root_node();
        let mut cursor = root_node.walk();
        for child in root_node.children(&mut cursor) {
            walker.visit(child, None);
        }
    }

    output
}

struct Walker<'a, 'b> {
    adapter: &'static dyn LanguageSupport,
    src: &'a str,
    lang: SourceLanguage,
    module_qn: &'a str,
    file_path: &'a Path,
    emitter: &'a mut Emitter<'b>,
    output: &'a mut StructuralOutput,
}

impl<'a, 'b> Walker<'a, 'b> {
    fn visit(&mut self, node: Node, container: Option<&str>) {
        let kind = node.kind();

        if self.adapter.class_kinds().contains(&kind) {
            self.visit_class(node, container, self.adapter.interface_kinds().contains(&kind));
            return;
        }
        if self.adapter.interface_kinds().contains(&kind) {
            self.visit_class(node, container, true);
            return;
        }
        if self.adapter.function_kinds().contains(&kind) {
            self.visit_function(node, container);
            return;
        }
        if self.lang == SourceLanguage::Rust && kind == "impl_item" {
            self.visit_rust_impl(node, container);
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, container);
        }
    }

    fn visit_class(&mut self, node: Node, container: Option<&str>, is_interface: bool) {
        let Some(name) = self.adapter.node_name(&node, self.src) else { return };
        let qn = match container {
            Some(c) => format!("{c}.{name}"),
            None => format!("{}.{name}", self.module_qn),
        };

        let raw_supers = self.adapter.extract_superclasses(&node, self.src);
        let raw_interfaces = self.adapter.extract_interfaces(&node, self.src);

        let label = if is_interface { NodeKind::Interface } else { NodeKind::Class };
        let _ = self.emitter.registry.define(&qn, label);

        if is_interface {
            self.emitter.emit_node(NodePayload::Interface {
                qn: qn.clone(),
                name: name.to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
            });
        } else {
            self.emitter.emit_node(NodePayload::Class {
                qn: qn.clone(),
                name: name.to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                decorators: self.adapter.extract_decorators(&node, self.src),
                docstring: self.adapter.extract_docstring(&node, self.src),
            });
        }

        let from_kind = match container {
            Some(_) => NodeKind::Class,
            None => NodeKind::Module,
        };
        let from_key = container.map(String::from).unwrap_or_else(|| self.module_qn.to_string());
        self.emitter.emit_edge(NodeRef::new(from_kind, from_key), EdgeKind::Defines, NodeRef::new(label, qn.clone()));

        self.output.classes.push(ClassRecord {
            qn: qn.clone(),
            module_qn: self.module_qn.to_string(),
            is_interface,
            raw_supers,
            raw_interfaces,
            file_path: self.file_path.to_path_buf(),
            language: self.lang,
            byte_range: (node.start_byte(), node.end_byte()),
        });

        if let Some(body) = self.adapter.container_body(&node) {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit(child, Some(&qn));
            }
        }
    }

    /// `impl Trait for Type { ... }`: merge the block's methods into
    /// `Type`'s QN rather than treating them as free functions.
    fn visit_rust_impl(&mut self, node: Node, container: Option<&str>) {
        let Some(body) = node.child_by_field_name("body") else { return };
        let Some(type_name) = rust_lang::self_type_name(&node, self.src) else {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.visit(child, container);
            }
            return;
        };
        let qn = match container {
            Some(c) => format!("{c}.{type_name}"),
            None => format!("{}.{type_name}", self.module_qn),
        };
        self.output.rust_impls.push(ImplRecord {
            type_qn: qn.clone(),
            module_qn: self.module_qn.to_string(),
            trait_name: rust_lang::trait_name(&node, self.src),
        });
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            self.visit(child, Some(&qn));
        }
    }

    fn visit_function(&mut self, node: Node, container: Option<&str>) {
        let Some(name) = self.adapter.node_name(&node, self.src) else { return };

        // Go attaches methods to a type via a receiver parameter rather
        // than nesting them in a container body (spec §2 language table).
        let go_owner = (self.lang == SourceLanguage::Go).then(|| go_lang::receiver_type_name(&node, self.src)).flatten();

        let (qn, enclosing_class_qn, is_method) = if let Some(owner) = &go_owner {
            (format!("{}.{owner}.{name}", self.module_qn), Some(format!("{}.{owner}", self.module_qn)), true)
        } else if let Some(c) = container {
            (format!("{c}.{name}"), Some(c.to_string()), true)
        } else {
            (format!("{}.{name}", self.module_qn), None, false)
        };

        let byte_range = (node.start_byte(), node.end_byte());
        self.output.functions.push(FunctionRecord {
            qn: qn.clone(),
            module_qn: self.module_qn.to_string(),
            enclosing_class_qn: enclosing_class_qn.clone(),
            file_path: self.file_path.to_path_buf(),
            language: self.lang,
            byte_range,
        });

        if is_method {
            let _ = self.emitter.registry.define(&qn, NodeKind::Method);
            self.emitter.emit_node(NodePayload::Method {
                qn: qn.clone(),
                name: name.to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                decorators: self.adapter.extract_decorators(&node, self.src),
                docstring: self.adapter.extract_docstring(&node, self.src),
                visibility: self.adapter.visibility(&node, self.src),
            });
            if let Some(owner) = enclosing_class_qn {
                let owner_kind =
                    if self.emitter.registry.kind_of(&owner) == Some(NodeKind::Interface) { NodeKind::Interface } else { NodeKind::Class };
                self.emitter.emit_edge(
                    NodeRef::new(owner_kind, owner),
                    EdgeKind::DefinesMethod,
                    NodeRef::new(NodeKind::Method, qn),
                );
            }
        } else {
            let _ = self.emitter.registry.define(&qn, NodeKind::Function);
            self.emitter.emit_node(NodePayload::Function {
                qn: qn.clone(),
                name: name.to_string(),
                start_line: node.start_position().row + 1,
                end_line: node.end_position().row + 1,
                decorators: self.adapter.extract_decorators(&node, self.src),
                docstring: self.adapter.extract_docstring(&node, self.src),
                is_exported: self.adapter.is_exported(&node, self.src),
            });
            self.emitter.emit_edge(
                NodeRef::new(NodeKind::Module, self.module_qn.to_string()),
                EdgeKind::Defines,
                NodeRef::new(NodeKind::Function, qn),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgraph_walk::walk_repo;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        nodes: Mutex<Vec<NodePayload>>,
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
        fn upsert_node(&self, node: NodePayload) -> Result<(), cgraph_core::CgraphError> {
            self.nodes.lock().unwrap().push(node);
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
    fn emits_module_class_and_method_for_python_fixture() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg/widget.py"),
            "class Widget:\n    def render(self):\n        pass\n",
        )
        .unwrap();

        let files = walk_repo(dir.path()).unwrap();
        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();
        let sink = CollectingSink::default();
        let summary = RunSummary::new();

        let output = run("demo", dir.path(), &files, &pool, &registry, &sink, &summary);

        assert_eq!(output.modules.len(), 1);
        assert_eq!(output.modules[0].qn, "demo.pkg.widget");
        assert_eq!(output.classes.len(), 1);
        assert_eq!(output.classes[0].qn, "demo.pkg.widget.Widget");
        assert_eq!(output.functions.len(), 1);
        assert_eq!(output.functions[0].qn, "demo.pkg.widget.Widget.render");
        assert_eq!(output.functions[0].enclosing_class_qn.as_deref(), Some("demo.pkg.widget.Widget"));

        assert!(registry.contains("demo.pkg.widget.Widget"));
        assert_eq!(registry.kind_of("demo.pkg.widget.Widget.render"), Some(NodeKind::Method));

        let nodes = sink.nodes.lock().unwrap();
        assert!(nodes.iter().any(|n| matches!(n, NodePayload::Module { qn, .. } if qn == "demo.pkg.widget")));
        assert!(nodes.iter().any(|n| matches!(n, NodePayload::Class { qn, .. } if qn == "demo.pkg.widget.Widget")));
    }

    #[test]
    fn go_method_attaches_to_receiver_type_not_as_free_function() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("repo.go"),
            "package demo\n\ntype Repo struct {\n}\n\nfunc (r *Repo) Save() {\n}\n",
        )
        .unwrap();

        let files = walk_repo(dir.path()).unwrap();
        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();
        let sink = CollectingSink::default();
        let summary = RunSummary::new();

        let output = run("demo", dir.path(), &files, &pool, &registry, &sink, &summary);

        assert_eq!(output.functions.len(), 1);
        assert_eq!(output.functions[0].qn, "demo.repo.Repo.Save");
        assert_eq!(output.functions[0].enclosing_class_qn.as_deref(), Some("demo.repo.Repo"));
    }

    #[test]
    fn rust_impl_block_methods_attach_to_struct_qn() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lib.rs"),
            "struct Repo;\n\nimpl Repo {\n    fn save(&self) {}\n}\n",
        )
        .unwrap();

        let files = walk_repo(dir.path()).unwrap();
        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();
        let sink = CollectingSink::default();
        let summary = RunSummary::new();

        let output = run("demo", dir.path(), &files, &pool, &registry, &sink, &summary);

        assert_eq!(output.rust_impls.len(), 1);
        assert_eq!(output.rust_impls[0].type_qn, "demo.lib.Repo");
        assert!(output.rust_impls[0].trait_name.is_none());
        assert_eq!(output.functions[0].qn, "demo.lib.Repo.save");
    }
}
