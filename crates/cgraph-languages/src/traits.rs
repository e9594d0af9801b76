//! The language-processor interface (spec §6.4): AST-node-type constants,
//! field-name constants, and extraction functions that the structural,
//! import, inheritance, and reference passes consume through a single
//! `dyn LanguageSupport` dispatch (spec §9: "a single match on the
//! language tag... allows adding a language by writing a record").

use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

/// An import statement, in the shape every adapter's `extract_imports`
/// returns (spec §4.4). One AST import node may yield several of these
/// (e.g. Python `from x import a, b`).
#[derive(Debug, Clone)]
pub struct Import {
    /// The module path as written in source (dotted or slash form,
    /// language-specific; resolved against the registry/import map by
    /// `cgraph-analyze::imports`).
    pub module: String,
    /// Specific names imported from `module`. Empty means "import module
    /// itself" (binds `module`'s last segment, or `alias` if present).
    pub names: Vec<String>,
    pub alias: Option<String>,
    pub is_wildcard: bool,
    pub is_relative: bool,
    pub line: usize,
}

/// A call expression decomposed into receiver + method name (spec §4.5.2).
pub struct CallSite<'tree> {
    /// `None` for a bare call (`g()`); `Some` for `a.b()`, `this.b()`, etc.
    pub receiver: Option<Node<'tree>>,
    pub method_name: String,
    pub line: usize,
}

/// A parameter declaration (name + optional type annotation text).
pub struct ParamDecl {
    pub name: String,
    pub declared_type: Option<String>,
}

/// A local variable/constant declaration within a scope (spec §4.5 steps 2-3).
pub struct LocalDecl<'tree> {
    pub name: String,
    pub declared_type: Option<String>,
    pub initializer: Option<Node<'tree>>,
}

/// A class/interface field declaration (spec §4.5 step 4).
pub struct FieldDecl {
    pub name: String,
    pub declared_type: Option<String>,
}

/// Unified language support trait. One adapter module implements this per
/// supported language; the analyzer dispatches through `&dyn LanguageSupport`
/// and never special-cases a language by name outside `cgraph-languages`.
pub trait LanguageSupport: Send + Sync {
    fn id(&self) -> SourceLanguage;
    fn grammar_name(&self) -> &'static str;

    /// Whether this language has OO constructs (inheritance/interfaces).
    /// Languages without them (e.g. Go) skip the inheritance pass for
    /// their files entirely (spec §6.4: "languages without OO constructs
    /// may omit inheritance/interface hooks").
    fn has_inheritance(&self) -> bool;

    // === Node kind constants (spec §6.4a) ===
    fn class_kinds(&self) -> &'static [&'static str];
    fn interface_kinds(&self) -> &'static [&'static str];
    fn enum_kinds(&self) -> &'static [&'static str];
    fn function_kinds(&self) -> &'static [&'static str];
    /// Container bodies that hold methods (class/interface/impl block body).
    fn container_kinds(&self) -> &'static [&'static str];
    fn import_kinds(&self) -> &'static [&'static str];
    fn call_kinds(&self) -> &'static [&'static str];
    fn field_access_kinds(&self) -> &'static [&'static str];
    fn identifier_kinds(&self) -> &'static [&'static str];
    fn self_kinds(&self) -> &'static [&'static str];
    fn super_kinds(&self) -> &'static [&'static str];
    /// Identifier *text* that denotes the enclosing-class receiver for
    /// languages where `self` isn't its own grammar node kind (Python's
    /// `self`/`cls` are plain `identifier` nodes, unlike Rust/JS's
    /// dedicated `self_kinds`). Checked only when `self_kinds`/`super_kinds`
    /// don't already match the node's kind. Empty by default.
    fn self_param_names(&self) -> &'static [&'static str] {
        &[]
    }
    fn local_decl_kinds(&self) -> &'static [&'static str];
    fn assignment_kinds(&self) -> &'static [&'static str];
    fn enhanced_for_kinds(&self) -> &'static [&'static str];
    fn field_decl_kinds(&self) -> &'static [&'static str];

    // === Structural extraction ===
    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str>;
    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String>;
    fn extract_decorators(&self, node: &Node, src: &str) -> Vec<String>;
    fn is_exported(&self, node: &Node, src: &str) -> bool;
    fn visibility(&self, node: &Node, src: &str) -> Visibility;
    fn container_body<'a>(&self, node: &'a Node<'a>) -> Option<Node<'a>>;
    fn parameters<'a>(&self, func_node: &Node<'a>, src: &'a str) -> Vec<ParamDecl>;

    // === Inheritance (spec §4.6 / §4.5.2) ===
    /// Textual superclass names in declaration order (first = primary
    /// superclass for single-inheritance languages).
    fn extract_superclasses(&self, node: &Node, src: &str) -> Vec<String>;
    /// Textual implemented-interface names, empty for languages that fold
    /// everything into `extract_superclasses` (e.g. Python).
    fn extract_interfaces(&self, node: &Node, src: &str) -> Vec<String>;

    // === Import extraction (spec §4.4) ===
    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import>;

    // === Reference pass / type inference (spec §4.5) ===
    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>>;
    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)>;
    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>>;
    fn extract_assignment<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(&'a str, Node<'a>)>;
    fn extract_enhanced_for<'a>(
        &self,
        node: &Node<'a>,
        src: &'a str,
    ) -> Option<(String, Option<String>, Option<Node<'a>>)>;
    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl>;
    /// Textual type name for a constructor-call-shaped initializer
    /// (`ClassName(...)`, `new ClassName(...)`), or a literal's builtin
    /// type name. `None` means "no syntactic hint available".
    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String>;

    // === Type-name resolution (spec §4.5.1) ===
    fn primitive_types(&self) -> &'static [&'static str];
    /// Resolve a stdlib wrapper type (e.g. Java `List` -> `java.util.List`)
    /// to its canonical namespaced form; `None` if `name` isn't a known
    /// wrapper.
    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String>;
    /// Strip array/generic suffixes, returning (base name, suffix to
    /// reattach after resolving the base).
    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str);
    /// Whether `name` already contains this language's package separator
    /// (spec §4.5.1 step 1: "If the name contains a package separator,
    /// return it unchanged").
    fn is_already_qualified(&self, name: &str) -> bool;
}
