//! Python language support.

use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct Python;

const PRIMITIVES: &[&str] = &["int", "float", "str", "bool", "bytes", "None", "complex"];
const STDLIB_WRAPPERS: &[&str] = &[
    "list", "dict", "set", "tuple", "frozenset", "Decimal", "Path", "datetime", "defaultdict",
    "OrderedDict", "deque",
];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

impl LanguageSupport for Python {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::Python
    }
    fn grammar_name(&self) -> &'static str {
        "python"
    }
    fn has_inheritance(&self) -> bool {
        true
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["class_definition"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        // Python has no interface keyword; Protocol/ABC classes are just classes.
        &[]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_definition"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["class_definition"]
    }
    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_statement", "import_from_statement"]
    }
    fn call_kinds(&self) -> &'static [&'static str] {
        &["call"]
    }
    fn field_access_kinds(&self) -> &'static [&'static str] {
        &["attribute"]
    }
    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier"]
    }
    fn self_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn super_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn self_param_names(&self) -> &'static [&'static str] {
        &["self", "cls"]
    }
    fn local_decl_kinds(&self) -> &'static [&'static str] {
        &["assignment"]
    }
    fn assignment_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn enhanced_for_kinds(&self) -> &'static [&'static str] {
        &["for_statement"]
    }
    fn field_decl_kinds(&self) -> &'static [&'static str] {
        &["assignment"]
    }

    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| text(&n, src))
    }

    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String> {
        let body = node.child_by_field_name("body")?;
        let mut cursor = body.walk();
        let first_stmt = body.children(&mut cursor).next()?;
        if first_stmt.kind() != "expression_statement" {
            return None;
        }
        let mut inner = first_stmt.walk();
        let string_node = first_stmt.children(&mut inner).next()?;
        if string_node.kind() != "string" {
            return None;
        }
        let raw = text(&string_node, src);
        Some(raw.trim_matches(['"', '\'']).trim().to_string())
    }

    fn extract_decorators(&self, node: &Node, src: &str) -> Vec<String> {
        let mut decorators = Vec::new();
        let Some(parent) = node.parent() else { return decorators };
        if parent.kind() != "decorated_definition" {
            return decorators;
        }
        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            if child.kind() == "decorator" {
                decorators.push(text(&child, src).to_string());
            }
        }
        decorators
    }

    fn is_exported(&self, _node: &Node, _src: &str) -> bool {
        // Python has no export keyword; visibility follows naming convention.
        true
    }

    fn visibility(&self, node: &Node, src: &str) -> Visibility {
        match self.node_name(node, src) {
            Some(name) if name.starts_with("__") && !name.ends_with("__") => Visibility::Private,
            Some(name) if name.starts_with('_') => Visibility::Protected,
            _ => Visibility::Public,
        }
    }

    fn container_body<'a>(&self, node: &'a Node<'a>) -> Option<Node<'a>> {
        node.child_by_field_name("body")
    }

    fn parameters<'a>(&self, func_node: &Node<'a>, src: &'a str) -> Vec<ParamDecl> {
        let Some(params) = func_node.child_by_field_name("parameters") else { return Vec::new() };
        let mut cursor = params.walk();
        let mut out = Vec::new();
        for child in params.children(&mut cursor) {
            match child.kind() {
                "identifier" => out.push(ParamDecl { name: text(&child, src).to_string(), declared_type: None }),
                "typed_parameter" => {
                    let name = child
                        .named_child(0)
                        .map(|n| text(&n, src).to_string())
                        .unwrap_or_default();
                    let ty = child.child_by_field_name("type").map(|n| text(&n, src).to_string());
                    out.push(ParamDecl { name, declared_type: ty });
                }
                "default_parameter" => {
                    if let Some(name_node) = child.child_by_field_name("name") {
                        out.push(ParamDecl { name: text(&name_node, src).to_string(), declared_type: None });
                    }
                }
                "typed_default_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| text(&n, src).to_string())
                        .unwrap_or_default();
                    let ty = child.child_by_field_name("type").map(|n| text(&n, src).to_string());
                    out.push(ParamDecl { name, declared_type: ty });
                }
                _ => {}
            }
        }
        out
    }

    fn extract_superclasses(&self, node: &Node, src: &str) -> Vec<String> {
        let Some(bases) = node.child_by_field_name("superclasses") else { return Vec::new() };
        let mut cursor = bases.walk();
        bases
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "keyword_argument")
            .map(|c| text(&c, src).to_string())
            .collect()
    }

    fn extract_interfaces(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        let mut out = Vec::new();
        let line = node.start_position().row + 1;
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "dotted_name" => out.push(Import {
                            module: text(&child, src).to_string(),
                            names: Vec::new(),
                            alias: None,
                            is_wildcard: false,
                            is_relative: false,
                            line,
                        }),
                        "aliased_import" => {
                            let name = child.child_by_field_name("name").map(|n| text(&n, src).to_string()).unwrap_or_default();
                            let alias = child.child_by_field_name("alias").map(|n| text(&n, src).to_string());
                            out.push(Import { module: name, names: Vec::new(), alias, is_wildcard: false, is_relative: false, line });
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let module_node = node.child_by_field_name("module_name");
                let module = module_node.map(|n| text(&n, src).to_string()).unwrap_or_default();
                let is_relative = module.starts_with('.');
                let mut names = Vec::new();
                let mut wildcard = false;
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    match child.kind() {
                        "wildcard_import" => wildcard = true,
                        "dotted_name" if Some(child) != module_node => {
                            names.push(text(&child, src).to_string());
                        }
                        "aliased_import" => {
                            let name = child.child_by_field_name("name").map(|n| text(&n, src).to_string()).unwrap_or_default();
                            names.push(name);
                        }
                        _ => {}
                    }
                }
                if wildcard {
                    out.push(Import { module, names: Vec::new(), alias: None, is_wildcard: true, is_relative, line });
                } else {
                    for name in names {
                        out.push(Import { module: module.clone(), names: vec![name], alias: None, is_wildcard: false, is_relative, line });
                    }
                }
            }
            _ => {}
        }
        out
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        let func = node.child_by_field_name("function")?;
        let line = node.start_position().row + 1;
        match func.kind() {
            "attribute" => {
                let object = func.child_by_field_name("object")?;
                let attr = func.child_by_field_name("attribute")?;
                Some(CallSite { receiver: Some(object), method_name: text(&attr, src).to_string(), line })
            }
            "identifier" => Some(CallSite { receiver: None, method_name: text(&func, src).to_string(), line }),
            _ => None,
        }
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        let object = node.child_by_field_name("object")?;
        let attr = node.child_by_field_name("attribute")?;
        Some((object, text(&attr, src)))
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        let left = node.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let name = text(&left, src).to_string();
        if name == "self" {
            return None;
        }
        let declared_type = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let initializer = node.child_by_field_name("right");
        Some(LocalDecl { name, declared_type, initializer })
    }

    fn extract_assignment<'a>(&self, _node: &Node<'a>, _src: &'a str) -> Option<(&'a str, Node<'a>)> {
        None
    }

    fn extract_enhanced_for<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(String, Option<String>, Option<Node<'a>>)> {
        let left = node.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let iterable = node.child_by_field_name("right");
        Some((text(&left, src).to_string(), None, iterable))
    }

    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl> {
        let left = node.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let declared_type = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        Some(FieldDecl { name: text(&left, src).to_string(), declared_type })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        match init.kind() {
            "call" => {
                let func = init.child_by_field_name("function")?;
                if func.kind() == "identifier" {
                    let name = text(&func, src);
                    if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                        return Some(name.to_string());
                    }
                }
                None
            }
            "string" => Some("str".to_string()),
            "integer" => Some("int".to_string()),
            "float" => Some("float".to_string()),
            "true" | "false" => Some("bool".to_string()),
            "list" => Some("list".to_string()),
            "dictionary" => Some("dict".to_string()),
            "set" => Some("set".to_string()),
            "tuple" => Some("tuple".to_string()),
            _ => None,
        }
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("builtins.{name}"))
    }

    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        if let Some(idx) = name.find('[') {
            (&name[..idx], &name[idx..])
        } else {
            (name, "")
        }
    }

    fn is_already_qualified(&self, name: &str) -> bool {
        name.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_generic_brackets() {
        let (base, suffix) = Python.strip_type_decorations("List[int]");
        assert_eq!(base, "List");
        assert_eq!(suffix, "[int]");
    }

    #[test]
    fn dunder_methods_are_private() {
        assert!(Python.resolve_stdlib_wrapper("list").is_some());
        assert!(Python.resolve_stdlib_wrapper("Foo").is_none());
    }
}
