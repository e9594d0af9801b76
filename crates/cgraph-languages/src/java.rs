//! Java language support.

use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct Java;

const PRIMITIVES: &[&str] = &[
    "int", "long", "short", "byte", "float", "double", "boolean", "char", "void",
];
const STDLIB_WRAPPERS: &[&str] = &[
    "List", "ArrayList", "LinkedList", "Map", "HashMap", "TreeMap", "Set", "HashSet", "TreeSet",
    "Optional", "String", "Object", "Collection", "Iterable", "Stream",
];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

fn type_names_in(list_node: Option<Node>, src: &str) -> Vec<String> {
    let Some(list_node) = list_node else { return Vec::new() };
    let mut cursor = list_node.walk();
    list_node
        .named_children(&mut cursor)
        .map(|n| text(&n, src).to_string())
        .collect()
}

fn modifiers_text(node: &Node, src: &str) -> Vec<String> {
    let Some(mods) = node.child_by_field_name("modifiers") else { return Vec::new() };
    let mut cursor = mods.walk();
    mods.named_children(&mut cursor).map(|n| text(&n, src).to_string()).collect()
}

impl LanguageSupport for Java {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::Java
    }
    fn grammar_name(&self) -> &'static str {
        "java"
    }
    fn has_inheritance(&self) -> bool {
        true
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["class_declaration"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        &["interface_declaration"]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &["enum_declaration"]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["method_declaration", "constructor_declaration"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["class_declaration", "interface_declaration", "enum_declaration"]
    }
    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_declaration"]
    }
    fn call_kinds(&self) -> &'static [&'static str] {
        &["method_invocation", "object_creation_expression"]
    }
    fn field_access_kinds(&self) -> &'static [&'static str] {
        &["field_access"]
    }
    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier"]
    }
    fn self_kinds(&self) -> &'static [&'static str] {
        &["this"]
    }
    fn super_kinds(&self) -> &'static [&'static str] {
        &["super"]
    }
    fn local_decl_kinds(&self) -> &'static [&'static str] {
        &["local_variable_declaration"]
    }
    fn assignment_kinds(&self) -> &'static [&'static str] {
        &["assignment_expression"]
    }
    fn enhanced_for_kinds(&self) -> &'static [&'static str] {
        &["enhanced_for_statement"]
    }
    fn field_decl_kinds(&self) -> &'static [&'static str] {
        &["field_declaration"]
    }

    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| text(&n, src))
    }

    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String> {
        let mut sib = node.prev_sibling();
        while let Some(s) = sib {
            match s.kind() {
                "line_comment" => {
                    sib = s.prev_sibling();
                    continue;
                }
                "block_comment" => {
                    let raw = text(&s, src);
                    if raw.starts_with("/**") {
                        return Some(raw.trim_start_matches("/**").trim_end_matches("*/").trim().to_string());
                    }
                    return None;
                }
                _ => return None,
            }
        }
        None
    }

    fn extract_decorators(&self, node: &Node, src: &str) -> Vec<String> {
        let Some(mods) = node.child_by_field_name("modifiers") else { return Vec::new() };
        let mut cursor = mods.walk();
        mods.named_children(&mut cursor)
            .filter(|c| c.kind() == "annotation" || c.kind() == "marker_annotation")
            .map(|c| text(&c, src).to_string())
            .collect()
    }

    fn is_exported(&self, node: &Node, src: &str) -> bool {
        modifiers_text(node, src).iter().any(|m| m == "public")
    }

    fn visibility(&self, node: &Node, src: &str) -> Visibility {
        let mods = modifiers_text(node, src);
        if mods.iter().any(|m| m == "public") {
            Visibility::Public
        } else if mods.iter().any(|m| m == "private") {
            Visibility::Private
        } else if mods.iter().any(|m| m == "protected") {
            Visibility::Protected
        } else {
            Visibility::Internal
        }
    }

    fn container_body<'a>(&self, node: &'a Node<'a>) -> Option<Node<'a>> {
        node.child_by_field_name("body")
    }

    fn parameters<'a>(&self, func_node: &Node<'a>, src: &'a str) -> Vec<ParamDecl> {
        let Some(params) = func_node.child_by_field_name("parameters") else { return Vec::new() };
        let mut cursor = params.walk();
        params
            .named_children(&mut cursor)
            .filter_map(|p| {
                if p.kind() != "formal_parameter" && p.kind() != "spread_parameter" {
                    return None;
                }
                let name = p.child_by_field_name("name").map(|n| text(&n, src).to_string())?;
                let ty = p.child_by_field_name("type").map(|n| text(&n, src).to_string());
                Some(ParamDecl { name, declared_type: ty })
            })
            .collect()
    }

    fn extract_superclasses(&self, node: &Node, src: &str) -> Vec<String> {
        node.child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| vec![text(&t, src).to_string()])
            .unwrap_or_default()
    }

    fn extract_interfaces(&self, node: &Node, src: &str) -> Vec<String> {
        let list = node
            .child_by_field_name("interfaces")
            .and_then(|n| n.named_child(0));
        type_names_in(list, src)
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        let is_static = node.children(&mut cursor).any(|c| text(&c, src) == "static");
        let mut cursor = node.walk();
        let path_node = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "scoped_identifier" || c.kind() == "identifier");
        let Some(path_node) = path_node else { return Vec::new() };
        let full = text(&path_node, src).to_string();
        let mut cursor = node.walk();
        let is_wildcard = node.children(&mut cursor).any(|c| c.kind() == "asterisk");
        if is_wildcard {
            vec![Import { module: full, names: Vec::new(), alias: None, is_wildcard: true, is_relative: false, line }]
        } else if let Some((module, name)) = full.rsplit_once('.') {
            vec![Import {
                module: module.to_string(),
                names: vec![name.to_string()],
                alias: None,
                is_wildcard: false,
                is_relative: false,
                line,
            }]
            .into_iter()
            .map(|mut i| {
                if is_static {
                    i.alias = Some(format!("static:{name}"));
                }
                i
            })
            .collect()
        } else {
            vec![Import { module: full, names: Vec::new(), alias: None, is_wildcard: false, is_relative: false, line }]
        }
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        let line = node.start_position().row + 1;
        match node.kind() {
            "method_invocation" => {
                let name = node.child_by_field_name("name")?;
                let receiver = node.child_by_field_name("object");
                Some(CallSite { receiver, method_name: text(&name, src).to_string(), line })
            }
            "object_creation_expression" => {
                let ty = node.child_by_field_name("type")?;
                Some(CallSite { receiver: None, method_name: text(&ty, src).to_string(), line })
            }
            _ => None,
        }
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        let object = node.child_by_field_name("object")?;
        let field = node.child_by_field_name("field")?;
        Some((object, text(&field, src)))
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let mut cursor = node.walk();
        let declarator = node.named_children(&mut cursor).find(|c| c.kind() == "variable_declarator")?;
        let name_node = declarator.child_by_field_name("name")?;
        let initializer = declarator.child_by_field_name("value");
        Some(LocalDecl { name: text(&name_node, src).to_string(), declared_type: ty, initializer })
    }

    fn extract_assignment<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(&'a str, Node<'a>)> {
        let left = node.child_by_field_name("left")?;
        let right = node.child_by_field_name("right")?;
        if left.kind() != "identifier" {
            return None;
        }
        Some((text(&left, src), right))
    }

    fn extract_enhanced_for<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(String, Option<String>, Option<Node<'a>>)> {
        let name = node.child_by_field_name("name")?;
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let iterable = node.child_by_field_name("value");
        Some((text(&name, src).to_string(), ty, iterable))
    }

    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl> {
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let mut cursor = node.walk();
        let declarator = node.named_children(&mut cursor).find(|c| c.kind() == "variable_declarator")?;
        let name_node = declarator.child_by_field_name("name")?;
        Some(FieldDecl { name: text(&name_node, src).to_string(), declared_type: ty })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        match init.kind() {
            "object_creation_expression" => init.child_by_field_name("type").map(|n| text(&n, src).to_string()),
            "string_literal" => Some("String".to_string()),
            "decimal_integer_literal" => Some("int".to_string()),
            "decimal_floating_point_literal" => Some("double".to_string()),
            "true" | "false" => Some("boolean".to_string()),
            _ => None,
        }
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("java.util.{name}"))
    }

    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        if let Some(idx) = name.find('<') {
            (&name[..idx], &name[idx..])
        } else if let Some(stripped) = name.strip_suffix("[]") {
            (stripped, "[]")
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
    fn strips_generics_and_arrays() {
        assert_eq!(Java.strip_type_decorations("List<String>"), ("List", "<String>"));
        assert_eq!(Java.strip_type_decorations("int[]"), ("int", "[]"));
    }

    #[test]
    fn resolves_known_wrapper() {
        assert_eq!(Java.resolve_stdlib_wrapper("List"), Some("java.util.List".to_string()));
    }
}
