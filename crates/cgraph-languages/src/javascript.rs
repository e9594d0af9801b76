//! JavaScript language support.

use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct JavaScript;

const PRIMITIVES: &[&str] = &["number", "string", "boolean", "undefined", "null", "bigint", "symbol"];
const STDLIB_WRAPPERS: &[&str] = &["Array", "Map", "Set", "Promise", "Object", "Date", "RegExp", "Error"];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

pub(crate) fn leading_decorators(node: &Node, src: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        if s.kind() == "decorator" {
            out.push(text(&s, src).to_string());
            sib = s.prev_sibling();
        } else {
            break;
        }
    }
    out.reverse();
    out
}

pub(crate) fn leading_jsdoc(node: &Node, src: &str) -> Option<String> {
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        match s.kind() {
            "decorator" => {
                sib = s.prev_sibling();
                continue;
            }
            "comment" => {
                let raw = text(&s, src);
                return raw.starts_with("/**").then(|| raw.trim_start_matches("/**").trim_end_matches("*/").trim().to_string());
            }
            _ => return None,
        }
    }
    None
}

pub(crate) fn js_superclass(node: &Node, src: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(heritage) = node.children(&mut cursor).find(|c| c.kind() == "class_heritage") else {
        return Vec::new();
    };
    heritage
        .named_child(0)
        .map(|n| vec![text(&n, src).to_string()])
        .unwrap_or_default()
}

impl LanguageSupport for JavaScript {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::JavaScript
    }
    fn grammar_name(&self) -> &'static str {
        "javascript"
    }
    fn has_inheritance(&self) -> bool {
        true
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["class_declaration", "class"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "method_definition", "generator_function_declaration"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["class_declaration", "class"]
    }
    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_statement"]
    }
    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression", "new_expression"]
    }
    fn field_access_kinds(&self) -> &'static [&'static str] {
        &["member_expression"]
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
        &["variable_declarator"]
    }
    fn assignment_kinds(&self) -> &'static [&'static str] {
        &["assignment_expression"]
    }
    fn enhanced_for_kinds(&self) -> &'static [&'static str] {
        &["for_in_statement"]
    }
    fn field_decl_kinds(&self) -> &'static [&'static str] {
        &["field_definition", "public_field_definition"]
    }

    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| text(&n, src))
    }

    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String> {
        leading_jsdoc(node, src)
    }

    fn extract_decorators(&self, node: &Node, src: &str) -> Vec<String> {
        leading_decorators(node, src)
    }

    fn is_exported(&self, node: &Node, _src: &str) -> bool {
        node.parent().is_some_and(|p| p.kind() == "export_statement")
    }

    fn visibility(&self, node: &Node, src: &str) -> Visibility {
        match self.node_name(node, src) {
            Some(name) if name.starts_with('#') => Visibility::Private,
            _ => Visibility::Public,
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
            .filter_map(|p| match p.kind() {
                "identifier" => Some(ParamDecl { name: text(&p, src).to_string(), declared_type: None }),
                "assignment_pattern" => {
                    let left = p.child_by_field_name("left")?;
                    (left.kind() == "identifier")
                        .then(|| ParamDecl { name: text(&left, src).to_string(), declared_type: None })
                }
                "rest_pattern" => p.named_child(0).map(|n| ParamDecl { name: text(&n, src).to_string(), declared_type: None }),
                _ => None,
            })
            .collect()
    }

    fn extract_superclasses(&self, node: &Node, src: &str) -> Vec<String> {
        js_superclass(node, src)
    }

    fn extract_interfaces(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        let line = node.start_position().row + 1;
        let Some(source) = node.child_by_field_name("source") else { return Vec::new() };
        let module = text(&source, src).trim_matches(['"', '\'']).to_string();
        let is_relative = module.starts_with('.');
        let Some(clause) = node.child_by_field_name("clause") else {
            return vec![Import { module, names: Vec::new(), alias: None, is_wildcard: false, is_relative, line }];
        };
        let mut out = Vec::new();
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => out.push(Import {
                    module: module.clone(),
                    names: vec!["default".to_string()],
                    alias: Some(text(&child, src).to_string()),
                    is_wildcard: false,
                    is_relative,
                    line,
                }),
                "namespace_import" => out.push(Import {
                    module: module.clone(),
                    names: Vec::new(),
                    alias: child.named_child(0).map(|n| text(&n, src).to_string()),
                    is_wildcard: true,
                    is_relative,
                    line,
                }),
                "named_imports" => {
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let name = spec.child_by_field_name("name").map(|n| text(&n, src).to_string()).unwrap_or_default();
                        let alias = spec.child_by_field_name("alias").map(|n| text(&n, src).to_string());
                        out.push(Import { module: module.clone(), names: vec![name], alias, is_wildcard: false, is_relative, line });
                    }
                }
                _ => {}
            }
        }
        if out.is_empty() {
            out.push(Import { module, names: Vec::new(), alias: None, is_wildcard: false, is_relative, line });
        }
        out
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        let line = node.start_position().row + 1;
        let func = node.child_by_field_name("function").or_else(|| node.child_by_field_name("constructor"))?;
        match func.kind() {
            "member_expression" => {
                let object = func.child_by_field_name("object")?;
                let property = func.child_by_field_name("property")?;
                Some(CallSite { receiver: Some(object), method_name: text(&property, src).to_string(), line })
            }
            "identifier" => Some(CallSite { receiver: None, method_name: text(&func, src).to_string(), line }),
            _ => None,
        }
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        let object = node.child_by_field_name("object")?;
        let property = node.child_by_field_name("property")?;
        if property.kind() != "property_identifier" && property.kind() != "private_property_identifier" {
            return None;
        }
        Some((object, text(&property, src)))
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.kind() != "identifier" {
            return None;
        }
        let initializer = node.child_by_field_name("value");
        Some(LocalDecl { name: text(&name_node, src).to_string(), declared_type: None, initializer })
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
        let left = node.child_by_field_name("left")?;
        let name_node = if left.kind() == "identifier" { left } else { left.named_child(0)? };
        let iterable = node.child_by_field_name("right");
        Some((text(&name_node, src).to_string(), None, iterable))
    }

    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl> {
        let prop = node.child_by_field_name("property")?;
        Some(FieldDecl { name: text(&prop, src).to_string(), declared_type: None })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        match init.kind() {
            "new_expression" => init.child_by_field_name("constructor").map(|n| text(&n, src).to_string()),
            "string" | "template_string" => Some("string".to_string()),
            "number" => Some("number".to_string()),
            "true" | "false" => Some("boolean".to_string()),
            "array" => Some("Array".to_string()),
            "object" => Some("Object".to_string()),
            _ => None,
        }
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("globalThis.{name}"))
    }

    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        (name, "")
    }

    fn is_already_qualified(&self, name: &str) -> bool {
        name.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_array_wrapper() {
        assert!(JavaScript.resolve_stdlib_wrapper("Array").is_some());
    }
}
