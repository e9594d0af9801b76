//! TypeScript language support. Extends the JavaScript grammar with
//! interfaces, type annotations, and an `implements` clause.

use crate::javascript::{leading_decorators, leading_jsdoc};
use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct TypeScript;

const PRIMITIVES: &[&str] = &[
    "number", "string", "boolean", "undefined", "null", "bigint", "symbol", "void", "any", "unknown", "never",
];
const STDLIB_WRAPPERS: &[&str] = &["Array", "Map", "Set", "Promise", "Record", "Partial", "Readonly", "Pick", "Omit"];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

fn heritage_types<'a>(node: &Node<'a>, clause_kind: &str) -> Option<Node<'a>> {
    let heritage = node.children(&mut node.walk()).find(|c| c.kind() == "class_heritage")?;
    heritage.children(&mut heritage.walk()).find(|c| c.kind() == clause_kind)
}

fn named_type_texts(clause: Option<Node>, src: &str) -> Vec<String> {
    let Some(clause) = clause else { return Vec::new() };
    let mut cursor = clause.walk();
    clause.named_children(&mut cursor).map(|n| text(&n, src).to_string()).collect()
}

impl LanguageSupport for TypeScript {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::TypeScript
    }
    fn grammar_name(&self) -> &'static str {
        "typescript"
    }
    fn has_inheritance(&self) -> bool {
        true
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["class_declaration", "class"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        &["interface_declaration"]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &["enum_declaration"]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "method_definition", "method_signature"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["class_declaration", "class", "interface_declaration"]
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
        &["public_field_definition", "field_definition"]
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
        if let Some(mods) = node.child_by_field_name("modifiers") {
            let mut cursor = mods.walk();
            for m in mods.children(&mut cursor) {
                match text(&m, src) {
                    "private" => return Visibility::Private,
                    "protected" => return Visibility::Protected,
                    "public" => return Visibility::Public,
                    _ => {}
                }
            }
        }
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
                "required_parameter" | "optional_parameter" => {
                    let pattern = p.child_by_field_name("pattern")?;
                    let name = text(&pattern, src).to_string();
                    let ty = p.child_by_field_name("type").map(|t| text(&t, src).to_string());
                    Some(ParamDecl { name, declared_type: ty })
                }
                "rest_pattern" => p.named_child(0).map(|n| ParamDecl { name: text(&n, src).to_string(), declared_type: None }),
                _ => None,
            })
            .collect()
    }

    fn extract_superclasses(&self, node: &Node, src: &str) -> Vec<String> {
        if node.kind() == "interface_declaration" {
            let clause = node.children(&mut node.walk()).find(|c| c.kind() == "extends_type_clause");
            return named_type_texts(clause, src);
        }
        let clause = heritage_types(node, "extends_clause");
        named_type_texts(clause, src)
    }

    fn extract_interfaces(&self, node: &Node, src: &str) -> Vec<String> {
        let clause = heritage_types(node, "implements_clause");
        named_type_texts(clause, src)
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        crate::javascript::JavaScript.extract_imports(node, src)
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        crate::javascript::JavaScript.extract_call(node, src)
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        crate::javascript::JavaScript.extract_field_access(node, src)
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        let name_node = node.child_by_field_name("name")?;
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let initializer = node.child_by_field_name("value");
        Some(LocalDecl { name: text(&name_node, src).to_string(), declared_type: ty, initializer })
    }

    fn extract_assignment<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(&'a str, Node<'a>)> {
        crate::javascript::JavaScript.extract_assignment(node, src)
    }

    fn extract_enhanced_for<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(String, Option<String>, Option<Node<'a>>)> {
        crate::javascript::JavaScript.extract_enhanced_for(node, src)
    }

    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl> {
        let prop = node.child_by_field_name("property")?;
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        Some(FieldDecl { name: text(&prop, src).to_string(), declared_type: ty })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        crate::javascript::JavaScript.infer_initializer_hint(init, src)
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("lib.{name}"))
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
    fn strips_array_suffix() {
        assert_eq!(TypeScript.strip_type_decorations("User[]"), ("User", "[]"));
    }
}
