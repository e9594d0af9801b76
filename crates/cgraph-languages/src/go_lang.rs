//! Go language support. Go has no class inheritance: `type_spec` nodes for
//! both structs and interfaces are folded into the generic `Class` label
//! (spec §2), and methods attach to a type via a receiver parameter rather
//! than nesting inside a container body — the structural pass resolves
//! that attachment by receiver type text rather than AST nesting.

use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct Go;

const PRIMITIVES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32",
    "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64", "complex128", "error",
];
const STDLIB_WRAPPERS: &[&str] = &["Context", "WaitGroup", "Mutex", "RWMutex", "Reader", "Writer"];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

/// The receiver's named type (`func (r *Repo) Save()` -> `Repo`), used by the
/// structural pass to attach this method to its owning type.
pub fn receiver_type_name(func_node: &Node, src: &str) -> Option<String> {
    let receiver = func_node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    let param = receiver.named_children(&mut cursor).next()?;
    let ty = param.child_by_field_name("type")?;
    let raw = text(&ty, src).trim_start_matches('*');
    Some(raw.to_string())
}

impl LanguageSupport for Go {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::Go
    }
    fn grammar_name(&self) -> &'static str {
        "go"
    }
    fn has_inheritance(&self) -> bool {
        false
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["type_spec"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_declaration", "method_declaration"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["type_spec"]
    }
    fn import_kinds(&self) -> &'static [&'static str] {
        &["import_spec"]
    }
    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression"]
    }
    fn field_access_kinds(&self) -> &'static [&'static str] {
        &["selector_expression"]
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
    fn local_decl_kinds(&self) -> &'static [&'static str] {
        &["short_var_declaration", "var_spec"]
    }
    fn assignment_kinds(&self) -> &'static [&'static str] {
        &["assignment_statement"]
    }
    fn enhanced_for_kinds(&self) -> &'static [&'static str] {
        &["range_clause"]
    }
    fn field_decl_kinds(&self) -> &'static [&'static str] {
        &["field_declaration"]
    }

    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| text(&n, src))
    }

    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String> {
        let target = node.parent().filter(|p| p.kind() == "type_declaration").unwrap_or(*node);
        let mut sib = target.prev_sibling();
        let mut lines = Vec::new();
        while let Some(s) = sib {
            if s.kind() != "comment" {
                break;
            }
            lines.push(text(&s, src).trim_start_matches("//").trim().to_string());
            sib = s.prev_sibling();
        }
        lines.reverse();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn extract_decorators(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn is_exported(&self, node: &Node, src: &str) -> bool {
        self.node_name(node, src).is_some_and(|n| n.chars().next().is_some_and(|c| c.is_uppercase()))
    }

    fn visibility(&self, node: &Node, src: &str) -> Visibility {
        if self.is_exported(node, src) {
            Visibility::Public
        } else {
            Visibility::Internal
        }
    }

    fn container_body<'a>(&self, node: &'a Node<'a>) -> Option<Node<'a>> {
        let ty = node.child_by_field_name("type")?;
        (ty.kind() == "struct_type" || ty.kind() == "interface_type").then_some(ty)
    }

    fn parameters<'a>(&self, func_node: &Node<'a>, src: &'a str) -> Vec<ParamDecl> {
        let Some(params) = func_node.child_by_field_name("parameters") else { return Vec::new() };
        let mut cursor = params.walk();
        let mut out = Vec::new();
        for child in params.named_children(&mut cursor) {
            if child.kind() != "parameter_declaration" {
                continue;
            }
            let ty = child.child_by_field_name("type").map(|n| text(&n, src).to_string());
            let mut inner = child.walk();
            let names: Vec<_> = child
                .named_children(&mut inner)
                .filter(|c| c.kind() == "identifier")
                .map(|c| text(&c, src).to_string())
                .collect();
            if names.is_empty() {
                out.push(ParamDecl { name: String::new(), declared_type: ty });
            } else {
                for name in names {
                    out.push(ParamDecl { name, declared_type: ty.clone() });
                }
            }
        }
        out
    }

    fn extract_superclasses(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn extract_interfaces(&self, node: &Node, src: &str) -> Vec<String> {
        // Go has no `implements` keyword (interfaces are satisfied
        // structurally); embedded interfaces inside a struct's field list
        // are the closest static signal and are recorded as IMPLEMENTS.
        let Some(ty) = node.child_by_field_name("type") else { return Vec::new() };
        if ty.kind() != "struct_type" {
            return Vec::new();
        }
        let mut out = Vec::new();
        let Some(field_list) = ty.named_child(0) else { return out };
        let mut cursor = field_list.walk();
        for field in field_list.named_children(&mut cursor) {
            if field.kind() == "field_declaration" && field.child_by_field_name("name").is_none() {
                if let Some(embedded) = field.child_by_field_name("type") {
                    out.push(text(&embedded, src).to_string());
                }
            }
        }
        out
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        let line = node.start_position().row + 1;
        let Some(path_node) = node.child_by_field_name("path") else { return Vec::new() };
        let module = text(&path_node, src).trim_matches('"').to_string();
        let alias = node.child_by_field_name("name").map(|n| text(&n, src).to_string());
        vec![Import { module, names: Vec::new(), alias, is_wildcard: false, is_relative: false, line }]
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        let func = node.child_by_field_name("function")?;
        let line = node.start_position().row + 1;
        match func.kind() {
            "selector_expression" => {
                let operand = func.child_by_field_name("operand")?;
                let field = func.child_by_field_name("field")?;
                Some(CallSite { receiver: Some(operand), method_name: text(&field, src).to_string(), line })
            }
            "identifier" => Some(CallSite { receiver: None, method_name: text(&func, src).to_string(), line }),
            _ => None,
        }
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        let operand = node.child_by_field_name("operand")?;
        let field = node.child_by_field_name("field")?;
        Some((operand, text(&field, src)))
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        match node.kind() {
            "short_var_declaration" => {
                let left = node.child_by_field_name("left")?;
                let right = node.child_by_field_name("right");
                let name_node = left.named_child(0)?;
                if name_node.kind() != "identifier" {
                    return None;
                }
                let initializer = right.and_then(|r| r.named_child(0));
                Some(LocalDecl { name: text(&name_node, src).to_string(), declared_type: None, initializer })
            }
            "var_spec" => {
                let name_node = node.named_child(0)?;
                let declared_type = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
                let value = node.child_by_field_name("value").and_then(|v| v.named_child(0));
                Some(LocalDecl { name: text(&name_node, src).to_string(), declared_type, initializer: value })
            }
            _ => None,
        }
    }

    fn extract_assignment<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(&'a str, Node<'a>)> {
        let left = node.child_by_field_name("left")?.named_child(0)?;
        let right = node.child_by_field_name("right")?.named_child(0)?;
        if left.kind() != "identifier" {
            return None;
        }
        Some((text(&left, src), right))
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
        let name = node.child_by_field_name("name")?;
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        Some(FieldDecl { name: text(&name, src).to_string(), declared_type: ty })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        match init.kind() {
            "composite_literal" => init.child_by_field_name("type").map(|n| text(&n, src).to_string()),
            "call_expression" => {
                let func = init.child_by_field_name("function")?;
                (func.kind() == "identifier" || func.kind() == "selector_expression").then(|| text(&func, src).to_string())
            }
            "interpreted_string_literal" => Some("string".to_string()),
            "int_literal" => Some("int".to_string()),
            "float_literal" => Some("float64".to_string()),
            "true" | "false" => Some("bool".to_string()),
            _ => None,
        }
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("sync.{name}"))
    }

    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        let trimmed = name.trim_start_matches('*').trim_start_matches("[]");
        let prefix_len = name.len() - trimmed.len();
        (trimmed, &name[..prefix_len])
    }

    fn is_already_qualified(&self, name: &str) -> bool {
        name.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_pointer_and_slice_markers() {
        assert_eq!(Go.strip_type_decorations("*Repo"), ("Repo", "*"));
        assert_eq!(Go.strip_type_decorations("[]byte"), ("byte", "[]"));
    }
}
