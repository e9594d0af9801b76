//! Rust language support. Rust has no class inheritance; `impl Trait for
//! Type` blocks are modelled as IMPLEMENTS edges once the structural pass
//! merges each `impl_item`'s methods into the `Class` node for `Type`
//! (mirrors the teacher's `merge_rust_impl_blocks`). The generic
//! [`LanguageSupport::extract_interfaces`] hook returns nothing for struct
//! and enum nodes themselves — [`self_type_name`] and [`trait_name`] below
//! are the Rust-specific helpers the structural pass uses instead.

use crate::traits::{CallSite, FieldDecl, Import, LanguageSupport, LocalDecl, ParamDecl};
use cgraph_core::{SourceLanguage, Visibility};
use tree_sitter::Node;

pub struct Rust;

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64", "()",
];
const STDLIB_WRAPPERS: &[&str] = &[
    "Vec", "HashMap", "HashSet", "BTreeMap", "BTreeSet", "Option", "Result", "Box", "Rc", "Arc",
    "RefCell", "Mutex", "String",
];

fn text<'a>(node: &Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

/// The `Type` in `impl ... for Type` or `impl Type`, i.e. the struct/enum
/// this `impl_item`'s methods attach to.
pub fn self_type_name(impl_node: &Node, src: &str) -> Option<String> {
    let ty = impl_node.child_by_field_name("type")?;
    let base = match ty.kind() {
        "generic_type" => ty.child_by_field_name("type")?,
        _ => ty,
    };
    Some(text(&base, src).to_string())
}

/// The `Trait` in `impl Trait for Type`, `None` for an inherent `impl Type`.
pub fn trait_name(impl_node: &Node, src: &str) -> Option<String> {
    impl_node.child_by_field_name("trait").map(|t| text(&t, src).to_string())
}

impl LanguageSupport for Rust {
    fn id(&self) -> SourceLanguage {
        SourceLanguage::Rust
    }
    fn grammar_name(&self) -> &'static str {
        "rust"
    }
    fn has_inheritance(&self) -> bool {
        true
    }

    fn class_kinds(&self) -> &'static [&'static str] {
        &["struct_item", "enum_item"]
    }
    fn interface_kinds(&self) -> &'static [&'static str] {
        &["trait_item"]
    }
    fn enum_kinds(&self) -> &'static [&'static str] {
        &["enum_item"]
    }
    fn function_kinds(&self) -> &'static [&'static str] {
        &["function_item"]
    }
    fn container_kinds(&self) -> &'static [&'static str] {
        &["struct_item", "enum_item", "trait_item", "impl_item"]
    }
    fn import_kinds(&self) -> &'static [&'static str] {
        &["use_declaration"]
    }
    fn call_kinds(&self) -> &'static [&'static str] {
        &["call_expression", "method_call_expression"]
    }
    fn field_access_kinds(&self) -> &'static [&'static str] {
        &["field_expression"]
    }
    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier"]
    }
    fn self_kinds(&self) -> &'static [&'static str] {
        &["self"]
    }
    fn super_kinds(&self) -> &'static [&'static str] {
        &[]
    }
    fn local_decl_kinds(&self) -> &'static [&'static str] {
        &["let_declaration"]
    }
    fn assignment_kinds(&self) -> &'static [&'static str] {
        &["assignment_expression"]
    }
    fn enhanced_for_kinds(&self) -> &'static [&'static str] {
        &["for_expression"]
    }
    fn field_decl_kinds(&self) -> &'static [&'static str] {
        &["field_declaration"]
    }

    fn node_name<'a>(&self, node: &Node, src: &'a str) -> Option<&'a str> {
        node.child_by_field_name("name").map(|n| text(&n, src))
    }

    fn extract_docstring(&self, node: &Node, src: &str) -> Option<String> {
        let target = node.parent().filter(|p| p.kind() == "impl_item" || p.kind() == "declaration_list").map(|_| *node).unwrap_or(*node);
        let mut sib = target.prev_sibling();
        let mut lines = Vec::new();
        while let Some(s) = sib {
            if s.kind() != "line_comment" {
                break;
            }
            let raw = text(&s, src);
            if let Some(rest) = raw.strip_prefix("///") {
                lines.push(rest.trim().to_string());
                sib = s.prev_sibling();
            } else {
                break;
            }
        }
        lines.reverse();
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn extract_decorators(&self, node: &Node, src: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut sib = node.prev_sibling();
        while let Some(s) = sib {
            if s.kind() == "attribute_item" {
                out.push(text(&s, src).to_string());
                sib = s.prev_sibling();
            } else if s.kind() == "line_comment" {
                sib = s.prev_sibling();
            } else {
                break;
            }
        }
        out.reverse();
        out
    }

    fn is_exported(&self, node: &Node, _src: &str) -> bool {
        node.children(&mut node.walk()).any(|c| c.kind() == "visibility_modifier")
    }

    fn visibility(&self, node: &Node, src: &str) -> Visibility {
        let Some(modifier) = node.children(&mut node.walk()).find(|c| c.kind() == "visibility_modifier") else {
            return Visibility::Private;
        };
        let raw = text(&modifier, src);
        if raw == "pub" {
            Visibility::Public
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
        let mut out = Vec::new();
        for child in params.named_children(&mut cursor) {
            match child.kind() {
                "parameter" => {
                    let pattern = child.child_by_field_name("pattern");
                    let ty = child.child_by_field_name("type").map(|n| text(&n, src).to_string());
                    if let Some(pattern) = pattern {
                        out.push(ParamDecl { name: text(&pattern, src).to_string(), declared_type: ty });
                    }
                }
                "self_parameter" => out.push(ParamDecl { name: "self".to_string(), declared_type: None }),
                _ => {}
            }
        }
        out
    }

    fn extract_superclasses(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn extract_interfaces(&self, _node: &Node, _src: &str) -> Vec<String> {
        Vec::new()
    }

    fn extract_imports(&self, node: &Node, src: &str) -> Vec<Import> {
        let line = node.start_position().row + 1;
        let Some(arg) = node.child_by_field_name("argument") else { return Vec::new() };
        flatten_use_tree(&arg, src, String::new(), line)
    }

    fn extract_call<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<CallSite<'a>> {
        let line = node.start_position().row + 1;
        match node.kind() {
            "method_call_expression" => {
                let receiver = node.child_by_field_name("receiver")?;
                let method = node.child_by_field_name("method")?;
                Some(CallSite { receiver: Some(receiver), method_name: text(&method, src).to_string(), line })
            }
            "call_expression" => {
                let func = node.child_by_field_name("function")?;
                match func.kind() {
                    "field_expression" => {
                        let value = func.child_by_field_name("value")?;
                        let field = func.child_by_field_name("field")?;
                        Some(CallSite { receiver: Some(value), method_name: text(&field, src).to_string(), line })
                    }
                    "scoped_identifier" => {
                        let name = func.child_by_field_name("name")?;
                        let path = func.child_by_field_name("path");
                        Some(CallSite { receiver: path, method_name: text(&name, src).to_string(), line })
                    }
                    "identifier" => Some(CallSite { receiver: None, method_name: text(&func, src).to_string(), line }),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn extract_field_access<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<(Node<'a>, &'a str)> {
        let value = node.child_by_field_name("value")?;
        let field = node.child_by_field_name("field")?;
        Some((value, text(&field, src)))
    }

    fn extract_local_decl<'a>(&self, node: &Node<'a>, src: &'a str) -> Option<LocalDecl<'a>> {
        let pattern = node.child_by_field_name("pattern")?;
        if pattern.kind() != "identifier" {
            return None;
        }
        let declared_type = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        let initializer = node.child_by_field_name("value");
        Some(LocalDecl { name: text(&pattern, src).to_string(), declared_type, initializer })
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
        let pattern = node.child_by_field_name("pattern")?;
        if pattern.kind() != "identifier" {
            return None;
        }
        let iterable = node.child_by_field_name("value");
        Some((text(&pattern, src).to_string(), None, iterable))
    }

    fn extract_field_decl(&self, node: &Node, src: &str) -> Option<FieldDecl> {
        let name = node.child_by_field_name("name")?;
        let ty = node.child_by_field_name("type").map(|n| text(&n, src).to_string());
        Some(FieldDecl { name: text(&name, src).to_string(), declared_type: ty })
    }

    fn infer_initializer_hint(&self, init: &Node, src: &str) -> Option<String> {
        match init.kind() {
            "call_expression" => {
                let func = init.child_by_field_name("function")?;
                match func.kind() {
                    "identifier" => Some(text(&func, src).to_string()),
                    "scoped_identifier" => func.child_by_field_name("name").map(|n| text(&n, src).to_string()),
                    _ => None,
                }
            }
            "struct_expression" => node_type_name(init, src),
            "string_literal" => Some("str".to_string()),
            "integer_literal" => Some("i32".to_string()),
            "float_literal" => Some("f64".to_string()),
            "boolean_literal" => Some("bool".to_string()),
            _ => None,
        }
    }

    fn primitive_types(&self) -> &'static [&'static str] {
        PRIMITIVES
    }

    fn resolve_stdlib_wrapper(&self, name: &str) -> Option<String> {
        STDLIB_WRAPPERS.contains(&name).then(|| format!("std.{name}"))
    }

    fn strip_type_decorations<'a>(&self, name: &'a str) -> (&'a str, &'a str) {
        let trimmed = name.trim_start_matches('&').trim_start_matches("mut ");
        let prefix_len = name.len() - trimmed.len();
        (trimmed, &name[..prefix_len])
    }

    fn is_already_qualified(&self, name: &str) -> bool {
        name.contains("::")
    }
}

fn node_type_name(node: &Node, src: &str) -> Option<String> {
    node.child_by_field_name("name").map(|n| text(&n, src).to_string())
}

fn flatten_use_tree(node: &Node, src: &str, prefix: String, line: usize) -> Vec<Import> {
    match node.kind() {
        "use_as_clause" => {
            let path = node.child_by_field_name("path");
            let alias = node.child_by_field_name("alias").map(|n| text(&n, src).to_string());
            let module = path.map(|p| join_path(&prefix, text(&p, src))).unwrap_or(prefix);
            vec![Import { module, names: Vec::new(), alias, is_wildcard: false, is_relative: false, line }]
        }
        "use_list" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor).flat_map(|c| flatten_use_tree(&c, src, prefix.clone(), line)).collect()
        }
        "scoped_use_list" => {
            let path = node.child_by_field_name("path").map(|p| text(&p, src).to_string()).unwrap_or_default();
            let full_prefix = join_path(&prefix, &path);
            let Some(list) = node.child_by_field_name("list") else { return Vec::new() };
            let mut cursor = list.walk();
            list.named_children(&mut cursor).flat_map(|c| flatten_use_tree(&c, src, full_prefix.clone(), line)).collect()
        }
        "use_wildcard" => {
            let path = node.named_child(0).map(|p| text(&p, src).to_string());
            let module = path.map(|p| join_path(&prefix, &p)).unwrap_or(prefix);
            vec![Import { module, names: Vec::new(), alias: None, is_wildcard: true, is_relative: false, line }]
        }
        "identifier" | "self" | "crate" | "super" => {
            let module = join_path(&prefix, text(node, src));
            vec![Import { module, names: Vec::new(), alias: None, is_wildcard: false, is_relative: false, line }]
        }
        "scoped_identifier" => {
            let module = join_path(&prefix, text(node, src));
            vec![Import { module, names: Vec::new(), alias: None, is_wildcard: false, is_relative: false, line }]
        }
        _ => vec![Import { module: join_path(&prefix, text(node, src)), names: Vec::new(), alias: None, is_wildcard: false, is_relative: false, line }],
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}::{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reference_markers() {
        assert_eq!(Rust.strip_type_decorations("&mut Foo"), ("Foo", "&mut "));
    }

    #[test]
    fn resolves_known_wrapper() {
        assert_eq!(Rust.resolve_stdlib_wrapper("Vec"), Some("std.Vec".to_string()));
    }
}
