//! The type-inference engine (spec §4.5): resolves a textual type/variable
//! reference to the qualified name of the class it denotes, so the
//! reference pass can turn `receiver.method()` into a `CALLS` edge against
//! a concrete `Method` node instead of a bag of same-named candidates.
//!
//! Broken into the steps the spec lays out: §4.5.1 canonicalizes a written
//! type name, §4.5.2/§4.5.3 resolve a call's receiver and walk the
//! inheritance chain for the method, §4.5.4 ranks cross-module candidates
//! when a simple name is ambiguous, and §4.5.5 bounds recursion so a
//! self-referential type alias can't spin forever.

use cgraph_core::PipelineConfig;
use cgraph_languages::LanguageSupport;
use cgraph_registry::SymbolRegistry;
use std::collections::HashMap;
use std::sync::RwLock;
use tree_sitter::Node;

use crate::imports::ImportIndex;

fn current_package(module_qn: &str) -> &str {
    module_qn.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or(module_qn)
}

/// The local scope a function/method body is resolved against: its `self`
/// class (if any), its parameters/locals as they're discovered, and its
/// enclosing class's field types (for `self.field.method()` chains).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub self_class: Option<String>,
    pub locals: HashMap<String, String>,
    pub fields: HashMap<String, String>,
}

impl Scope {
    pub fn for_method(self_class: Option<String>, fields: HashMap<String, String>) -> Self {
        Self { self_class, locals: HashMap::new(), fields }
    }

    pub fn bind_local(&mut self, name: impl Into<String>, qn: String) {
        self.locals.insert(name.into(), qn);
    }
}

/// Resolves type names and call receivers against the symbol registry,
/// memoizing lookups and enforcing `max_type_inference_depth` (spec §4.5.5,
/// §9: "a depth ceiling guards against cyclic or self-referential types").
pub struct TypeResolver<'a> {
    registry: &'a SymbolRegistry,
    imports: &'a ImportIndex,
    config: &'a PipelineConfig,
    cache: RwLock<HashMap<(String, String), Option<String>>>,
    /// Per-class field-type maps, filled in once by `reference::
    /// collect_class_fields` after construction (it needs a resolver of
    /// its own to resolve each field's declared type, so this can't be
    /// populated in `new`). Read by `lookup_field_type` for `other.field`
    /// receiver chains; `self.field` chains go through `Scope.fields`
    /// instead and never consult this map.
    all_fields: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a SymbolRegistry, imports: &'a ImportIndex, config: &'a PipelineConfig) -> Self {
        Self { registry, imports, config, cache: RwLock::new(HashMap::new()), all_fields: RwLock::new(HashMap::new()) }
    }

    /// Install the whole-repo field-type table built by
    /// `reference::collect_class_fields`, so `lookup_field_type` can
    /// resolve `other_local.field` chains for any class, not just the
    /// current function's own.
    pub fn set_all_fields(&self, fields: HashMap<String, HashMap<String, String>>) {
        *self.all_fields.write().expect("field-type cache poisoned") = fields;
    }

    /// Canonicalize a written type name (spec §4.5.1): strip decorations,
    /// skip primitives, resolve stdlib wrappers and import aliases, then
    /// fall back to same-package and registry-wide simple-name lookup.
    pub fn resolve_type_name(
        &self,
        adapter: &dyn LanguageSupport,
        module_qn: &str,
        raw: &str,
        depth: usize,
    ) -> Option<String> {
        if depth > self.config.max_type_inference_depth {
            return None;
        }
        let cache_key = (module_qn.to_string(), raw.to_string());
        if let Some(hit) = self.cache.read().expect("type cache poisoned").get(&cache_key) {
            return hit.clone();
        }

        let (base, _decoration) = adapter.strip_type_decorations(raw);
        let resolved = self.resolve_base_type(adapter, module_qn, base);
        self.cache.write().expect("type cache poisoned").insert(cache_key, resolved.clone());
        resolved
    }

    fn resolve_base_type(&self, adapter: &dyn LanguageSupport, module_qn: &str, base: &str) -> Option<String> {
        if base.is_empty() || adapter.primitive_types().contains(&base) {
            return None;
        }
        if adapter.is_already_qualified(base) {
            return Some(base.to_string());
        }
        if let Some(wrapper) = adapter.resolve_stdlib_wrapper(base) {
            return Some(wrapper);
        }
        if let Some(qn) = self.imports.resolve(module_qn, base, self.registry) {
            return Some(qn);
        }
        let same_package = format!("{}.{base}", current_package(module_qn));
        if self.registry.contains(&same_package) {
            return Some(same_package);
        }
        self.rank_candidates(self.registry.simple_name_lookup(base))
    }

    /// Cross-module candidate ranking (spec §4.5.4): a unique simple-name
    /// match always wins; with several matches, only keep going when
    /// speculative fallback is enabled, and then deterministically take
    /// the lexicographically-first (the simple-name index is already
    /// sorted, spec §8's determinism requirement).
    fn rank_candidates(&self, candidates: Vec<String>) -> Option<String> {
        match candidates.len() {
            0 => None,
            1 => candidates.into_iter().next(),
            _ if self.config.speculative_edges => candidates.into_iter().next(),
            _ => None,
        }
    }

    /// Method lookup via inheritance BFS (spec §4.5.3): the class itself,
    /// then each ancestor in BFS order, first match wins.
    pub fn lookup_method(&self, class_qn: &str, method_name: &str) -> Option<String> {
        let direct = format!("{class_qn}.{method_name}");
        if self.registry.contains(&direct) {
            return Some(direct);
        }
        for ancestor in self.registry.ancestors_bfs(class_qn) {
            let candidate = format!("{ancestor}.{method_name}");
            if self.registry.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Resolve a call's receiver expression to a class QN (spec §4.5.2):
    /// `self`/`this`/`super` resolve to the enclosing class, a bound local
    /// resolves to its tracked type, and `self.field` resolves through the
    /// enclosing class's field types.
    pub fn resolve_receiver_class(
        &self,
        adapter: &dyn LanguageSupport,
        receiver: &Node,
        src: &str,
        scope: &Scope,
    ) -> Option<String> {
        let kind = receiver.kind();
        if adapter.self_kinds().contains(&kind) || adapter.super_kinds().contains(&kind) {
            return scope.self_class.clone();
        }
        if adapter.identifier_kinds().contains(&kind) {
            let name = receiver.utf8_text(src.as_bytes()).ok()?;
            if adapter.self_param_names().contains(&name) {
                return scope.self_class.clone();
            }
            return scope.locals.get(name).cloned();
        }
        if let Some((base, field)) = adapter.extract_field_access(receiver, src) {
            if adapter.self_kinds().contains(&base.kind()) {
                return scope.fields.get(field).cloned();
            }
            if adapter.identifier_kinds().contains(&base.kind()) {
                let base_name = base.utf8_text(src.as_bytes()).ok()?;
                if adapter.self_param_names().contains(&base_name) {
                    return scope.fields.get(field).cloned();
                }
                let base_class = scope.locals.get(base_name)?;
                return self.lookup_field_type(base_class, field);
            }
        }
        None
    }

    /// A field's declared type, found by checking the class and then its
    /// ancestors — used when a receiver chain crosses into another
    /// object's field (`a.b.c()` where `b`'s type is only known via `a`'s
    /// class, not the currently-executing function's own). Consults the
    /// whole-repo field table installed by `set_all_fields`, walking the
    /// inheritance chain the same way `lookup_method` does so an inherited
    /// field resolves through a subclass too.
    fn lookup_field_type(&self, class_qn: &str, field: &str) -> Option<String> {
        let all_fields = self.all_fields.read().expect("field-type cache poisoned");
        if let Some(ty) = all_fields.get(class_qn).and_then(|fields| fields.get(field)) {
            return Some(ty.clone());
        }
        for ancestor in self.registry.ancestors_bfs(class_qn) {
            if let Some(ty) = all_fields.get(&ancestor).and_then(|fields| fields.get(field)) {
                return Some(ty.clone());
            }
        }
        drop(all_fields);
        let direct = format!("{class_qn}.{field}");
        self.registry.contains(&direct).then_some(direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgraph_core::NodeKind;
    use cgraph_languages::support_for_language;
    use cgraph_core::SourceLanguage;

    #[test]
    fn resolves_same_package_type_and_skips_primitives() {
        let registry = SymbolRegistry::new();
        registry.define("demo.pkg.Widget", NodeKind::Class).unwrap();
        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        let resolver = TypeResolver::new(&registry, &imports, &config);
        let adapter = support_for_language(SourceLanguage::Python);

        assert_eq!(resolver.resolve_type_name(adapter, "demo.pkg.mod", "Widget", 0), Some("demo.pkg.Widget".to_string()));
        assert_eq!(resolver.resolve_type_name(adapter, "demo.pkg.mod", "int", 0), None);
    }

    #[test]
    fn method_lookup_walks_ancestors() {
        let registry = SymbolRegistry::new();
        registry.define("demo.Animal", NodeKind::Class).unwrap();
        registry.define("demo.Animal.speak", NodeKind::Method).unwrap();
        registry.define("demo.Dog", NodeKind::Class).unwrap();
        registry.add_parent("demo.Dog", "demo.Animal".to_string()).unwrap();
        let imports = ImportIndex::default();
        let config = PipelineConfig::default();
        let resolver = TypeResolver::new(&registry, &imports, &config);

        assert_eq!(resolver.lookup_method("demo.Dog", "speak"), Some("demo.Animal.speak".to_string()));
        assert_eq!(resolver.lookup_method("demo.Dog", "missing"), None);
    }

    #[test]
    fn depth_ceiling_stops_resolution() {
        let registry = SymbolRegistry::new();
        registry.define("demo.pkg.Widget", NodeKind::Class).unwrap();
        let imports = ImportIndex::default();
        let mut config = PipelineConfig::default();
        config.max_type_inference_depth = 0;
        let resolver = TypeResolver::new(&registry, &imports, &config);
        let adapter = support_for_language(SourceLanguage::Python);

        assert_eq!(resolver.resolve_type_name(adapter, "demo.pkg.mod", "Widget", 1), None);
    }
}
