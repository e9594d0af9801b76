//! The symbol registry (spec §4.3): definition QN -> kind, plus the prefix,
//! simple-name, inheritance, and module-file indexes every later pass reads
//! from. Write-once during the structural/inheritance passes, read-many
//! during the reference pass (spec §5).

use crate::trie::QnTrie;
use cgraph_core::{CgraphError, NodeKind};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

#[derive(Default)]
struct Indexes {
    kinds: HashMap<String, NodeKind>,
    trie: QnTrie,
    simple_names: HashMap<String, HashSet<String>>,
    inheritance: HashMap<String, Vec<String>>,
    module_files: HashMap<String, PathBuf>,
}

pub struct SymbolRegistry {
    indexes: RwLock<Indexes>,
    frozen: AtomicBool,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self { indexes: RwLock::new(Indexes::default()), frozen: AtomicBool::new(false) }
    }

    fn guard_writable(&self) -> Result<(), CgraphError> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(CgraphError::internal("SymbolRegistry", "write attempted after freeze"));
        }
        Ok(())
    }

    /// Record a definition QN with its entity kind. Idempotent: redefining
    /// the same QN overwrites its kind (last-write-wins, spec §3.4).
    pub fn define(&self, qn: &str, kind: NodeKind) -> Result<(), CgraphError> {
        self.guard_writable()?;
        let mut idx = self.indexes.write().expect("registry lock poisoned");
        idx.kinds.insert(qn.to_string(), kind);
        idx.trie.insert(qn);
        if let Some(simple) = qn.rsplit('.').next() {
            idx.simple_names.entry(simple.to_string()).or_default().insert(qn.to_string());
        }
        Ok(())
    }

    /// Record `parent_qn` as an ancestor of `class_qn`, preserving
    /// declaration order (first push = primary superclass).
    pub fn add_parent(&self, class_qn: &str, parent_qn: String) -> Result<(), CgraphError> {
        self.guard_writable()?;
        let mut idx = self.indexes.write().expect("registry lock poisoned");
        idx.inheritance.entry(class_qn.to_string()).or_default().push(parent_qn);
        Ok(())
    }

    pub fn set_module_file(&self, module_qn: &str, path: PathBuf) -> Result<(), CgraphError> {
        self.guard_writable()?;
        let mut idx = self.indexes.write().expect("registry lock poisoned");
        idx.module_files.insert(module_qn.to_string(), path);
        Ok(())
    }

    /// Freeze the registry: all `define`/`add_parent`/`set_module_file`
    /// calls after this point are rejected (spec §5: indexes are write-once
    /// then read-many).
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn contains(&self, qn: &str) -> bool {
        self.indexes.read().expect("registry lock poisoned").kinds.contains_key(qn)
    }

    pub fn kind_of(&self, qn: &str) -> Option<NodeKind> {
        self.indexes.read().expect("registry lock poisoned").kinds.get(qn).copied()
    }

    /// All defined QNs under `prefix` (including `prefix` itself).
    pub fn prefix_lookup(&self, prefix: &str) -> Vec<String> {
        self.indexes.read().expect("registry lock poisoned").trie.prefix_lookup(prefix)
    }

    /// QNs whose simple (last-segment) name matches `name`, sorted for
    /// deterministic fallback ranking (spec §4.5.4).
    pub fn simple_name_lookup(&self, name: &str) -> Vec<String> {
        let idx = self.indexes.read().expect("registry lock poisoned");
        let mut out: Vec<String> = idx.simple_names.get(name).cloned().unwrap_or_default().into_iter().collect();
        out.sort();
        out
    }

    pub fn parents_of(&self, class_qn: &str) -> Vec<String> {
        self.indexes.read().expect("registry lock poisoned").inheritance.get(class_qn).cloned().unwrap_or_default()
    }

    pub fn module_file(&self, module_qn: &str) -> Option<PathBuf> {
        self.indexes.read().expect("registry lock poisoned").module_files.get(module_qn).cloned()
    }

    /// Breadth-first walk over the inheritance index starting at `class_qn`,
    /// visiting each class at most once (spec §4.5.5, §9: "cycle detection
    /// uses a visited set per walk"). Does not include `class_qn` itself.
    pub fn ancestors_bfs(&self, class_qn: &str) -> Vec<String> {
        let idx = self.indexes.read().expect("registry lock poisoned");
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: std::collections::VecDeque<String> = idx
            .inheritance
            .get(class_qn)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();
        let mut order = Vec::new();
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next.clone()) {
                continue;
            }
            order.push(next.clone());
            if let Some(parents) = idx.inheritance.get(&next) {
                for p in parents {
                    if !visited.contains(p) {
                        queue.push_back(p.clone());
                    }
                }
            }
        }
        order
    }

    pub fn module_paths(&self) -> Vec<(String, PathBuf)> {
        self.indexes
            .read()
            .expect("registry lock poisoned")
            .module_files
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_prefix_and_simple_name_lookup() {
        let reg = SymbolRegistry::new();
        reg.define("pkg.mod.Class", NodeKind::Class).unwrap();
        reg.define("pkg.mod.Class.method", NodeKind::Method).unwrap();

        assert_eq!(reg.kind_of("pkg.mod.Class"), Some(NodeKind::Class));
        assert_eq!(reg.prefix_lookup("pkg.mod.Class").len(), 2);
        assert_eq!(reg.simple_name_lookup("method"), vec!["pkg.mod.Class.method".to_string()]);
    }

    #[test]
    fn freeze_rejects_further_writes() {
        let reg = SymbolRegistry::new();
        reg.define("a.B", NodeKind::Class).unwrap();
        reg.freeze();
        assert!(reg.define("a.C", NodeKind::Class).is_err());
    }

    #[test]
    fn ancestors_bfs_breaks_cycles() {
        let reg = SymbolRegistry::new();
        reg.add_parent("a.X", "a.Y".to_string()).unwrap();
        reg.add_parent("a.Y", "a.X".to_string()).unwrap();
        let ancestors = reg.ancestors_bfs("a.X");
        assert_eq!(ancestors, vec!["a.Y".to_string()]);
    }

    #[test]
    fn diamond_inheritance_visits_each_ancestor_once() {
        let reg = SymbolRegistry::new();
        reg.add_parent("a.D", "a.B".to_string()).unwrap();
        reg.add_parent("a.D", "a.C".to_string()).unwrap();
        reg.add_parent("a.B", "a.A".to_string()).unwrap();
        reg.add_parent("a.C", "a.A".to_string()).unwrap();
        let ancestors = reg.ancestors_bfs("a.D");
        let count_a = ancestors.iter().filter(|q| *q == "a.A").count();
        assert_eq!(count_a, 1);
    }
}
