//! A QN trie keyed on dotted segments, giving prefix lookup in time
//! proportional to the result count (spec §4.3: "implementations typically
//! use a trie for O(k) lookup where k is the result count").

use std::collections::BTreeMap;

#[derive(Default)]
struct TrieNode {
    // BTreeMap, not HashMap: prefix_lookup traversal order must be
    // deterministic (spec §8, "Determinism").
    children: BTreeMap<String, TrieNode>,
    /// Non-empty only at a node whose path-from-root is itself a defined QN.
    qn: Option<String>,
}

#[derive(Default)]
pub struct QnTrie {
    root: TrieNode,
}

impl QnTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, qn: &str) {
        let mut node = &mut self.root;
        for segment in qn.split('.') {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.qn = Some(qn.to_string());
    }

    /// All defined QNs whose path starts with `prefix`'s segments (including
    /// `prefix` itself if it is a defined QN).
    pub fn prefix_lookup(&self, prefix: &str) -> Vec<String> {
        let mut node = &self.root;
        for segment in prefix.split('.') {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        let mut out = Vec::new();
        collect(node, &mut out);
        out
    }
}

fn collect(node: &TrieNode, out: &mut Vec<String>) {
    if let Some(qn) = &node.qn {
        out.push(qn.clone());
    }
    for child in node.children.values() {
        collect(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_lookup_finds_descendants_only() {
        let mut trie = QnTrie::new();
        trie.insert("pkg.mod.Class");
        trie.insert("pkg.mod.Class.method");
        trie.insert("pkg.other.Thing");

        let mut found = trie.prefix_lookup("pkg.mod.Class");
        found.sort();
        assert_eq!(found, vec!["pkg.mod.Class".to_string(), "pkg.mod.Class.method".to_string()]);

        assert!(trie.prefix_lookup("pkg.missing").is_empty());
    }

    #[test]
    fn exact_prefix_not_defined_still_finds_children() {
        let mut trie = QnTrie::new();
        trie.insert("pkg.mod.Class.method");
        let found = trie.prefix_lookup("pkg.mod");
        assert_eq!(found, vec!["pkg.mod.Class.method".to_string()]);
    }
}
