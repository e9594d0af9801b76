//! Qualified names (spec §3.1): the dotted path rooted at the project name
//! that is the primary key for every code node.

use std::fmt;

/// A dotted path uniquely identifying a code entity within the project
/// namespace, e.g. `project.package.module.Class.method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn root(project: &str) -> Self {
        Self(project.to_string())
    }

    /// Append a dotted segment, returning the child QN.
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `self` is `other` or a descendant of `other` (dotted-prefix
    /// rule used by the QN prefix invariant, spec §3.4/§8).
    pub fn starts_with(&self, other: &QualifiedName) -> bool {
        self.0 == other.0 || self.0.starts_with(&format!("{}.", other.0))
    }

    /// The simple (last-segment) name, e.g. `method` for `a.b.Class.method`.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The parent QN, if any (everything before the last dot).
    pub fn parent(&self) -> Option<QualifiedName> {
        self.0.rsplit_once('.').map(|(p, _)| QualifiedName(p.to_string()))
    }

    pub fn depth(&self) -> usize {
        self.0.matches('.').count()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_appends_dotted_segment() {
        let root = QualifiedName::root("proj");
        let module = root.child("pkg").child("mod");
        assert_eq!(module.as_str(), "proj.pkg.mod");
    }

    #[test]
    fn prefix_rule_matches_descendants_only() {
        let parent = QualifiedName::new("proj.pkg.mod");
        let child = QualifiedName::new("proj.pkg.mod.Class");
        let sibling = QualifiedName::new("proj.pkg.modular");
        assert!(child.starts_with(&parent));
        assert!(!sibling.starts_with(&parent));
        assert!(parent.starts_with(&parent));
    }

    #[test]
    fn simple_name_and_parent() {
        let qn = QualifiedName::new("proj.pkg.Class.method");
        assert_eq!(qn.simple_name(), "method");
        assert_eq!(qn.parent().unwrap().as_str(), "proj.pkg.Class");
    }
}
