//! The graph data model: node labels/payloads and edge types (spec §3.2-3.3).

use crate::language::SourceLanguage;
use serde::{Deserialize, Serialize};

/// Node label (spec §3.2 table). Each label has its own key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Project,
    Folder,
    File,
    Package,
    Module,
    Class,
    Interface,
    Function,
    Method,
    ExternalPackage,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Project => "Project",
            NodeKind::Folder => "Folder",
            NodeKind::File => "File",
            NodeKind::Package => "Package",
            NodeKind::Module => "Module",
            NodeKind::Class => "Class",
            NodeKind::Interface => "Interface",
            NodeKind::Function => "Function",
            NodeKind::Method => "Method",
            NodeKind::ExternalPackage => "ExternalPackage",
        }
    }
}

/// Edge type (spec §3.3). Edges are directed and deduplicated on
/// `(source_key, type, target_key)` by the ingestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    ContainsPackage,
    ContainsModule,
    Contains,
    Defines,
    DefinesMethod,
    Inherits,
    Implements,
    Overrides,
    Calls,
    Imports,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::ContainsPackage => "CONTAINS_PACKAGE",
            EdgeKind::ContainsModule => "CONTAINS_MODULE",
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::DefinesMethod => "DEFINES_METHOD",
            EdgeKind::Inherits => "INHERITS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Overrides => "OVERRIDES",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Imports => "IMPORTS",
        }
    }
}

/// Visibility of a `Method` (spec §3.2 attribute). Classes/Functions don't
/// carry this attribute in the node table; only methods do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
        }
    }
}

/// A `(label, key)` reference into the graph, used both as the ingestor's
/// `from_ref`/`to_ref` (spec §6.1) and as the dedup key within a node
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub label: NodeKind,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeKind, key: impl Into<String>) -> Self {
        Self { label, key: key.into() }
    }
}

/// A node's attributes, tagged by label (spec §3.2). This is the payload
/// the structural/inheritance/reference passes build and the ingestor
/// serializes; its fields correspond exactly to the node table's attribute
/// columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodePayload {
    Project {
        name: String,
    },
    Folder {
        path: String,
    },
    File {
        path: String,
        language: Option<SourceLanguage>,
        size: u64,
    },
    Package {
        qn: String,
    },
    Module {
        qn: String,
        path: String,
    },
    Class {
        qn: String,
        name: String,
        start_line: usize,
        end_line: usize,
        decorators: Vec<String>,
        docstring: Option<String>,
    },
    Interface {
        qn: String,
        name: String,
        start_line: usize,
        end_line: usize,
    },
    Function {
        qn: String,
        name: String,
        start_line: usize,
        end_line: usize,
        decorators: Vec<String>,
        docstring: Option<String>,
        is_exported: bool,
    },
    Method {
        qn: String,
        name: String,
        start_line: usize,
        end_line: usize,
        decorators: Vec<String>,
        docstring: Option<String>,
        visibility: Visibility,
    },
    ExternalPackage {
        name: String,
    },
}

impl NodePayload {
    pub fn label(&self) -> NodeKind {
        match self {
            NodePayload::Project { .. } => NodeKind::Project,
            NodePayload::Folder { .. } => NodeKind::Folder,
            NodePayload::File { .. } => NodeKind::File,
            NodePayload::Package { .. } => NodeKind::Package,
            NodePayload::Module { .. } => NodeKind::Module,
            NodePayload::Class { .. } => NodeKind::Class,
            NodePayload::Interface { .. } => NodeKind::Interface,
            NodePayload::Function { .. } => NodeKind::Function,
            NodePayload::Method { .. } => NodeKind::Method,
            NodePayload::ExternalPackage { .. } => NodeKind::ExternalPackage,
        }
    }

    /// The value of this node's unique key (spec §3.2: "Keys are unique
    /// per label"). Folders/Files are keyed by path; Projects/External
    /// packages by name; everything else by QN.
    pub fn key(&self) -> &str {
        match self {
            NodePayload::Project { name } => name,
            NodePayload::Folder { path } => path,
            NodePayload::File { path, .. } => path,
            NodePayload::Package { qn } => qn,
            NodePayload::Module { qn, .. } => qn,
            NodePayload::Class { qn, .. } => qn,
            NodePayload::Interface { qn, .. } => qn,
            NodePayload::Function { qn, .. } => qn,
            NodePayload::Method { qn, .. } => qn,
            NodePayload::ExternalPackage { name } => name,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.label(), self.key().to_string())
    }
}
