//! The online sink: a Bolt-protocol graph database client batching
//! idempotent writes via `UNWIND $batch AS row` (spec §6.1). Grounded on
//! the original's `MemgraphIngestor` (`services/graph_service.py`): same
//! buffer-then-flush shape, same `MERGE ... ON CREATE SET ... ON MATCH SET`
//! upsert pattern, same scoped connect/flush/disconnect lifecycle (here
//! driven by `cgraph_core::SinkSession` instead of `__enter__`/`__exit__`).
//! The original spoke to Memgraph specifically through `mgclient`; this
//! implementation speaks the Bolt protocol generically through `neo4rs`; any
//! Bolt-compatible server (Memgraph included) works behind it.

use cgraph_core::{CgraphError, EdgeKind, NodeKind, NodePayload, NodeRef, Sink};
use neo4rs::{query, BoltType, Graph, Query};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Connection and batching configuration for the online sink.
#[derive(Debug, Clone)]
pub struct OnlineSinkConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Flush threshold (spec §4.8 default 1000, see `PipelineConfig::batch_size`).
    pub batch_size: usize,
}

/// `(label, key property name)` for every node kind the online sink knows
/// how to constrain, mirroring `ensure_constraints` in the original.
const NODE_CONSTRAINTS: &[(NodeKind, &str)] = &[
    (NodeKind::Project, "name"),
    (NodeKind::Folder, "path"),
    (NodeKind::File, "path"),
    (NodeKind::Package, "qualified_name"),
    (NodeKind::Module, "qualified_name"),
    (NodeKind::Class, "qualified_name"),
    (NodeKind::Interface, "qualified_name"),
    (NodeKind::Function, "qualified_name"),
    (NodeKind::Method, "qualified_name"),
    (NodeKind::ExternalPackage, "name"),
];

fn key_field(label: NodeKind) -> &'static str {
    NODE_CONSTRAINTS.iter().find(|(l, _)| *l == label).map(|(_, k)| *k).unwrap_or("qualified_name")
}

struct NodeRow {
    label: NodeKind,
    props: HashMap<String, BoltType>,
}

struct EdgeRow {
    from: NodeRef,
    kind: EdgeKind,
    to: NodeRef,
    props: BTreeMap<String, String>,
}

/// A `Sink` backed by a Bolt-protocol graph database.
pub struct OnlineSink {
    config: OnlineSinkConfig,
    runtime: Runtime,
    graph: Mutex<Option<Graph>>,
    node_buffer: Mutex<Vec<NodeRow>>,
    edge_buffer: Mutex<Vec<EdgeRow>>,
}

impl OnlineSink {
    pub fn new(config: OnlineSinkConfig) -> Result<Self, CgraphError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .map_err(|e| CgraphError::Configuration(format!("failed to start async runtime: {e}")))?;
        Ok(Self {
            config,
            runtime,
            graph: Mutex::new(None),
            node_buffer: Mutex::new(Vec::new()),
            edge_buffer: Mutex::new(Vec::new()),
        })
    }

    fn run_query(&self, query: Query) -> Result<(), CgraphError> {
        let guard = self.graph.lock().unwrap();
        let graph = guard.as_ref().ok_or_else(|| CgraphError::Sink("not connected".to_string()))?;
        self.runtime
            .block_on(async { graph.run(query).await })
            .map_err(|e| CgraphError::Sink(format!("query failed: {e}")))
    }

    /// Like `run_query`, but swallows "already exists"/"constraint" errors
    /// the same way the original's `ensure_constraints` does (constraint
    /// creation isn't naturally idempotent on every Bolt server).
    fn run_query_tolerant(&self, query: Query) {
        if let Err(e) = self.run_query(query) {
            let msg = e.to_string().to_ascii_lowercase();
            if !msg.contains("already exists") && !msg.contains("constraint") {
                warn!(error = %e, "non-idempotent setup query failed");
            }
        }
    }
}

fn bolt_str(s: impl Into<String>) -> BoltType {
    BoltType::from(s.into())
}

fn bolt_int(n: usize) -> BoltType {
    BoltType::from(n as i64)
}

fn bolt_str_list(items: &[String]) -> BoltType {
    BoltType::from(items.iter().map(|s| bolt_str(s.clone())).collect::<Vec<_>>())
}

/// Flatten a `NodePayload`'s §3.2 attributes into Bolt scalar/list values,
/// one row per node. The key attribute (`qualified_name`/`path`/`name`) is
/// always included so `MERGE` can match on it.
fn node_props(payload: &NodePayload) -> HashMap<String, BoltType> {
    let mut props = HashMap::new();
    match payload {
        NodePayload::Project { name } => {
            props.insert("name".to_string(), bolt_str(name.clone()));
        }
        NodePayload::Folder { path } => {
            props.insert("path".to_string(), bolt_str(path.clone()));
        }
        NodePayload::File { path, language, size } => {
            props.insert("path".to_string(), bolt_str(path.clone()));
            if let Some(lang) = language {
                props.insert("language".to_string(), bolt_str(lang.name()));
            }
            props.insert("size".to_string(), bolt_int(*size as usize));
        }
        NodePayload::Package { qn } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
        }
        NodePayload::Module { qn, path } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
            props.insert("path".to_string(), bolt_str(path.clone()));
        }
        NodePayload::Class { qn, name, start_line, end_line, decorators, docstring } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
            props.insert("name".to_string(), bolt_str(name.clone()));
            props.insert("start_line".to_string(), bolt_int(*start_line));
            props.insert("end_line".to_string(), bolt_int(*end_line));
            props.insert("decorators".to_string(), bolt_str_list(decorators));
            if let Some(doc) = docstring {
                props.insert("docstring".to_string(), bolt_str(doc.clone()));
            }
        }
        NodePayload::Interface { qn, name, start_line, end_line } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
            props.insert("name".to_string(), bolt_str(name.clone()));
            props.insert("start_line".to_string(), bolt_int(*start_line));
            props.insert("end_line".to_string(), bolt_int(*end_line));
        }
        NodePayload::Function { qn, name, start_line, end_line, decorators, docstring, is_exported } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
            props.insert("name".to_string(), bolt_str(name.clone()));
            props.insert("start_line".to_string(), bolt_int(*start_line));
            props.insert("end_line".to_string(), bolt_int(*end_line));
            props.insert("decorators".to_string(), bolt_str_list(decorators));
            props.insert("is_exported".to_string(), BoltType::from(*is_exported));
            if let Some(doc) = docstring {
                props.insert("docstring".to_string(), bolt_str(doc.clone()));
            }
        }
        NodePayload::Method { qn, name, start_line, end_line, decorators, docstring, visibility } => {
            props.insert("qualified_name".to_string(), bolt_str(qn.clone()));
            props.insert("name".to_string(), bolt_str(name.clone()));
            props.insert("start_line".to_string(), bolt_int(*start_line));
            props.insert("end_line".to_string(), bolt_int(*end_line));
            props.insert("decorators".to_string(), bolt_str_list(decorators));
            props.insert("visibility".to_string(), bolt_str(visibility.as_str()));
            if let Some(doc) = docstring {
                props.insert("docstring".to_string(), bolt_str(doc.clone()));
            }
        }
        NodePayload::ExternalPackage { name } => {
            props.insert("name".to_string(), bolt_str(name.clone()));
        }
    }
    props
}

impl Sink for OnlineSink {
    fn ensure_constraints(&self) -> Result<(), CgraphError> {
        info!("ensuring constraints");
        for (label, key) in NODE_CONSTRAINTS {
            let cypher = format!("CREATE CONSTRAINT ON (n:{}) ASSERT n.{key} IS UNIQUE;", label.as_str());
            self.run_query_tolerant(query(cypher));
        }
        Ok(())
    }

    fn connect(&self) -> Result<(), CgraphError> {
        let mut guard = self.graph.lock().unwrap();
        if guard.is_some() {
            return Ok(());
        }
        info!(uri = %self.config.uri, "connecting to graph sink");
        let graph = self
            .runtime
            .block_on(async { Graph::new(&self.config.uri, &self.config.user, &self.config.password).await })
            .map_err(|e| CgraphError::Sink(format!("failed to connect: {e}")))?;
        *guard = Some(graph);
        Ok(())
    }

    fn disconnect(&self) -> Result<(), CgraphError> {
        let mut guard = self.graph.lock().unwrap();
        *guard = None;
        info!("disconnected from graph sink");
        Ok(())
    }

    fn upsert_node(&self, node: NodePayload) -> Result<(), CgraphError> {
        let label = node.label();
        let props = node_props(&node);
        let should_flush = {
            let mut buf = self.node_buffer.lock().unwrap();
            buf.push(NodeRow { label, props });
            buf.len() >= self.config.batch_size
        };
        if should_flush {
            self.flush_nodes()?;
        }
        Ok(())
    }

    fn upsert_edge(&self, from: NodeRef, kind: EdgeKind, to: NodeRef, props: BTreeMap<String, String>) -> Result<(), CgraphError> {
        let should_flush = {
            let mut buf = self.edge_buffer.lock().unwrap();
            buf.push(EdgeRow { from, kind, to, props });
            buf.len() >= self.config.batch_size
        };
        if should_flush {
            self.flush_edges()?;
        }
        Ok(())
    }

    fn flush_nodes(&self) -> Result<(), CgraphError> {
        let rows = std::mem::take(&mut *self.node_buffer.lock().unwrap());
        if rows.is_empty() {
            return Ok(());
        }
        let mut by_label: HashMap<NodeKind, Vec<HashMap<String, BoltType>>> = HashMap::new();
        for row in rows {
            by_label.entry(row.label).or_default().push(row.props);
        }
        for (label, batch) in by_label {
            let key = key_field(label);
            let cypher = format!(
                "UNWIND $batch AS row\nMERGE (n:{label} {{{key}: row.{key}}})\nON CREATE SET n += row\nON MATCH SET n += row",
                label = label.as_str(),
            );
            let len = batch.len();
            let query = query(cypher).param("batch", batch);
            self.run_query(query)?;
            info!(count = len, label = label.as_str(), "flushed nodes");
        }
        Ok(())
    }

    fn flush_edges(&self) -> Result<(), CgraphError> {
        // Nodes must land before edges so MERGE's MATCH side can find their
        // endpoints (spec §4.8) — an edge whose endpoint is still sitting in
        // the unflushed node buffer would otherwise MATCH nothing and get
        // silently dropped.
        self.flush_nodes()?;
        let rows = std::mem::take(&mut *self.edge_buffer.lock().unwrap());
        if rows.is_empty() {
            return Ok(());
        }
        let mut by_pattern: HashMap<(NodeKind, NodeKind, &'static str), Vec<HashMap<String, BoltType>>> = HashMap::new();
        for row in rows {
            let pattern = (row.from.label, row.to.label, row.kind.as_str());
            let mut props = HashMap::new();
            props.insert("from_val".to_string(), bolt_str(row.from.key.clone()));
            props.insert("to_val".to_string(), bolt_str(row.to.key.clone()));
            let mut rel_props = HashMap::new();
            for (k, v) in &row.props {
                rel_props.insert(k.clone(), bolt_str(v.clone()));
            }
            props.insert("props".to_string(), BoltType::from(rel_props));
            by_pattern.entry(pattern).or_default().push(props);
        }
        for ((from_label, to_label, rel_type), batch) in by_pattern {
            let from_key = key_field(from_label);
            let to_key = key_field(to_label);
            let cypher = format!(
                "UNWIND $batch AS row\nMATCH (a:{from_label} {{{from_key}: row.from_val}}), (b:{to_label} {{{to_key}: row.to_val}})\nMERGE (a)-[r:{rel_type}]->(b)\nSET r += row.props",
                from_label = from_label.as_str(),
                to_label = to_label.as_str(),
            );
            let len = batch.len();
            let query = query(cypher).param("batch", batch);
            self.run_query(query)?;
            info!(count = len, rel_type, "flushed edges");
        }
        Ok(())
    }

    fn clean(&self) -> Result<(), CgraphError> {
        self.run_query(query("MATCH (n) DETACH DELETE n;".to_string()))
    }

    fn list_projects(&self) -> Result<Vec<String>, CgraphError> {
        let guard = self.graph.lock().unwrap();
        let graph = guard.as_ref().ok_or_else(|| CgraphError::Sink("not connected".to_string()))?;
        self.runtime.block_on(async {
            let mut stream = graph
                .execute(query("MATCH (p:Project) RETURN p.name AS name;".to_string()))
                .await
                .map_err(|e| CgraphError::Sink(format!("query failed: {e}")))?;
            let mut names = Vec::new();
            while let Ok(Some(row)) = stream.next().await {
                if let Ok(name) = row.get::<String>("name") {
                    names.push(name);
                }
            }
            Ok(names)
        })
    }

    fn delete_project(&self, name: &str) -> Result<(), CgraphError> {
        let cypher = "MATCH (p:Project {name: $name}) DETACH DELETE p;".to_string();
        self.run_query(query(cypher).param("name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_field_matches_spec_constraint_table() {
        assert_eq!(key_field(NodeKind::Project), "name");
        assert_eq!(key_field(NodeKind::Folder), "path");
        assert_eq!(key_field(NodeKind::Class), "qualified_name");
        assert_eq!(key_field(NodeKind::ExternalPackage), "name");
    }

    #[test]
    fn node_props_includes_key_attribute_for_class() {
        let payload = NodePayload::Class {
            qn: "demo.pkg.Widget".to_string(),
            name: "Widget".to_string(),
            start_line: 1,
            end_line: 20,
            decorators: vec!["dataclass".to_string()],
            docstring: Some("A widget.".to_string()),
        };
        let props = node_props(&payload);
        assert!(props.contains_key("qualified_name"));
        assert!(props.contains_key("docstring"));
        assert!(props.contains_key("decorators"));
    }
}
