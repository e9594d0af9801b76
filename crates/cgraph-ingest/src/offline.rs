//! The offline sink: a length-prefixed `bincode` container holding the
//! node and edge sequences (spec §6.2), accumulated in memory across a run
//! and serialized at flush (spec §4.8: "accumulates into in-memory maps
//! keyed on node key and edge triple"). `BTreeMap` keys keep the on-disk
//! record order deterministic (spec §8).

use cgraph_core::{CgraphError, EdgeKind, NodeKind, NodePayload, NodeRef, Sink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// An edge record exactly as spec §6.2 describes it: source key, dest key,
/// relationship type, and a string-to-scalar property map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from_label: NodeKind,
    pub from_key: String,
    pub kind: EdgeKind,
    pub to_label: NodeKind,
    pub to_key: String,
    pub props: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct OfflineSinkConfig {
    /// Container path. In split mode, `<path>.nodes.bin`/`<path>.edges.bin`
    /// are written instead of this path directly.
    pub path: PathBuf,
    pub split: bool,
}

/// A `Sink` that writes the offline binary index instead of talking to a
/// live database. Grounded on the original's `export_graph_to_dict`
/// (`services/graph_db.py`), generalized from JSON to the length-prefixed
/// binary container spec §6.2 requires.
pub struct OfflineSink {
    config: OfflineSinkConfig,
    nodes: Mutex<BTreeMap<(String, String), NodePayload>>,
    edges: Mutex<BTreeMap<(String, String, String), EdgeRecord>>,
}

impl OfflineSink {
    pub fn new(config: OfflineSinkConfig) -> Self {
        Self { config, nodes: Mutex::new(BTreeMap::new()), edges: Mutex::new(BTreeMap::new()) }
    }

    fn nodes_path(&self) -> PathBuf {
        if self.config.split {
            let mut p = self.config.path.clone();
            p.set_extension("nodes.bin");
            p
        } else {
            self.config.path.clone()
        }
    }

    fn edges_path(&self) -> PathBuf {
        if self.config.split {
            let mut p = self.config.path.clone();
            p.set_extension("edges.bin");
            p
        } else {
            self.config.path.clone()
        }
    }

    fn write_nodes_file(&self) -> Result<(), CgraphError> {
        let nodes = self.nodes.lock().unwrap();
        let values: Vec<&NodePayload> = nodes.values().collect();
        write_container(&self.nodes_path(), &values)
    }

    fn write_edges_file(&self) -> Result<(), CgraphError> {
        let edges = self.edges.lock().unwrap();
        let values: Vec<&EdgeRecord> = edges.values().collect();
        write_container(&self.edges_path(), &values)
    }

    fn write_combined(&self) -> Result<(), CgraphError> {
        let nodes = self.nodes.lock().unwrap();
        let edges = self.edges.lock().unwrap();
        let file = File::create(&self.config.path)
            .map_err(|e| CgraphError::Sink(format!("cannot create {}: {e}", self.config.path.display())))?;
        let mut writer = BufWriter::new(file);
        write_sequence(&mut writer, nodes.values().collect::<Vec<_>>().as_slice())?;
        write_sequence(&mut writer, edges.values().collect::<Vec<_>>().as_slice())?;
        writer.flush().map_err(|e| CgraphError::Sink(format!("flush failed: {e}")))
    }
}

fn write_container<T: Serialize>(path: &Path, items: &[&T]) -> Result<(), CgraphError> {
    let file =
        File::create(path).map_err(|e| CgraphError::Sink(format!("cannot create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    write_sequence(&mut writer, items)?;
    writer.flush().map_err(|e| CgraphError::Sink(format!("flush failed: {e}")))
}

fn write_sequence<W: Write, T: Serialize>(writer: &mut W, items: &[&T]) -> Result<(), CgraphError> {
    writer
        .write_all(&(items.len() as u64).to_le_bytes())
        .map_err(|e| CgraphError::Sink(format!("write failed: {e}")))?;
    for item in items {
        let bytes =
            bincode::serialize(item).map_err(|e| CgraphError::Sink(format!("serialize failed: {e}")))?;
        writer
            .write_all(&(bytes.len() as u64).to_le_bytes())
            .map_err(|e| CgraphError::Sink(format!("write failed: {e}")))?;
        writer.write_all(&bytes).map_err(|e| CgraphError::Sink(format!("write failed: {e}")))?;
    }
    Ok(())
}

/// Read a length-prefixed sequence, skipping (not failing on) records whose
/// tag this reader's `T` doesn't recognize (spec §6.2: "readers must
/// tolerate unknown tags by skipping them").
fn read_sequence<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<Vec<T>, CgraphError> {
    let mut count_buf = [0u8; 8];
    if reader.read_exact(&mut count_buf).is_err() {
        return Ok(Vec::new());
    }
    let count = u64::from_le_bytes(count_buf);
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut len_buf = [0u8; 8];
        reader.read_exact(&mut len_buf).map_err(|e| CgraphError::Sink(format!("truncated container: {e}")))?;
        let len = u64::from_le_bytes(len_buf) as usize;
        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes).map_err(|e| CgraphError::Sink(format!("truncated container: {e}")))?;
        match bincode::deserialize::<T>(&bytes) {
            Ok(item) => items.push(item),
            Err(e) => warn!(error = %e, "skipping container record with unrecognized tag"),
        }
    }
    Ok(items)
}

fn read_nodes(path: &Path) -> Result<Vec<NodePayload>, CgraphError> {
    let Ok(file) = File::open(path) else { return Ok(Vec::new()) };
    read_sequence(&mut BufReader::new(file))
}

impl Sink for OfflineSink {
    fn ensure_constraints(&self) -> Result<(), CgraphError> {
        Ok(())
    }

    fn connect(&self) -> Result<(), CgraphError> {
        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CgraphError::Configuration(format!("cannot create {}: {e}", parent.display())))?;
            }
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), CgraphError> {
        Ok(())
    }

    fn upsert_node(&self, node: NodePayload) -> Result<(), CgraphError> {
        let key = (node.label().as_str().to_string(), node.key().to_string());
        self.nodes.lock().unwrap().insert(key, node);
        Ok(())
    }

    fn upsert_edge(&self, from: NodeRef, kind: EdgeKind, to: NodeRef, props: BTreeMap<String, String>) -> Result<(), CgraphError> {
        let key = (from.key.clone(), kind.as_str().to_string(), to.key.clone());
        let record = EdgeRecord {
            from_label: from.label,
            from_key: from.key,
            kind,
            to_label: to.label,
            to_key: to.key,
            props,
        };
        self.edges.lock().unwrap().insert(key, record);
        Ok(())
    }

    fn flush_nodes(&self) -> Result<(), CgraphError> {
        if self.config.split {
            self.write_nodes_file()?;
            info!(count = self.nodes.lock().unwrap().len(), "flushed nodes to offline index");
        }
        Ok(())
    }

    fn flush_edges(&self) -> Result<(), CgraphError> {
        if self.config.split {
            self.write_edges_file()?;
        } else {
            self.write_combined()?;
        }
        info!(
            nodes = self.nodes.lock().unwrap().len(),
            edges = self.edges.lock().unwrap().len(),
            "flushed offline index"
        );
        Ok(())
    }

    fn clean(&self) -> Result<(), CgraphError> {
        self.nodes.lock().unwrap().clear();
        self.edges.lock().unwrap().clear();
        for path in [self.nodes_path(), self.edges_path()] {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<String>, CgraphError> {
        let in_memory: Vec<String> = self
            .nodes
            .lock()
            .unwrap()
            .values()
            .filter_map(|n| match n {
                NodePayload::Project { name } => Some(name.clone()),
                _ => None,
            })
            .collect();
        if !in_memory.is_empty() {
            return Ok(in_memory);
        }
        let names = read_nodes(&self.nodes_path())?
            .into_iter()
            .filter_map(|n| match n {
                NodePayload::Project { name } => Some(name),
                _ => None,
            })
            .collect();
        Ok(names)
    }

    fn delete_project(&self, name: &str) -> Result<(), CgraphError> {
        let prefix = format!("{name}.");
        let belongs = |key: &str| key == name || key.starts_with(&prefix);
        self.nodes.lock().unwrap().retain(|(_, key), _| !belongs(key));
        self.edges
            .lock()
            .unwrap()
            .retain(|(from, _, to), _| !belongs(from) && !belongs(to));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgraph_core::NodeRef;

    #[test]
    fn combined_round_trip_preserves_nodes_and_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        let sink = OfflineSink::new(OfflineSinkConfig { path: path.clone(), split: false });

        sink.connect().unwrap();
        sink.upsert_node(NodePayload::Project { name: "demo".to_string() }).unwrap();
        sink.upsert_node(NodePayload::Class {
            qn: "demo.pkg.Widget".to_string(),
            name: "Widget".to_string(),
            start_line: 1,
            end_line: 10,
            decorators: vec![],
            docstring: None,
        })
        .unwrap();
        sink.upsert_edge(
            NodeRef::new(NodeKind::Project, "demo"),
            EdgeKind::Contains,
            NodeRef::new(NodeKind::Class, "demo.pkg.Widget"),
            BTreeMap::new(),
        )
        .unwrap();
        sink.flush_edges().unwrap();

        let file = File::open(&path).unwrap();
        let mut reader = BufReader::new(file);
        let nodes: Vec<NodePayload> = read_sequence(&mut reader).unwrap();
        let edges: Vec<EdgeRecord> = read_sequence(&mut reader).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::Contains);
    }

    #[test]
    fn delete_project_removes_nodes_under_its_qn_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OfflineSink::new(OfflineSinkConfig { path: dir.path().join("index.bin"), split: false });
        sink.upsert_node(NodePayload::Project { name: "demo".to_string() }).unwrap();
        sink.upsert_node(NodePayload::Package { qn: "demo.pkg".to_string() }).unwrap();
        sink.upsert_node(NodePayload::Package { qn: "other.pkg".to_string() }).unwrap();

        sink.delete_project("demo").unwrap();

        let remaining = sink.nodes.lock().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.values().any(|n| matches!(n, NodePayload::Package { qn } if qn == "other.pkg")));
    }
}
