//! The ingestor sink interface (spec §4.8, §6.1). Living in `cgraph-core`
//! lets both the analysis passes (`cgraph-analyze`, which only ever emits
//! through `&dyn Sink`) and the concrete backends (`cgraph-ingest`) depend
//! on the trait without a circular crate dependency.

use crate::error::CgraphError;
use crate::model::{EdgeKind, NodePayload, NodeRef};
use std::collections::BTreeMap;

/// A buffered, batched writer to an arbitrary sink (online graph database or
/// offline binary index). Implementations own their own buffering and
/// dedup; callers just enqueue.
pub trait Sink: Send + Sync {
    /// Idempotent schema/constraint setup (e.g. uniqueness constraints on
    /// each node label's key field). Called once per `connect`.
    fn ensure_constraints(&self) -> Result<(), CgraphError>;

    fn connect(&self) -> Result<(), CgraphError>;
    fn disconnect(&self) -> Result<(), CgraphError>;

    /// Enqueue a node upsert. Automatically flushes the node buffer once it
    /// reaches the configured batch size.
    fn upsert_node(&self, node: NodePayload) -> Result<(), CgraphError>;

    /// Enqueue an edge upsert. `from`/`to` are `(label, key)` refs, not
    /// direct pointers, so edges can be enqueued before both endpoints are
    /// flushed (spec §3.5: "nodes are always flushed before edges").
    fn upsert_edge(
        &self,
        from: NodeRef,
        kind: EdgeKind,
        to: NodeRef,
        props: BTreeMap<String, String>,
    ) -> Result<(), CgraphError>;

    fn flush_nodes(&self) -> Result<(), CgraphError>;
    fn flush_edges(&self) -> Result<(), CgraphError>;

    fn flush_all(&self) -> Result<(), CgraphError> {
        self.flush_nodes()?;
        self.flush_edges()
    }

    /// Remove all data written by this sink (used by test fixtures and
    /// before a clean re-run).
    fn clean(&self) -> Result<(), CgraphError>;

    fn list_projects(&self) -> Result<Vec<String>, CgraphError>;
    fn delete_project(&self, name: &str) -> Result<(), CgraphError>;
}

/// Scoped-acquisition guard: connects on construction, flushes and
/// disconnects on drop even if the caller unwinds via an error (spec §3.5,
/// §5: "the ingestor's scope guard guarantees a best-effort flush on
/// exit"). Grounded on the original's `MemgraphIngestor.__enter__`/
/// `__exit__`.
pub struct SinkSession<'a> {
    sink: &'a dyn Sink,
    closed: bool,
}

impl<'a> SinkSession<'a> {
    pub fn acquire(sink: &'a dyn Sink) -> Result<Self, CgraphError> {
        sink.connect()?;
        sink.ensure_constraints()?;
        Ok(Self { sink, closed: false })
    }

    /// Explicit flush-and-disconnect. Prefer this over relying on `Drop`
    /// when the caller needs to observe the result of the final flush.
    pub fn close(mut self) -> Result<(), CgraphError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), CgraphError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let flush_result = self.sink.flush_all();
        let disconnect_result = self.sink.disconnect();
        flush_result.and(disconnect_result)
    }

    pub fn sink(&self) -> &dyn Sink {
        self.sink
    }
}

impl Drop for SinkSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!(error = %e, "sink session failed to flush/disconnect on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodePayload;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<&'static str>>,
    }

    impl Sink for RecordingSink {
        fn ensure_constraints(&self) -> Result<(), CgraphError> {
            self.events.lock().unwrap().push("constraints");
            Ok(())
        }
        fn connect(&self) -> Result<(), CgraphError> {
            self.events.lock().unwrap().push("connect");
            Ok(())
        }
        fn disconnect(&self) -> Result<(), CgraphError> {
            self.events.lock().unwrap().push("disconnect");
            Ok(())
        }
        fn upsert_node(&self, _node: NodePayload) -> Result<(), CgraphError> {
            Ok(())
        }
        fn upsert_edge(
            &self,
            _from: NodeRef,
            _kind: EdgeKind,
            _to: NodeRef,
            _props: BTreeMap<String, String>,
        ) -> Result<(), CgraphError> {
            Ok(())
        }
        fn flush_nodes(&self) -> Result<(), CgraphError> {
            self.events.lock().unwrap().push("flush_nodes");
            Ok(())
        }
        fn flush_edges(&self) -> Result<(), CgraphError> {
            self.events.lock().unwrap().push("flush_edges");
            Ok(())
        }
        fn clean(&self) -> Result<(), CgraphError> {
            Ok(())
        }
        fn list_projects(&self) -> Result<Vec<String>, CgraphError> {
            Ok(Vec::new())
        }
        fn delete_project(&self, _name: &str) -> Result<(), CgraphError> {
            Ok(())
        }
    }

    #[test]
    fn session_flushes_and_disconnects_on_drop() {
        let sink = RecordingSink::default();
        {
            let _session = SinkSession::acquire(&sink).unwrap();
        }
        let events = sink.events.lock().unwrap().clone();
        assert_eq!(events, vec!["connect", "constraints", "flush_nodes", "flush_edges", "disconnect"]);
    }
}
