//! The run summary (spec §7: "User-visible failure"): the counters the
//! caller sees after a run, whether it completed or aborted.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct RunSummary {
    pub files_visited: AtomicUsize,
    pub files_parsed: AtomicUsize,
    pub nodes_emitted: AtomicUsize,
    pub edges_emitted: AtomicUsize,
    pub edges_dropped: AtomicUsize,
    fatal_error: std::sync::Mutex<Option<String>>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file_visited(&self) {
        self.files_visited.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_file_parsed(&self) {
        self.files_parsed.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_node(&self) {
        self.nodes_emitted.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_nodes(&self, n: usize) {
        self.nodes_emitted.fetch_add(n, Ordering::Relaxed);
    }
    pub fn record_edge(&self) {
        self.edges_emitted.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_edge_dropped(&self) {
        self.edges_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the run's fatal error, if any (spec §7: configuration/sink
    /// errors propagate to the caller; this is what the caller prints).
    pub fn set_fatal_error(&self, message: impl Into<String>) {
        *self.fatal_error.lock().expect("summary lock poisoned") = Some(message.into());
    }

    pub fn fatal_error(&self) -> Option<String> {
        self.fatal_error.lock().expect("summary lock poisoned").clone()
    }

    fn load(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "files visited: {}", Self::load(&self.files_visited))?;
        writeln!(f, "files parsed:  {}", Self::load(&self.files_parsed))?;
        writeln!(f, "nodes emitted: {}", Self::load(&self.nodes_emitted))?;
        writeln!(f, "edges emitted: {}", Self::load(&self.edges_emitted))?;
        writeln!(f, "edges dropped: {}", Self::load(&self.edges_dropped))?;
        match self.fatal_error() {
            Some(err) => writeln!(f, "fatal error:   {err}"),
            None => writeln!(f, "fatal error:   none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let summary = RunSummary::new();
        summary.record_file_visited();
        summary.record_file_visited();
        summary.record_node();
        summary.record_edge_dropped();
        assert_eq!(summary.files_visited.load(Ordering::Relaxed), 2);
        assert_eq!(summary.nodes_emitted.load(Ordering::Relaxed), 1);
        assert_eq!(summary.edges_dropped.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn display_includes_fatal_error_when_set() {
        let summary = RunSummary::new();
        summary.set_fatal_error("sink unreachable");
        let rendered = summary.to_string();
        assert!(rendered.contains("sink unreachable"));
    }
}
