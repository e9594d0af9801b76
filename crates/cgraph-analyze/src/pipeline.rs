//! The pipeline orchestrator (spec §2, §5): sequences the walker and the
//! four analytic passes over a `Sink`, freezing the symbol registry once
//! structure and inheritance are known and before the parallel reference
//! pass reads it.

use cgraph_core::{CgraphError, PipelineConfig, Sink, SinkSession};
use cgraph_parse::ParserPool;
use cgraph_registry::SymbolRegistry;
use cgraph_walk::{IgnoreRules, RepoWalker};
use std::path::Path;
use tracing::info;

use crate::{imports, inheritance, reference, run_summary::RunSummary, structural};

/// Owns nothing across runs: a fresh `Pipeline` is built per invocation
/// (spec §5: "a run is a single pass over a fixed repository snapshot").
pub struct Pipeline<'a> {
    project_name: String,
    root: std::path::PathBuf,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(project_name: impl Into<String>, root: impl Into<std::path::PathBuf>, config: &'a PipelineConfig) -> Self {
        Self { project_name: project_name.into(), root: root.into(), config }
    }

    /// Run the full pipeline against `sink`, returning the run summary
    /// whether or not it completed cleanly (spec §7: "failures are
    /// reported, not swallowed; the caller always gets a summary").
    pub fn run(&self, sink: &dyn Sink) -> Result<RunSummary, CgraphError> {
        let summary = RunSummary::new();

        let session = match SinkSession::acquire(sink) {
            Ok(s) => s,
            Err(e) => {
                summary.set_fatal_error(e.to_string());
                return Err(e);
            }
        };

        let mut rules = IgnoreRules::load(&self.root)
            .map_err(|e| CgraphError::Configuration(format!("failed to read .cgrignore: {e}")))?;
        rules.extend(&self.config.exclude, &self.config.unignore);

        let files = match RepoWalker::new(self.root.as_path(), rules).walk() {
            Ok(f) => f,
            Err(e) => {
                summary.set_fatal_error(e.to_string());
                return Err(e);
            }
        };
        info!(count = files.len(), "repository walk complete");

        let pool = ParserPool::new();
        let registry = SymbolRegistry::new();

        let structural_out =
            structural::run(&self.project_name, &self.root, &files, &pool, &registry, session.sink(), &summary);
        info!(
            modules = structural_out.modules.len(),
            classes = structural_out.classes.len(),
            functions = structural_out.functions.len(),
            "structural pass complete"
        );

        let import_index = imports::run(
            &self.project_name,
            &structural_out.modules,
            &pool,
            &registry,
            self.config,
            session.sink(),
            &summary,
        );

        inheritance::run(
            &structural_out.classes,
            &structural_out.rust_impls,
            &import_index,
            &registry,
            self.config,
            session.sink(),
            &summary,
        );

        registry.freeze();

        reference::run(
            &structural_out.classes,
            &structural_out.functions,
            &pool,
            &registry,
            &import_index,
            self.config,
            session.sink(),
            &summary,
        );

        if let Err(e) = session.close() {
            summary.set_fatal_error(e.to_string());
            return Err(e);
        }

        Ok(summary)
    }
}

/// Convenience for callers that already have an ignore-rules-free walk
/// (e.g. tests constructing a fixture directory with no `.cgrignore`).
pub fn run_on_path(project_name: &str, root: &Path, config: &PipelineConfig, sink: &dyn Sink) -> Result<RunSummary, CgraphError> {
    Pipeline::new(project_name, root, config).run(sink)
}
