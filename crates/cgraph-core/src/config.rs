//! Pipeline configuration (spec §1 ambient stack): batch size, the two
//! open-question knobs (speculative simple-name-fallback edges, a second
//! pass over deferred wildcard-import bindings) and the recursion ceiling
//! for the type-inference engine (spec §9).

use crate::error::CgraphError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ingestor buffer flush threshold (spec §4.8 default 1000).
    pub batch_size: usize,
    /// Emit a CALLS edge to every simple-name match when the receiver type
    /// can't be resolved, trading precision for recall (spec §9, open
    /// question: "dynamic dispatch... should be configurable").
    pub speculative_edges: bool,
    /// Run a second pass resolving wildcard-import deferred bindings once
    /// every module has been scanned (spec §9, open question on wildcard
    /// imports). `false` leaves them unresolved.
    pub resolve_wildcard_imports: bool,
    /// Depth ceiling for recursive type-inference lookups; beyond this,
    /// lookups return "unknown" rather than recursing further (spec §9).
    pub max_type_inference_depth: usize,
    /// Extra `.cgrignore`-style exclude patterns layered on top of the
    /// walker's defaults and any repo-root `.cgrignore` file.
    pub exclude: Vec<String>,
    /// Extra re-include patterns, same semantics as a `.cgrignore` `!` line.
    pub unignore: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            speculative_edges: false,
            resolve_wildcard_imports: true,
            max_type_inference_depth: 64,
            exclude: Vec::new(),
            unignore: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, CgraphError> {
        toml::from_str(contents).map_err(|e| CgraphError::Configuration(format!("invalid config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, CgraphError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CgraphError::Configuration(format!("cannot read config {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_batch_size() {
        assert_eq!(PipelineConfig::default().batch_size, 1000);
    }

    #[test]
    fn parses_partial_overrides() {
        let cfg = PipelineConfig::from_toml_str("batch_size = 500\nspeculative_edges = true\n").unwrap();
        assert_eq!(cfg.batch_size, 500);
        assert!(cfg.speculative_edges);
        assert!(cfg.resolve_wildcard_imports);
    }
}
