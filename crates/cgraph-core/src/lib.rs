//! Shared types for the code knowledge graph pipeline: qualified names,
//! the node/edge data model (spec §3), language identification, and the
//! crate-wide error taxonomy (spec §7).

mod config;
mod error;
mod language;
mod model;
mod qn;
mod sink;

pub use config::PipelineConfig;
pub use error::CgraphError;
pub use language::{FileClass, SourceLanguage};
pub use model::{EdgeKind, NodeKind, NodePayload, NodeRef, Visibility};
pub use qn::QualifiedName;
pub use sink::{Sink, SinkSession};
