//! `cgraph` — thin CLI binary wiring configuration, logging, a sink, and
//! the pipeline together, and printing the run summary (spec §7 "User-
//! visible failure"). Grounded on the teacher's `moss` binary for the
//! `clap`-derive shape, and on the rest of the example pack (every other
//! repo's binary crate initializes `tracing_subscriber::fmt` the same way)
//! since the teacher itself doesn't use `tracing`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cgraph_core::PipelineConfig;
use cgraph_ingest::{OfflineSink, OfflineSinkConfig, OnlineSink, OnlineSinkConfig};

#[derive(Parser)]
#[command(name = "cgraph")]
#[command(about = "Build a code knowledge graph from a repository")]
struct Cli {
    /// Repository root to analyze
    root: PathBuf,

    /// Project name; defaults to the root directory's file name
    #[arg(long)]
    project: Option<String>,

    /// Path to a `cgraph.toml` config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    sink: SinkArgs,
}

#[derive(Subcommand)]
enum SinkArgs {
    /// Write to a Bolt-protocol graph database (Memgraph or compatible)
    Online {
        #[arg(long, default_value = "bolt://127.0.0.1:7687")]
        uri: String,
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Write the offline binary index to disk
    Offline {
        /// Output container path
        out: PathBuf,
        /// Write nodes and edges to separate files instead of one container
        #[arg(long)]
        split: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path).context("loading cgraph.toml")?,
        None => PipelineConfig::default(),
    };

    let project_name = cli.project.clone().unwrap_or_else(|| {
        cli.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    });

    let summary = match cli.sink {
        SinkArgs::Online { uri, user, password } => {
            let sink = OnlineSink::new(OnlineSinkConfig { uri, user, password, batch_size: config.batch_size })
                .context("initializing online sink")?;
            cgraph_analyze::Pipeline::new(project_name, cli.root, &config).run(&sink)
        }
        SinkArgs::Offline { out, split } => {
            let sink = OfflineSink::new(OfflineSinkConfig { path: out, split });
            cgraph_analyze::Pipeline::new(project_name, cli.root, &config).run(&sink)
        }
    };

    match summary {
        Ok(summary) => {
            print!("{summary}");
            if summary.fatal_error().is_some() {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("run aborted: {e}");
            std::process::exit(1);
        }
    }
}
