//! CLI argument definitions using clap.
//!
//! - apimine cluster a.json b.json -o out.json   # harvest + clustering pipeline
//! - apimine search corpus.json "<query>"        # rank a corpus against a query
//! - apimine batch corpus.json queries.json      # per-depth search statistics
//! - apimine complete corpus.json "<query>"      # fill a query's unknown steps
//! - apimine sequences corpus.json 3             # top-k call sequences of one history
//! - apimine stats corpus.json                   # per-history statistics
//! - apimine dot corpus.json 3                   # Graphviz rendering

use std::path::PathBuf;

use apimine_core::config::CliOverrides;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "apimine")]
#[command(about = "Mine, cluster and search API usage patterns")]
#[command(version)]
pub struct Cli {
    /// Project root holding apimine.toml
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(long, global = true, env = "APIMINE_WORKERS_THREADS")]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load sample collections and run the clustering pipeline over them
    Cluster {
        /// Collection files to harvest
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Where to write the clustered collection
        #[arg(short, long)]
        output: PathBuf,

        /// Comma-separated stage names, overriding the configured order
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<String>>,

        /// Per-stage timeout in milliseconds
        #[arg(long)]
        stage_timeout_ms: Option<u64>,
    },

    /// Rank the histories of a corpus against a query
    Search {
        corpus: PathBuf,

        /// Whitespace-separated steps: `Owner.name(desc)`, `static:...` or `?`
        query: String,
    },

    /// Run every history of a query collection against a corpus
    Batch { corpus: PathBuf, queries: PathBuf },

    /// Fill the unknown steps of a query from a corpus and print it as DOT
    Complete { corpus: PathBuf, query: String },

    /// Heaviest call sequences of one history
    Sequences {
        corpus: PathBuf,

        /// Index of the history in the corpus
        index: usize,

        /// Only keep sequences that include this query
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        top_k: Option<usize>,

        /// How often a walk may visit the same node
        #[arg(long)]
        max_repeat: Option<u32>,
    },

    /// Print per-history statistics
    Stats { corpus: PathBuf },

    /// Render one history as Graphviz DOT
    Dot { corpus: PathBuf, index: usize },
}

impl Cli {
    /// Config overrides carried by the flags of this invocation.
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            threads: self.threads,
            ..Default::default()
        };
        match &self.command {
            Commands::Cluster {
                stages,
                stage_timeout_ms,
                ..
            } => {
                overrides.stages = stages.clone();
                overrides.stage_timeout_ms = *stage_timeout_ms;
            }
            Commands::Sequences {
                top_k, max_repeat, ..
            } => {
                overrides.top_k = *top_k;
                overrides.max_repeat = *max_repeat;
            }
            _ => {}
        }
        overrides
    }
}
