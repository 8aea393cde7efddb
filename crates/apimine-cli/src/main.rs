//! apimine command-line interface.
//!
//! Reads collections written by `Collection::save`, runs the clustering
//! pipeline or the search operations over them, and prints JSON or DOT on
//! stdout. Logging goes through `tracing`; set `APIMINE_LOG` to adjust it.

mod args;
mod commands;
mod error;

use std::process::ExitCode;
use std::sync::Arc;

use apimine_core::errors::ErrorCode;
use apimine_core::tracing::init_tracing;
use apimine_core::MinerContext;
use clap::Parser;

use args::{Cli, Commands};
use error::CliError;

fn run(cli: Cli) -> Result<String, CliError> {
    let overrides = cli.overrides();
    let context = Arc::new(MinerContext::load(&cli.root, Some(&overrides))?);
    match &cli.command {
        Commands::Cluster { inputs, output, .. } => commands::cluster(&context, inputs, output),
        Commands::Search { corpus, query } => commands::search(&context, corpus, query),
        Commands::Batch { corpus, queries } => commands::batch(&context, corpus, queries),
        Commands::Complete { corpus, query } => commands::complete(&context, corpus, query),
        Commands::Sequences {
            corpus,
            index,
            query,
            ..
        } => commands::sequences(&context, corpus, *index, query.as_deref()),
        Commands::Stats { corpus } => commands::stats(&context, corpus),
        Commands::Dot { corpus, index } => commands::dot(&context, corpus, *index),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            eprintln!("{}", e.coded_string());
            ExitCode::FAILURE
        }
    }
}
