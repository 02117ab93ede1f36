//! # codesearch CLI
//!
//! Command-line front end for codesearch: project-wide search over external
//! engines.
//!
//! ## Usage
//!
//! - `codesearch search <pattern> [paths...]` - Search the project
//! - `codesearch reindex` - Index the project roots
//! - `codesearch purge` - Rebuild the index from scratch
//! - `codesearch list` - Show indexed paths
//! - `codesearch engines` - Show supported engines and their executables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codesearch_core::{ConfigProvider, EngineKind, SearchEngine, Workspace};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod commands;
mod config;
mod output;

use commands::{
    engines_command, list_command, purge_command, reindex_command, search_command, SearchArgs,
};
use config::CliConfigLoader;
use output::ConsoleNotifier;

/// codesearch - Project search over external engines
#[derive(Parser)]
#[command(name = "codesearch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Project-wide search with codesearch, ripgrep, ag or pt")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project root (repeatable, defaults to the current directory)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Search engine override (csearch, rg, ag, pt)
    #[arg(short, long, global = true, env = "CODESEARCH_ENGINE")]
    engine: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug mode: log engine invocations and output
    #[arg(short = 'd', long = "debug", global = true)]
    debug_output: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the project for a regular expression
    Search {
        /// Regular expression to search for
        pattern: String,

        /// Limit the search to these paths (absolute, or relative to a root)
        paths: Vec<String>,

        /// Case-insensitive search
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Print one JSON event per line
        #[arg(long)]
        json: bool,
    },

    /// Index the project roots
    Reindex,

    /// Drop the index and rebuild it
    Purge,

    /// List indexed paths
    List,

    /// Show supported engines and where their executables resolve
    Engines,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> Result<CliConfigLoader> {
    let mut loader = CliConfigLoader::new().with_debug_override(cli.debug_output);

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(engine) = &cli.engine {
        let kind: EngineKind = engine
            .parse()
            .with_context(|| format!("Unknown engine: {}", engine))?;
        loader = loader.with_engine_override(kind);
    }

    Ok(loader)
}

fn project_roots(cli: &Cli) -> Result<Vec<PathBuf>> {
    if cli.roots.is_empty() {
        return Ok(vec![
            std::env::current_dir().context("Failed to read the current directory")?
        ]);
    }
    for root in &cli.roots {
        if !root.is_dir() {
            anyhow::bail!("Project root is not a directory: {}", root.display());
        }
    }
    Ok(cli.roots.clone())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    codesearch_core::init_tracing_with_debug(cli.verbose || cli.debug_output);

    let settings = build_config_loader(&cli)?
        .load()
        .context("Failed to load configuration")?;
    if let Some(source) = settings.source() {
        tracing::debug!(path = %source.display(), "configuration loaded");
    }
    let settings: Arc<dyn ConfigProvider> = Arc::new(settings);

    if let Commands::Engines = cli.command {
        engines_command(settings.as_ref())?;
        return Ok(ExitCode::SUCCESS);
    }

    let project = Arc::new(Workspace::open(project_roots(&cli)?));
    let engine = Arc::new(SearchEngine::with_notifier(
        settings,
        project,
        Arc::new(ConsoleNotifier),
    ));

    match cli.command {
        Commands::Search {
            pattern,
            paths,
            ignore_case,
            json,
        } => {
            search_command(
                engine,
                SearchArgs {
                    pattern,
                    paths,
                    ignore_case,
                    json,
                },
            )
            .await
        }
        Commands::Reindex => reindex_command(&engine).await.map(|_| ExitCode::SUCCESS),
        Commands::Purge => purge_command(&engine).await.map(|_| ExitCode::SUCCESS),
        Commands::List => list_command(&engine).await.map(|_| ExitCode::SUCCESS),
        Commands::Engines => Ok(ExitCode::SUCCESS),
    }
}
