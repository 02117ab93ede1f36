//! Search command

use crate::output::{IndexProgress, Printer};
use anyhow::{Context, Result};
use codesearch_core::{ScanOptions, SearchEngine, SearchPattern, SearchStatus, SearchSummary};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

/// Arguments of `codesearch search`
pub struct SearchArgs {
    pub pattern: String,
    pub paths: Vec<String>,
    pub ignore_case: bool,
    pub json: bool,
}

/// Run one search; exit status 0 with matches, 1 without, 2 on failure
pub async fn search_command(engine: Arc<SearchEngine>, args: SearchArgs) -> Result<ExitCode> {
    info!(engine = %engine.engine_kind(), pattern = %args.pattern, "Starting search");

    let pattern = SearchPattern::new(&args.pattern, args.ignore_case)
        .with_context(|| format!("Invalid search pattern: {}", args.pattern))?;
    let printer = Printer::new(args.json);

    let progress = (!args.json).then(|| IndexProgress::new().follow(engine.subscribe()));

    let handle = engine.scan(
        pattern,
        ScanOptions::with_paths(args.paths),
        move |event| printer.print_event(&event),
    );

    let canceller = handle.canceller();
    ctrlc::set_handler(move || canceller.cancel()).context("Failed to install Ctrl-C handler")?;

    let summary = handle.await.context("Search failed")?;
    if let Some(progress) = progress {
        progress.abort();
    }
    debug!(?summary, "search settled");

    printer.print_summary(&summary);
    Ok(ExitCode::from(exit_status(&summary)))
}

fn exit_status(summary: &SearchSummary) -> u8 {
    match summary.status {
        SearchStatus::Completed if summary.matches > 0 => 0,
        // grep-style engines exit 2 or above on errors such as a bad pattern
        SearchStatus::Completed if summary.exit_code.is_some_and(|code| code >= 2) => 2,
        SearchStatus::Completed => 1,
        SearchStatus::Failed => 2,
        SearchStatus::Cancelled => 130,
    }
}
