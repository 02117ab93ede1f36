//! Index maintenance commands

use crate::output::IndexProgress;
use anyhow::{anyhow, Context, Result};
use codesearch_core::error::IndexError;
use codesearch_core::{IndexEvent, SearchEngine};
use colored::Colorize;
use tokio::sync::broadcast;
use tracing::info;

/// Index every project root and wait for the build
pub async fn reindex_command(engine: &SearchEngine) -> Result<()> {
    let events = engine.subscribe();
    match engine.reindex().context("Failed to start indexing")? {
        Some(build_id) => wait_for_build(events, build_id).await,
        None => {
            println!(
                "The {} engine searches files directly and keeps no index.",
                engine.engine_kind().to_string().bold()
            );
            Ok(())
        }
    }
}

/// Drop the index and rebuild it from scratch
pub async fn purge_command(engine: &SearchEngine) -> Result<()> {
    let events = engine.subscribe();
    let build_id = engine
        .purge_index()
        .await
        .context("Failed to purge the index")?;
    wait_for_build(events, build_id).await
}

/// Print the paths the index covers
pub async fn list_command(engine: &SearchEngine) -> Result<()> {
    let paths = engine
        .list_indexed_paths()
        .await
        .context("Failed to list indexed paths")?;
    if paths.is_empty() {
        println!("{}", "Nothing indexed yet.".dimmed());
    }
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

async fn wait_for_build(mut events: broadcast::Receiver<IndexEvent>, build_id: u64) -> Result<()> {
    let progress = IndexProgress::new();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => {
                return Err(anyhow!("Index manager stopped before the build finished"));
            }
        };
        progress.handle(event);
        if let IndexEvent::Finished { build_id: id, success } = event {
            if id != build_id {
                continue;
            }
            if !success {
                return Err(IndexError::BuildFailed { build_id }.into());
            }
            info!(build_id, "Index build complete");
            println!("{}", "Index is up to date.".green());
            return Ok(());
        }
    }
}
