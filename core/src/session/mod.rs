//! Search session: one request, end to end
//!
//! A session brings the index up to date when the indexed engine is active,
//! runs the engine, and streams per-file results to a callback until the
//! engine exits or the session is cancelled.

pub mod filter;
pub mod parser;
pub mod types;

pub use filter::{is_missing_file_noise, ResultFilter};
pub use parser::OutputParser;
pub use types::{
    FileResult, MatchRange, MatchRecord, SearchEvent, SearchFailure, SearchFailureKind,
    SearchPattern, SearchRequest, SearchStatus, SearchSummary,
};

use crate::config::{EngineConfig, ExclusionSettings};
use crate::error::{EngineError, IndexError, Result};
use crate::indexer::{IndexEvent, IndexManager};
use crate::notify::{Notification, Notifier};
use crate::paths::{engine_path_args, PathArgs};
use crate::process;
use crate::project::Project;
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Collaborators shared by every session
#[derive(Clone)]
pub struct SessionContext {
    pub project: Arc<dyn Project>,
    pub indexer: Arc<IndexManager>,
    pub notifier: Arc<dyn Notifier>,
}

enum Freshness {
    Ready,
    Cancelled,
    Failed(String),
}

/// Executes exactly one search request
pub struct SearchSession {
    request: SearchRequest,
    config: EngineConfig,
    exclusions: ExclusionSettings,
    context: SessionContext,
    cancel: watch::Receiver<bool>,
}

impl SearchSession {
    /// `cancel` turning true, or its sender being dropped, cancels the session
    pub fn new(
        request: SearchRequest,
        config: EngineConfig,
        exclusions: ExclusionSettings,
        context: SessionContext,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            request,
            config,
            exclusions,
            context,
            cancel,
        }
    }

    /// Run the search, handing every result and error to `on_event`
    ///
    /// Settles exactly once. No event is delivered after cancellation is
    /// observed.
    pub async fn run<F>(self, mut on_event: F) -> Result<SearchSummary>
    where
        F: FnMut(SearchEvent) + Send,
    {
        if self.is_cancelled() {
            return Ok(SearchSummary::new(SearchStatus::Cancelled));
        }

        if self.config.kind.is_indexed() {
            match self.ensure_index_fresh().await {
                Freshness::Ready => {}
                Freshness::Cancelled => {
                    debug!("search cancelled while waiting for the index");
                    return Ok(SearchSummary::new(SearchStatus::Cancelled));
                }
                Freshness::Failed(reason) => {
                    on_event(SearchEvent::Error(SearchFailure::new(
                        SearchFailureKind::IndexBuild,
                        format!("Project indexing error: {}", reason),
                    )));
                    return Ok(SearchSummary::new(SearchStatus::Failed));
                }
            }
        }

        if self.is_cancelled() {
            return Ok(SearchSummary::new(SearchStatus::Cancelled));
        }

        let filter = ResultFilter::new(&self.exclusions, Arc::clone(&self.context.project))?;
        let roots = self.context.project.root_paths();
        let args = build_args(&self.config, &self.request, &roots);
        let tool = process::tool_name(&self.config.executable);
        let index_env = if self.config.kind.is_indexed() {
            self.config.index_env()
        } else {
            None
        };

        if self.config.debug {
            debug!(tool = %tool, args = ?args, "starting search");
        }
        let spawned =
            process::tool_command(&self.config.executable, &args, index_env).spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let install_url = self.config.kind.install_url();
                let error = process::spawn_error(&tool, install_url, e);
                warn!(tool = %tool, error = %error, "failed to start search engine");
                let kind = if error.is_not_found() {
                    self.context
                        .notifier
                        .notify(Notification::tool_not_found(&tool, install_url));
                    SearchFailureKind::ToolNotFound
                } else {
                    SearchFailureKind::Io
                };
                on_event(SearchEvent::Error(SearchFailure::new(kind, error.to_string())));
                return Ok(SearchSummary::new(SearchStatus::Failed));
            }
        };

        let stdout = child.stdout.take().ok_or_else(|| EngineError::StreamUnavailable {
            tool: tool.clone(),
            stream: "stdout".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| EngineError::StreamUnavailable {
            tool: tool.clone(),
            stream: "stderr".to_string(),
        })?;
        let mut out_lines = process::lines(stdout);
        let mut err_lines = process::lines(stderr);
        let mut parser = OutputParser::new(&self.request.pattern, filter);
        let mut summary = SearchSummary::new(SearchStatus::Completed);
        let mut cancel = self.cancel.clone();
        let mut cancelled = false;
        let mut stdout_open = true;
        let mut stderr_open = true;

        let status = loop {
            tokio::select! {
                biased;

                _ = cancel_requested(&mut cancel), if !cancelled => {
                    debug!(tool = %tool, "cancelling search");
                    cancelled = true;
                    stdout_open = false;
                    if let Err(e) = child.start_kill() {
                        debug!(tool = %tool, error = %e, "failed to kill search engine");
                    }
                }

                line = out_lines.next_segment(), if stdout_open => match line {
                    Ok(Some(raw)) => {
                        if let Some(file) = parser.push_line(&process::decode_line(&raw)) {
                            deliver(&mut summary, &mut on_event, file);
                        }
                    }
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        warn!(tool = %tool, error = %e, "failed to read search output");
                        stdout_open = false;
                    }
                },

                line = err_lines.next_segment(), if stderr_open => match line {
                    Ok(Some(raw)) => {
                        let line = process::decode_line(&raw);
                        if line.trim().is_empty() || is_missing_file_noise(&line) {
                            continue;
                        }
                        if self.config.debug {
                            warn!(tool = %tool, "{}", line);
                        }
                        if !cancelled {
                            on_event(SearchEvent::Error(SearchFailure::new(
                                SearchFailureKind::Stderr,
                                line,
                            )));
                        }
                    }
                    Ok(None) | Err(_) => stderr_open = false,
                },

                status = child.wait(), if cancelled || (!stdout_open && !stderr_open) => {
                    break status;
                }
            }
        };

        if !cancelled {
            if let Some(file) = parser.finish() {
                deliver(&mut summary, &mut on_event, file);
            }
        }

        match status {
            Ok(status) => summary.exit_code = status.code(),
            Err(e) => warn!(tool = %tool, error = %e, "failed to wait for search engine"),
        }
        if cancelled {
            summary.status = SearchStatus::Cancelled;
        }
        if self.config.debug {
            debug!(
                tool = %tool,
                exit_code = ?summary.exit_code,
                files = summary.files,
                "search finished"
            );
        }
        Ok(summary)
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.cancel.has_changed().is_err()
    }

    /// Run `fut` unless the session is cancelled first
    async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel_requested(&mut cancel) => None,
            output = fut => Some(output),
        }
    }

    /// Make sure every project root is indexed before searching
    async fn ensure_index_fresh(&self) -> Freshness {
        let indexer = &self.context.indexer;
        if self.until_cancelled(indexer.await_ready().wait()).await.is_none() {
            return Freshness::Cancelled;
        }

        let indexed = match self.until_cancelled(indexer.list_indexed_paths()).await {
            None => return Freshness::Cancelled,
            Some(Ok(paths)) => paths,
            // Reindexing would only report the missing tool a second time
            Some(Err(e)) if e.is_not_found() => {
                warn!(error = %e, "index tool unavailable, searching the existing index");
                return Freshness::Ready;
            }
            Some(Err(e)) => {
                warn!(error = %e, "failed to list indexed paths");
                BTreeSet::new()
            }
        };
        let missing: Vec<PathBuf> = self
            .context
            .project
            .root_paths()
            .into_iter()
            .filter(|root| !indexed.contains(root))
            .collect();
        if missing.is_empty() {
            return Freshness::Ready;
        }

        info!(missing = ?missing, "project roots missing from the index, reindexing");
        let mut events = indexer.subscribe();
        let build_id = match indexer.reindex() {
            Ok(build_id) => build_id,
            Err(e) if e.is_build_in_progress() => return self.wait_for_idle().await,
            Err(e) => return Freshness::Failed(e.to_string()),
        };

        loop {
            let event = match self.until_cancelled(events.recv()).await {
                None => return Freshness::Cancelled,
                Some(event) => event,
            };
            match event {
                Ok(IndexEvent::Finished { build_id: id, success }) if id == build_id => {
                    return if success {
                        Freshness::Ready
                    } else {
                        Freshness::Failed(IndexError::BuildFailed { build_id }.to_string())
                    };
                }
                Ok(IndexEvent::Started { build_id: id, .. }) if id != build_id => {
                    debug!(build_id, superseded_by = id, "index build superseded");
                    return self.wait_for_idle().await;
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => return self.wait_for_idle().await,
                Err(broadcast::error::RecvError::Closed) => {
                    return Freshness::Failed(IndexError::Interrupted.to_string());
                }
            }
        }
    }

    async fn wait_for_idle(&self) -> Freshness {
        match self
            .until_cancelled(self.context.indexer.await_ready().wait())
            .await
        {
            Some(()) => Freshness::Ready,
            None => Freshness::Cancelled,
        }
    }
}

/// Engine arguments for one request
///
/// Indexed: `[-i] -f <pathRegex> [opts…] -n <pattern>`.
/// Line-grep: `[opts…] [required…] [-i] [-n] <pattern> <paths…>`.
pub fn build_args(
    config: &EngineConfig,
    request: &SearchRequest,
    roots: &[PathBuf],
) -> Vec<String> {
    let pattern = &request.pattern;
    match engine_path_args(config.kind, &request.scope, roots) {
        PathArgs::Filter(path_regex) => {
            let mut args = Vec::new();
            if pattern.is_case_insensitive() {
                args.push("-i".to_string());
            }
            args.push("-f".to_string());
            args.push(path_regex);
            args.extend(config.extra_flags.iter().cloned());
            args.push("-n".to_string());
            args.push(pattern.source().to_string());
            args
        }
        PathArgs::Literal(paths) => {
            let mut args = config.extra_flags.clone();
            args.extend(config.kind.required_flags().iter().map(|f| f.to_string()));
            if pattern.is_case_insensitive() {
                args.push("-i".to_string());
            }
            if !config.kind.numbers_lines_by_default() {
                args.push("-n".to_string());
            }
            args.push(pattern.source().to_string());
            args.extend(paths);
            args
        }
    }
}

/// Resolves when cancellation is requested or every sender is gone
async fn cancel_requested(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

fn deliver<F>(summary: &mut SearchSummary, on_event: &mut F, file: FileResult)
where
    F: FnMut(SearchEvent),
{
    summary.files += 1;
    summary.matches += file.matches.len();
    on_event(SearchEvent::File(file));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineKind, MapConfig, SearchEnv};
    use crate::notify::NullNotifier;

    fn config(kind: EngineKind, extra: &[&str]) -> EngineConfig {
        EngineConfig {
            kind,
            executable: PathBuf::from(kind.tool()),
            index_executable: PathBuf::from("cindex"),
            extra_flags: extra.iter().map(|s| s.to_string()).collect(),
            index_flags: Vec::new(),
            index_dir: None,
            debug: false,
        }
    }

    fn request(source: &str, case_insensitive: bool, scope: &[&str]) -> SearchRequest {
        SearchRequest::new(
            SearchPattern::new(source, case_insensitive).unwrap(),
            scope.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_indexed_args_layout() {
        let roots = vec![PathBuf::from("/work/app")];
        let args = build_args(
            &config(EngineKind::Indexed, &["-maxcount", "5"]),
            &request("foo", true, &[]),
            &roots,
        );
        assert_eq!(
            args,
            vec!["-i", "-f", "^((/work/app))", "-maxcount", "5", "-n", "foo"]
        );
    }

    #[test]
    fn test_line_grep_args_layout() {
        let roots = vec![PathBuf::from("/work/app")];
        let sep = std::path::MAIN_SEPARATOR;

        let rg = build_args(
            &config(EngineKind::Ripgrep, &["--hidden"]),
            &request("foo", true, &[]),
            &roots,
        );
        assert_eq!(
            rg,
            vec![
                "--hidden".to_string(),
                "--no-heading".to_string(),
                "--with-filename".to_string(),
                "-i".to_string(),
                "-n".to_string(),
                "foo".to_string(),
                format!("/work/app{}", sep),
            ]
        );

        let ag = build_args(
            &config(EngineKind::SilverSearcher, &[]),
            &request("foo", false, &["/tmp/x"]),
            &roots,
        );
        assert_eq!(ag, vec!["foo", "/tmp/x"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let config_map = MapConfig::new();
        let project: Arc<dyn Project> =
            Arc::new(crate::project::Workspace::open(Vec::<PathBuf>::new()));
        let context = SessionContext {
            indexer: Arc::new(IndexManager::new(
                Arc::new(config_map.clone()),
                Arc::clone(&project),
                Arc::new(NullNotifier),
            )),
            project,
            notifier: Arc::new(NullNotifier),
        };
        let (tx, rx) = watch::channel(false);
        tx.send_replace(true);

        let session = SearchSession::new(
            request("foo", false, &[]),
            SearchEnv::new(&config_map).snapshot(),
            ExclusionSettings::default(),
            context,
            rx,
        );
        let mut events = Vec::new();
        let summary = session.run(|event| events.push(event)).await.unwrap();
        assert!(summary.is_cancelled());
        assert!(events.is_empty());
    }
}
