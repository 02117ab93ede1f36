//! Search facade
//!
//! [`SearchEngine`] is the entry point for hosts: it starts sessions, forwards
//! index maintenance to the process-wide [`IndexManager`], and exposes its
//! lifecycle events.

use crate::config::{ConfigProvider, EngineKind, SearchEnv};
use crate::error::{Error, Result};
use crate::indexer::{IndexEvent, IndexManager};
use crate::notify::{Notifier, NullNotifier};
use crate::project::Project;
use crate::session::{
    SearchEvent, SearchPattern, SearchRequest, SearchSession, SearchSummary, SessionContext,
};
use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Options for one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Scope specifiers; empty searches the whole project
    pub paths: Vec<String>,
}

impl ScanOptions {
    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// Cancels a running scan; dropping every copy cancels it too
#[derive(Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Completion of a scan, with the ability to cancel it
///
/// Resolves to the session summary once the engine has exited.
pub struct SearchHandle {
    completion: BoxFuture<'static, Result<SearchSummary>>,
    canceller: Canceller,
}

impl SearchHandle {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// A cancel handle that outlives borrows of this handle
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }
}

impl Future for SearchHandle {
    type Output = Result<SearchSummary>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.completion.poll_unpin(cx)
    }
}

/// Project search over the configured external engine
pub struct SearchEngine {
    config: Arc<dyn ConfigProvider>,
    context: SessionContext,
}

impl SearchEngine {
    pub fn new(config: Arc<dyn ConfigProvider>, project: Arc<dyn Project>) -> Self {
        Self::with_notifier(config, project, Arc::new(NullNotifier))
    }

    pub fn with_notifier(
        config: Arc<dyn ConfigProvider>,
        project: Arc<dyn Project>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let indexer = Arc::new(IndexManager::new(
            Arc::clone(&config),
            Arc::clone(&project),
            Arc::clone(&notifier),
        ));
        Self {
            config,
            context: SessionContext {
                project,
                indexer,
                notifier,
            },
        }
    }

    /// Engine the configuration currently selects
    pub fn engine_kind(&self) -> EngineKind {
        SearchEnv::new(self.config.as_ref()).engine_kind()
    }

    /// Start a search; `on_event` receives results as files complete
    ///
    /// Must be called from within a tokio runtime.
    pub fn scan<F>(&self, pattern: SearchPattern, options: ScanOptions, on_event: F) -> SearchHandle
    where
        F: FnMut(SearchEvent) + Send + 'static,
    {
        let env = SearchEnv::new(self.config.as_ref());
        let config = env.snapshot();
        debug!(
            engine = %config.kind,
            pattern = %pattern.source(),
            paths = ?options.paths,
            "scan requested"
        );

        let (tx, rx) = watch::channel(false);
        let session = SearchSession::new(
            SearchRequest::new(pattern, options.paths),
            config,
            env.exclusions(),
            self.context.clone(),
            rx,
        );
        let task = tokio::spawn(session.run(on_event));
        let completion = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(Error::Generic(format!("search task failed: {}", e))),
            }
        }
        .boxed();

        SearchHandle {
            completion,
            canceller: Canceller { tx: Arc::new(tx) },
        }
    }

    /// Reindex the project; `None` when the active engine has no index
    pub fn reindex(&self) -> Result<Option<u64>> {
        if !self.engine_kind().is_indexed() {
            debug!("reindex skipped, active engine has no index");
            return Ok(None);
        }
        self.context.indexer.reindex().map(Some)
    }

    pub async fn purge_index(&self) -> Result<u64> {
        self.context.indexer.purge_index().await
    }

    pub async fn list_indexed_paths(&self) -> Result<BTreeSet<PathBuf>> {
        self.context.indexer.list_indexed_paths().await
    }

    /// Index lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.context.indexer.subscribe()
    }

    pub fn indexer(&self) -> &Arc<IndexManager> {
        &self.context.indexer
    }
}

/// Hook a host installs in front of its own project scan
///
/// While active, scans go to the [`SearchEngine`]; while inactive, `scan`
/// returns `None` and the host runs its default search.
pub struct ScanInterceptor {
    engine: Arc<SearchEngine>,
    active: AtomicBool,
    last_scan_intercepted: AtomicBool,
}

impl ScanInterceptor {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self {
            engine,
            active: AtomicBool::new(false),
            last_scan_intercepted: AtomicBool::new(false),
        }
    }

    pub fn set_active(&self, active: bool) {
        if self.active.swap(active, Ordering::SeqCst) != active {
            debug!(active, "scan interception toggled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn scan<F>(
        &self,
        pattern: SearchPattern,
        options: ScanOptions,
        on_event: F,
    ) -> Option<SearchHandle>
    where
        F: FnMut(SearchEvent) + Send + 'static,
    {
        let active = self.is_active();
        self.last_scan_intercepted.store(active, Ordering::SeqCst);
        active.then(|| self.engine.scan(pattern, options, on_event))
    }

    /// True when the last scan ran on a different backend than the current one
    pub fn should_rerun_search(&self) -> bool {
        self.last_scan_intercepted.load(Ordering::SeqCst) != self.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{keys, MapConfig};
    use crate::project::Workspace;

    fn engine(config: MapConfig) -> SearchEngine {
        SearchEngine::new(
            Arc::new(config),
            Arc::new(Workspace::open(Vec::<PathBuf>::new())),
        )
    }

    #[test]
    fn test_reindex_is_noop_for_line_grep_engines() {
        let engine = engine(MapConfig::new().with(keys::ENGINE, "rg"));
        assert_eq!(engine.engine_kind(), EngineKind::Ripgrep);
        assert_eq!(engine.reindex().unwrap(), None);
        assert!(!engine.indexer().is_building());
    }

    #[tokio::test]
    async fn test_interceptor_falls_back_when_inactive() {
        let interceptor = ScanInterceptor::new(Arc::new(engine(MapConfig::new())));
        let pattern = SearchPattern::new("foo", false).unwrap();
        assert!(interceptor
            .scan(pattern, ScanOptions::default(), |_| {})
            .is_none());
        assert!(!interceptor.should_rerun_search());

        interceptor.set_active(true);
        assert!(interceptor.should_rerun_search());
        interceptor.set_active(false);
        assert!(!interceptor.should_rerun_search());
    }

    #[test]
    fn test_scan_options() {
        let options = ScanOptions::with_paths(["app/src", "/tmp"]);
        assert_eq!(options.paths, vec!["app/src", "/tmp"]);
        assert!(ScanOptions::default().paths.is_empty());
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use crate::config::{keys, MapConfig};
    use crate::session::{SearchFailureKind, SearchStatus};
    use crate::testutil::Sandbox;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::timeout;

    fn engine(sandbox: &Sandbox, config: MapConfig) -> Arc<SearchEngine> {
        Arc::new(SearchEngine::with_notifier(
            Arc::new(config),
            sandbox.project(),
            sandbox.notifier.clone(),
        ))
    }

    #[tokio::test]
    async fn test_scan_collects_results() {
        let sandbox = Sandbox::new();
        let rg = sandbox.script("rg", r"printf 'a.txt:1:foo foo\nb.txt:2:x foo\n'");
        let config = sandbox
            .config()
            .with(keys::ENGINE, "rg")
            .with(&keys::executable_override("rg"), rg.to_str().unwrap());
        let engine = engine(&sandbox, config);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = engine.scan(
            SearchPattern::new("foo", false).unwrap(),
            ScanOptions::default(),
            move |event| sink.lock().unwrap().push(event),
        );
        let summary = handle.await.unwrap();

        assert_eq!(summary.status, SearchStatus::Completed);
        assert_eq!((summary.files, summary.matches), (2, 3));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_settles_once() {
        let sandbox = Sandbox::new();
        let rg = sandbox.script("rg", "exec sleep 30");
        let config = sandbox
            .config()
            .with(keys::ENGINE, "rg")
            .with(&keys::executable_override("rg"), rg.to_str().unwrap());
        let engine = engine(&sandbox, config);

        let handle = engine.scan(
            SearchPattern::new("foo", false).unwrap(),
            ScanOptions::default(),
            |_| {},
        );
        let canceller = handle.canceller();
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
        assert!(canceller.is_cancelled());

        let summary = timeout(Duration::from_secs(5), handle)
            .await
            .expect("cancelled scan did not settle")
            .unwrap();
        assert!(summary.is_cancelled());
    }

    #[tokio::test]
    async fn test_interceptor_serves_scans_while_active() {
        let sandbox = Sandbox::new();
        let config = sandbox
            .config()
            .with(keys::ENGINE, "ag")
            .with(&keys::executable_override("ag"), "/nonexistent/bin/ag");
        let interceptor = ScanInterceptor::new(engine(&sandbox, config));
        interceptor.set_active(true);

        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        let handle = interceptor
            .scan(
                SearchPattern::new("foo", false).unwrap(),
                ScanOptions::default(),
                move |event| {
                    if let SearchEvent::Error(failure) = event {
                        sink.lock().unwrap().push(failure.kind);
                    }
                },
            )
            .expect("active interceptor serves the scan");
        let summary = handle.await.unwrap();

        assert_eq!(summary.status, SearchStatus::Failed);
        assert_eq!(*failures.lock().unwrap(), vec![SearchFailureKind::ToolNotFound]);
        assert!(!interceptor.should_rerun_search());
        assert_eq!(sandbox.notifier.take().len(), 1);
    }
}
