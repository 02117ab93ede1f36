//! Index manager: lifecycle of the `cindex` build subprocess
//!
//! At most one build runs at a time. Its state is published two ways: a
//! readiness gate ([`IndexPhase`] over a watch channel) that sessions wait on,
//! and a broadcast of [`IndexEvent`]s for status display.

use crate::config::{ConfigProvider, EngineConfig, EngineKind, SearchEnv};
use crate::error::{Error, IndexError, Result};
use crate::notify::{Notification, Notifier};
use crate::process;
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::process::{Child, ChildStderr};
use tokio::sync::{broadcast, oneshot, watch};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Readiness of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Idle,
    Building { build_id: u64 },
}

impl IndexPhase {
    pub fn is_building(&self) -> bool {
        matches!(self, IndexPhase::Building { .. })
    }
}

/// Index lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexEvent {
    /// A build subprocess was spawned; `reset` marks a purge
    Started { build_id: u64, reset: bool },
    /// The build subprocess exited on its own
    Finished { build_id: u64, success: bool },
}

/// Resolves once no build is in flight
pub struct ReadyGate {
    rx: watch::Receiver<IndexPhase>,
}

impl ReadyGate {
    pub fn is_open(&self) -> bool {
        !self.rx.borrow().is_building()
    }

    pub async fn wait(mut self) {
        // A closed channel means the manager is gone; nothing left to wait for
        let _ = self.rx.wait_for(|phase| !phase.is_building()).await;
    }
}

/// Detach request for a running build; the reply fires once its process is reaped
type DetachRequest = oneshot::Sender<()>;

struct ActiveBuild {
    build_id: u64,
    detach: oneshot::Sender<DetachRequest>,
}

#[derive(Default)]
struct IndexState {
    active: Option<ActiveBuild>,
    next_id: u64,
    /// A purge is waiting for the detached build to exit
    purging: bool,
}

struct Shared {
    state: Mutex<IndexState>,
    phase: watch::Sender<IndexPhase>,
    events: broadcast::Sender<IndexEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the end of `build_id` unless it was detached or superseded
    fn finish(&self, build_id: u64, success: bool) {
        let mut state = self.lock();
        if state.active.as_ref().map(|build| build.build_id) != Some(build_id) {
            debug!(build_id, "ignoring exit of detached index build");
            return;
        }
        state.active = None;
        self.phase.send_replace(IndexPhase::Idle);
        let _ = self.events.send(IndexEvent::Finished { build_id, success });
        info!(build_id, success, "index build finished");
    }
}

/// Clears the purge flag, reopening the gate unless a new build took over
struct PurgeGuard<'a> {
    shared: &'a Shared,
}

impl Drop for PurgeGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.purging = false;
        if state.active.is_none() {
            self.shared.phase.send_replace(IndexPhase::Idle);
        }
    }
}

/// Owner of the index-build subprocess
pub struct IndexManager {
    config: Arc<dyn ConfigProvider>,
    project: Arc<dyn Project>,
    notifier: Arc<dyn Notifier>,
    shared: Arc<Shared>,
}

impl IndexManager {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        project: Arc<dyn Project>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (phase, _) = watch::channel(IndexPhase::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            project,
            notifier,
            shared: Arc::new(Shared {
                state: Mutex::new(IndexState::default()),
                phase,
                events,
            }),
        }
    }

    /// Start indexing every project root
    ///
    /// Fails fast with [`IndexError::BuildInProgress`] while another build
    /// runs. Must be called from within a tokio runtime.
    pub fn reindex(&self) -> Result<u64> {
        let config = SearchEnv::new(self.config.as_ref()).snapshot();
        let mut state = self.shared.lock();
        if let Some(active) = &state.active {
            debug!(build_id = active.build_id, "reindex refused, build in progress");
            return Err(IndexError::BuildInProgress.into());
        }
        if state.purging {
            debug!("reindex refused, purge in progress");
            return Err(IndexError::BuildInProgress.into());
        }

        let mut args = config.index_flags.clone();
        args.extend(
            self.project
                .root_paths()
                .iter()
                .map(|root| root.to_string_lossy().into_owned()),
        );
        self.start_build(&mut state, &config, args, false)
    }

    /// Drop the whole index and rebuild it from scratch
    ///
    /// An in-flight build is killed and reaped before the reset starts, and
    /// never reports `Finished`. Fails with [`IndexError::BuildInProgress`]
    /// while another purge is still stopping its build.
    pub async fn purge_index(&self) -> Result<u64> {
        let config = SearchEnv::new(self.config.as_ref()).snapshot();
        let detached = {
            let mut state = self.shared.lock();
            if state.purging {
                return Err(IndexError::BuildInProgress.into());
            }
            state.purging = true;
            state.active.take()
        };
        let _guard = PurgeGuard {
            shared: &self.shared,
        };

        if let Some(active) = detached {
            info!(build_id = active.build_id, "stopping in-flight index build");
            let (reply, stopped) = oneshot::channel();
            if active.detach.send(reply).is_ok() {
                // An error means the watcher already reaped the process
                let _ = stopped.await;
            }
        }

        let mut state = self.shared.lock();
        self.start_build(&mut state, &config, vec!["-reset".to_string()], true)
    }

    /// Paths the index currently covers, fetched fresh on every call
    pub async fn list_indexed_paths(&self) -> Result<BTreeSet<PathBuf>> {
        let env = SearchEnv::new(self.config.as_ref());
        let config = env.snapshot();
        match env.index_file() {
            Some(file) if file.exists() => {}
            _ => {
                debug!("no index file yet");
                return Ok(BTreeSet::new());
            }
        }

        let tool = process::tool_name(&config.index_executable);
        let output =
            process::tool_command(&config.index_executable, ["-list"], config.index_env())
                .output()
                .await
                .map_err(|e| self.spawn_failed(&tool, e))?;

        match output.status.code() {
            Some(0) => Ok(String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect()),
            // The tool exits 1 when the index is empty
            Some(1) => Ok(BTreeSet::new()),
            code => Err(IndexError::ListFailed {
                code,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into()),
        }
    }

    /// Gate that opens when no build is in flight
    pub fn await_ready(&self) -> ReadyGate {
        ReadyGate {
            rx: self.shared.phase.subscribe(),
        }
    }

    pub fn is_building(&self) -> bool {
        self.shared.phase.borrow().is_building()
    }

    pub fn phase(&self) -> IndexPhase {
        *self.shared.phase.borrow()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.shared.events.subscribe()
    }

    fn start_build(
        &self,
        state: &mut IndexState,
        config: &EngineConfig,
        args: Vec<String>,
        reset: bool,
    ) -> Result<u64> {
        if let Some(dir) = &config.index_dir {
            std::fs::create_dir_all(dir)?;
        }

        let tool = process::tool_name(&config.index_executable);
        let mut cmd = process::tool_command(&config.index_executable, &args, config.index_env());
        cmd.stdout(Stdio::null());
        let mut child = cmd.spawn().map_err(|e| self.spawn_failed(&tool, e))?;

        state.next_id += 1;
        let build_id = state.next_id;
        let (detach, detached) = oneshot::channel();
        state.active = Some(ActiveBuild { build_id, detach });
        self.shared.phase.send_replace(IndexPhase::Building { build_id });
        let _ = self.shared.events.send(IndexEvent::Started { build_id, reset });
        info!(build_id, reset, tool = %tool, "index build started");
        if config.debug {
            debug!(build_id, args = ?args, "index build arguments");
        }

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr, tool, config.debug));
        }
        tokio::spawn(watch_build(
            Arc::clone(&self.shared),
            child,
            build_id,
            detached,
            config.debug,
        ));
        Ok(build_id)
    }

    fn spawn_failed(&self, tool: &str, err: io::Error) -> Error {
        let install_url = EngineKind::Indexed.install_url();
        let error = process::spawn_error(tool, install_url, err);
        if error.is_not_found() {
            self.notifier
                .notify(Notification::tool_not_found(tool, install_url));
        }
        warn!(tool = %tool, error = %error, "failed to start index tool");
        error
    }
}

impl Drop for IndexManager {
    fn drop(&mut self) {
        if let Some(active) = self.shared.lock().active.take() {
            debug!(build_id = active.build_id, "stopping index build on shutdown");
            let (reply, _) = oneshot::channel();
            let _ = active.detach.send(reply);
            self.shared.phase.send_replace(IndexPhase::Idle);
        }
    }
}

async fn watch_build(
    shared: Arc<Shared>,
    mut child: Child,
    build_id: u64,
    detached: oneshot::Receiver<DetachRequest>,
    debug: bool,
) {
    tokio::select! {
        status = child.wait() => {
            let success = match status {
                Ok(status) => {
                    if !status.success() && debug {
                        debug!(build_id, code = ?status.code(), "index build exited with failure");
                    }
                    status.success()
                }
                Err(e) => {
                    warn!(build_id, error = %e, "failed to wait for index build");
                    false
                }
            };
            shared.finish(build_id, success);
        }
        Ok(reply) = detached => {
            if let Err(e) = child.kill().await {
                debug!(build_id, error = %e, "failed to kill detached index build");
            }
            debug!(build_id, "detached index build stopped");
            let _ = reply.send(());
        }
    }
}

async fn drain_stderr(stderr: ChildStderr, tool: String, debug: bool) {
    let mut lines = process::lines(stderr);
    while let Ok(Some(raw)) = lines.next_segment().await {
        if debug {
            debug!(tool = %tool, "{}", process::decode_line(&raw));
        }
    }
}
