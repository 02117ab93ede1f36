//! Shared fixtures: shell-script stand-ins for the external engines

use crate::config::{keys, MapConfig};
use crate::notify::{Notification, Notifier};
use crate::project::Workspace;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Temporary directory holding a project, engine scripts and their logs
pub struct Sandbox {
    dir: TempDir,
    pub notifier: Arc<RecordingNotifier>,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("project")).unwrap();
        Self {
            dir,
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Canonical project root, as the workspace reports it
    pub fn project_root(&self) -> PathBuf {
        self.path().join("project").canonicalize().unwrap()
    }

    pub fn project(&self) -> Arc<Workspace> {
        Arc::new(Workspace::open([self.project_root()]))
    }

    /// Index file used with the default sandbox configuration
    pub fn index_file(&self) -> PathBuf {
        self.path().join("state/data/csearchindex")
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.log", name))
    }

    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        write_script(self.path(), name, body)
    }

    /// `cindex` stand-in: `-list` runs `list`, `-reset` truncates the index,
    /// anything else logs to `cindex.log` and runs `build`
    #[cfg(unix)]
    pub fn cindex(&self, build: &str, list: &str) -> PathBuf {
        let body = format!(
            r#"case "$1" in
  -list) {list} ;;
  -reset) echo reset >> "{calls}"; : > "$CSEARCHINDEX"; exit 0 ;;
esac
echo "build $*" >> "{calls}"
{build}"#,
            list = list,
            calls = self.log("cindex").display(),
            build = build,
        );
        self.script("cindex", &body)
    }

    /// Configuration with the index kept inside the sandbox
    pub fn config(&self) -> MapConfig {
        MapConfig::new().with(keys::DATA_DIR, self.path().join("state").to_str().unwrap())
    }
}

/// Write an executable `/bin/sh` script and return its path
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Lines recorded by a script in its call log
pub fn read_calls(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Poll the call log until it has at least `count` lines
pub async fn wait_for_calls(path: &Path, count: usize) -> Vec<String> {
    for _ in 0..200 {
        let calls = read_calls(path);
        if calls.len() >= count {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("expected {} calls in {}", count, path.display());
}

/// Notifier that keeps everything it receives
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
