//! Spinner shown while the index builds

use codesearch_core::IndexEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Follows index lifecycle events with a terminal spinner
pub struct IndexProgress {
    bar: ProgressBar,
}

impl IndexProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        Self { bar }
    }

    pub fn handle(&self, event: IndexEvent) {
        match event {
            IndexEvent::Started { reset, .. } => {
                self.bar.set_message(if reset {
                    "Rebuilding project index..."
                } else {
                    "Indexing project..."
                });
                self.bar.enable_steady_tick(Duration::from_millis(80));
            }
            IndexEvent::Finished { success, .. } => {
                self.bar.finish_and_clear();
                if !success {
                    eprintln!("Project indexing failed");
                }
            }
        }
    }

    /// Follow events on a background task until the channel closes
    pub fn follow(self, mut events: broadcast::Receiver<IndexEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle(event),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            self.bar.finish_and_clear();
        })
    }
}

impl Drop for IndexProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
