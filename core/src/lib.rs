//! # codesearch Core
//!
//! Project-wide search over external engines: the indexed codesearch tools
//! (`csearch` + `cindex`) and the line-grep tools `rg`, `ag` and `pt`.
//!
//! This library runs the engines as subprocesses, keeps the codesearch index
//! covering the open project, and streams matches back as per-file results.

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod notify;
pub mod paths;
pub mod process;
pub mod project;
pub mod session;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use config::{ConfigProvider, EngineConfig, EngineKind, MapConfig, SearchEnv};
pub use engine::{Canceller, ScanInterceptor, ScanOptions, SearchEngine, SearchHandle};
pub use error::{Error, Result};
pub use indexer::{IndexEvent, IndexManager, IndexPhase};
pub use notify::{Notification, NotificationLevel, Notifier, NullNotifier};
pub use project::{Project, Workspace};
pub use session::{
    FileResult, MatchRange, MatchRecord, SearchEvent, SearchFailure, SearchFailureKind,
    SearchPattern, SearchStatus, SearchSummary,
};

/// Current version of the codesearch-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing with a specific debug mode
///
/// Logs go to stderr so search output on stdout stays machine readable.
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
