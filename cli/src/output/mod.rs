//! CLI-specific output implementations
//!
//! Terminal rendering of search results, notifications and index progress.

pub mod notifier;
pub mod printer;
pub mod progress;

pub use notifier::ConsoleNotifier;
pub use printer::Printer;
pub use progress::IndexProgress;
