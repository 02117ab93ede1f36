//! CLI command implementations

pub mod engines;
pub mod index;
pub mod search;

pub use engines::engines_command;
pub use index::{list_command, purge_command, reindex_command};
pub use search::{search_command, SearchArgs};
