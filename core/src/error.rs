//! Error types and handling for codesearch core

use thiserror::Error;

/// Result type alias for codesearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codesearch core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External engine (search or index tool) errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Index lifecycle errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pattern compilation errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

/// Errors raised while launching or talking to an external tool
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Tool not found: {tool}")]
    NotFound {
        tool: String,
        install_url: Option<String>,
    },

    #[error("Failed to start {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} {stream} unavailable")]
    StreamUnavailable { tool: String, stream: String },
}

/// Index manager errors
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("An index build is already in progress")]
    BuildInProgress,

    #[error("Index build {build_id} failed")]
    BuildFailed { build_id: u64 },

    #[error("Listing indexed paths failed (exit code {code:?}): {message}")]
    ListFailed { code: Option<i32>, message: String },

    #[error("Index manager stopped before the build finished")]
    Interrupted,
}

impl Error {
    /// True when the error means the executable could not be found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Engine(EngineError::NotFound { .. }))
    }

    /// True when a reindex was refused because a build is running
    pub fn is_build_in_progress(&self) -> bool {
        matches!(self, Error::Index(IndexError::BuildInProgress))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
