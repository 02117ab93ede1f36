//! Engine configuration: key-value provider, engine types and the resolver
//!
//! Core never loads configuration files. Hosts hand in a [`ConfigProvider`]
//! and every operation takes a fresh [`EngineConfig`] snapshot from it.

pub mod env;
pub mod provider;
pub mod types;

pub use env::SearchEnv;
pub use provider::{keys, ConfigProvider, MapConfig};
pub use types::{
    EngineConfig, EngineKind, ExclusionSettings, INDEX_ENV_VAR, INDEX_FILE_NAME, INDEX_TOOL,
};
