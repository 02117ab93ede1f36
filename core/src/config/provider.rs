//! Key-value configuration provider

use serde_json::Value;
use std::collections::HashMap;

/// Configuration keys read by core
pub mod keys {
    /// Engine selection (`csearch`, `rg`, `ag`, `pt`)
    pub const ENGINE: &str = "codesearch.engine";
    /// Directory joined with tool names when no explicit override exists
    pub const PATH_PREFIX: &str = "codesearch.path";
    /// Extra search-time options, one string
    pub const SEARCH_OPTIONS: &str = "codesearch.opts";
    /// Extra index-time options, one string
    pub const INDEX_OPTIONS: &str = "codesearch.index_opts";
    /// Let the engine manage its own global index
    pub const USE_GLOBAL_INDEX: &str = "codesearch.use_global_index";
    /// Persisted-data location; the index lives in its `data` subdirectory
    pub const DATA_DIR: &str = "codesearch.data_dir";
    /// Verbose subprocess logging
    pub const DEBUG_MODE: &str = "codesearch.debug_mode";
    /// Host setting: drop files ignored by version control
    pub const EXCLUDE_VCS_IGNORED: &str = "core.exclude_vcs_ignored_paths";
    /// Host setting: ignored-name globs
    pub const IGNORED_NAMES: &str = "core.ignored_names";

    /// Explicit executable override for `tool`, e.g. `codesearch.rg_path`
    pub fn executable_override(tool: &str) -> String {
        format!("codesearch.{}_path", tool)
    }
}

/// Read-only access to host configuration
///
/// Implementations return `None` for absent or mistyped values; callers fall
/// back to defaults.
pub trait ConfigProvider: Send + Sync {
    /// Get a string value
    fn get_string(&self, key: &str) -> Option<String>;

    /// Get a boolean value
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Get a list of strings
    fn get_list(&self, key: &str) -> Option<Vec<String>>;
}

/// In-memory provider backed by JSON values
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, Value>,
}

impl MapConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style
    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }
}

impl ConfigProvider for MapConfig {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.values.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}
