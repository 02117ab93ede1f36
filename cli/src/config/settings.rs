//! Layered settings backed by the `config` crate

use codesearch_core::ConfigProvider;
use config::Config;
use std::path::{Path, PathBuf};

/// Resolved CLI settings
pub struct Settings {
    inner: Config,
    source: Option<PathBuf>,
}

impl Settings {
    pub fn new(inner: Config, source: Option<PathBuf>) -> Self {
        Self { inner, source }
    }

    /// File the settings were read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl ConfigProvider for Settings {
    fn get_string(&self, key: &str) -> Option<String> {
        self.inner.get_string(key).ok()
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.inner.get_bool(key).ok()
    }

    fn get_list(&self, key: &str) -> Option<Vec<String>> {
        match self.inner.get_array(key) {
            Ok(values) => Some(
                values
                    .into_iter()
                    .filter_map(|value| value.into_string().ok())
                    .collect(),
            ),
            Err(_) => self.get_string(key).map(|value| vec![value]),
        }
    }
}
