//! Environment resolver: engine, executables, options and index location
//!
//! Every accessor is a pure read over the [`ConfigProvider`]. Missing or
//! malformed values fall back to defaults; nothing here returns an error.

use super::provider::{keys, ConfigProvider};
use super::types::{
    EngineConfig, EngineKind, ExclusionSettings, INDEX_ENV_VAR, INDEX_FILE_NAME, INDEX_TOOL,
};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

static OPTION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'([^']*)'|(\S+)").expect("option token regex is valid")
});

/// Resolver over a configuration provider
pub struct SearchEnv<'a> {
    config: &'a dyn ConfigProvider,
}

impl<'a> SearchEnv<'a> {
    /// Create a resolver over `config`
    pub fn new(config: &'a dyn ConfigProvider) -> Self {
        Self { config }
    }

    /// Active engine; unknown names fall back to the indexed engine
    pub fn engine_kind(&self) -> EngineKind {
        match self.config.get_string(keys::ENGINE) {
            Some(name) => EngineKind::parse(&name).unwrap_or_else(|| {
                debug!(engine = %name, "unknown engine configured, using default");
                EngineKind::default()
            }),
            None => EngineKind::default(),
        }
    }

    /// Executable for `tool`: explicit override, then prefix + tool, then bare name
    pub fn resolve_executable(&self, tool: &str) -> PathBuf {
        if let Some(path) = self.non_empty(&keys::executable_override(tool)) {
            return expand_path(&path);
        }
        if let Some(prefix) = self.non_empty(keys::PATH_PREFIX) {
            return expand_path(&prefix).join(tool);
        }
        PathBuf::from(tool)
    }

    /// Locate `tool` on disk the way a spawn would, for diagnostics
    pub fn locate(&self, tool: &str) -> Option<PathBuf> {
        which::which(self.resolve_executable(tool)).ok()
    }

    /// Extra search-time options
    pub fn engine_options(&self) -> Vec<String> {
        split_options(&self.config.get_string(keys::SEARCH_OPTIONS).unwrap_or_default())
    }

    /// Extra index-time options
    pub fn index_options(&self) -> Vec<String> {
        split_options(&self.config.get_string(keys::INDEX_OPTIONS).unwrap_or_default())
    }

    /// Persisted-data location
    pub fn data_dir(&self) -> PathBuf {
        match self.non_empty(keys::DATA_DIR) {
            Some(dir) => expand_path(&dir),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("codesearch"),
        }
    }

    /// Custom index directory, absent when the engine's global index is used
    pub fn index_dir(&self) -> Option<PathBuf> {
        if self.config.get_bool(keys::USE_GLOBAL_INDEX).unwrap_or(false) {
            return None;
        }
        Some(self.data_dir().join("data"))
    }

    /// Index file the index tool reads and writes
    pub fn index_file(&self) -> Option<PathBuf> {
        match self.index_dir() {
            Some(dir) => Some(dir.join(INDEX_FILE_NAME)),
            None => std::env::var_os(INDEX_ENV_VAR)
                .map(PathBuf::from)
                .or_else(|| dirs::home_dir().map(|home| home.join(".csearchindex"))),
        }
    }

    /// Verbose subprocess logging
    pub fn debug_mode(&self) -> bool {
        self.config.get_bool(keys::DEBUG_MODE).unwrap_or(false)
    }

    /// Result exclusion settings
    pub fn exclusions(&self) -> ExclusionSettings {
        ExclusionSettings {
            exclude_vcs_ignored: self
                .config
                .get_bool(keys::EXCLUDE_VCS_IGNORED)
                .unwrap_or(false),
            ignored_names: self
                .config
                .get_list(keys::IGNORED_NAMES)
                .unwrap_or_default()
                .into_iter()
                .filter(|name| !name.trim().is_empty())
                .collect(),
        }
    }

    /// Snapshot for one operation
    pub fn snapshot(&self) -> EngineConfig {
        let kind = self.engine_kind();
        EngineConfig {
            kind,
            executable: self.resolve_executable(kind.tool()),
            index_executable: self.resolve_executable(INDEX_TOOL),
            extra_flags: self.engine_options(),
            index_flags: self.index_options(),
            index_dir: self.index_dir(),
            debug: self.debug_mode(),
        }
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.config
            .get_string(key)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Split an options string on whitespace; single-quoted substrings stay whole
pub fn split_options(raw: &str) -> Vec<String> {
    OPTION_TOKEN
        .captures_iter(raw)
        .filter_map(|caps| {
            let token = match (caps.get(1), caps.get(2)) {
                (Some(quoted), _) => quoted.as_str().to_string(),
                (None, Some(bare)) => bare.as_str().replace('\'', ""),
                (None, None) => return None,
            };
            (!token.is_empty()).then_some(token)
        })
        .collect()
}

fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    #[test]
    fn test_split_options_quotes() {
        assert_eq!(
            split_options("-i  --glob '*.rs' 'two words'"),
            vec!["-i", "--glob", "*.rs", "two words"]
        );
        assert_eq!(split_options("--type='rust'"), vec!["--type=rust"]);
        assert!(split_options("   ").is_empty());
        assert!(split_options("''").is_empty());
    }

    #[test]
    fn test_resolve_executable_precedence() {
        let bare = MapConfig::new();
        assert_eq!(
            SearchEnv::new(&bare).resolve_executable("rg"),
            PathBuf::from("rg")
        );

        let prefixed = MapConfig::new().with(keys::PATH_PREFIX, "/opt/tools");
        assert_eq!(
            SearchEnv::new(&prefixed).resolve_executable("rg"),
            PathBuf::from("/opt/tools/rg")
        );

        let overridden = prefixed.with("codesearch.rg_path", "/usr/local/bin/ripgrep");
        let env = SearchEnv::new(&overridden);
        assert_eq!(
            env.resolve_executable("rg"),
            PathBuf::from("/usr/local/bin/ripgrep")
        );
        // Other tools still use the prefix
        assert_eq!(
            env.resolve_executable("ag"),
            PathBuf::from("/opt/tools/ag")
        );
    }

    #[test]
    fn test_engine_defaults() {
        let config = MapConfig::new().with(keys::ENGINE, "nonsense");
        let env = SearchEnv::new(&config);
        assert_eq!(env.engine_kind(), EngineKind::Indexed);
        assert!(!env.debug_mode());
        assert!(env.engine_options().is_empty());
        assert_eq!(env.exclusions(), ExclusionSettings::default());
    }

    #[test]
    fn test_index_dir_and_global_index() {
        let config = MapConfig::new().with(keys::DATA_DIR, "/var/lib/cs");
        let env = SearchEnv::new(&config);
        assert_eq!(env.index_dir(), Some(PathBuf::from("/var/lib/cs/data")));
        assert_eq!(
            env.index_file(),
            Some(PathBuf::from("/var/lib/cs/data/csearchindex"))
        );

        let global = config.with(keys::USE_GLOBAL_INDEX, true);
        assert_eq!(SearchEnv::new(&global).index_dir(), None);
    }

    #[test]
    fn test_snapshot() {
        let config = MapConfig::new()
            .with(keys::ENGINE, "ag")
            .with(keys::SEARCH_OPTIONS, "--hidden")
            .with(keys::INDEX_OPTIONS, "-maxfilelen 1000")
            .with(keys::DEBUG_MODE, true);
        let snapshot = SearchEnv::new(&config).snapshot();

        assert_eq!(snapshot.kind, EngineKind::SilverSearcher);
        assert_eq!(snapshot.executable, PathBuf::from("ag"));
        assert_eq!(snapshot.index_executable, PathBuf::from("cindex"));
        assert_eq!(snapshot.extra_flags, vec!["--hidden"]);
        assert_eq!(snapshot.index_flags, vec!["-maxfilelen", "1000"]);
        assert!(snapshot.debug);
    }
}
