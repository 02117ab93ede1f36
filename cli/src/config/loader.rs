//! CLI configuration loader for codesearch
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./codesearch.json or ./.codesearch/config.json
//! 3. Git repository root: <repo_root>/.codesearch/config.json
//! 4. User config: <config_dir>/codesearch/config.json
//! 5. Built-in defaults (no file)

use super::settings::Settings;
use anyhow::{anyhow, Context, Result};
use codesearch_core::config::keys;
use codesearch_core::error::ConfigError;
use codesearch_core::EngineKind;
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    engine_override: Option<EngineKind>,
    debug_override: bool,
    /// Directory the search starts from; the process cwd when unset
    working_dir: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set engine override
    pub fn with_engine_override(mut self, engine: EngineKind) -> Self {
        self.engine_override = Some(engine);
        self
    }

    /// Force debug mode on
    pub fn with_debug_override(mut self, debug: bool) -> Self {
        self.debug_override = debug;
        self
    }

    /// Search for config files from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Load and resolve configuration
    pub fn load(&self) -> Result<Settings> {
        // Step 1: Find the single configuration file
        let source = match &self.config_override {
            Some(path) => Some(self.resolve_override(path).with_context(|| {
                format!("Failed to load config from override path: {}", path.display())
            })?),
            None => self.search()?,
        };

        let mut builder = Config::builder();
        if let Some(path) = &source {
            debug!(path = %path.display(), "loading configuration");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Json));
        }

        // Step 2: Apply flag overrides
        if let Some(engine) = self.engine_override {
            builder = builder.set_override(keys::ENGINE, engine.as_str())?;
        }
        if self.debug_override {
            builder = builder.set_override(keys::DEBUG_MODE, true)?;
        }

        let config = builder.build().with_context(|| match &source {
            Some(path) => format!("Failed to parse config file: {}", path.display()),
            None => "Failed to build configuration".to_string(),
        })?;
        Ok(Settings::new(config, source))
    }

    /// Search for a config file in priority order
    fn search(&self) -> Result<Option<PathBuf>> {
        let cwd = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        // 1. Current working directory
        for candidate in [
            cwd.join("codesearch.json"),
            cwd.join(".codesearch").join("config.json"),
        ] {
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&cwd) {
            let candidate = git_root.join(".codesearch").join("config.json");
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            let candidate = config_dir.join("codesearch").join("config.json");
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        // 4. Defaults only
        Ok(None)
    }

    /// Resolve an explicit override (file or directory)
    fn resolve_override(&self, path: &Path) -> Result<PathBuf> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.is_file() {
                Ok(config_file)
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into())
        }
    }
}

/// Find git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}
