//! Engine kinds and the per-operation configuration snapshot

use crate::error::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Name of the index-build tool shipped with codesearch
pub const INDEX_TOOL: &str = "cindex";

/// Environment variable both codesearch tools read the index location from
pub const INDEX_ENV_VAR: &str = "CSEARCHINDEX";

/// File name of the index inside the index directory
pub const INDEX_FILE_NAME: &str = "csearchindex";

/// Supported search engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    /// codesearch: trigram index built by `cindex`, queried by `csearch`
    #[default]
    #[serde(rename = "csearch")]
    Indexed,
    /// ripgrep
    #[serde(rename = "rg")]
    Ripgrep,
    /// The Silver Searcher
    #[serde(rename = "ag")]
    SilverSearcher,
    /// The Platinum Searcher
    #[serde(rename = "pt")]
    PlatinumSearcher,
}

impl EngineKind {
    /// All engines, indexed first
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Indexed,
        EngineKind::Ripgrep,
        EngineKind::SilverSearcher,
        EngineKind::PlatinumSearcher,
    ];

    /// Configuration name of the engine
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Indexed => "csearch",
            EngineKind::Ripgrep => "rg",
            EngineKind::SilverSearcher => "ag",
            EngineKind::PlatinumSearcher => "pt",
        }
    }

    /// Executable used to run a search
    pub fn tool(&self) -> &'static str {
        self.as_str()
    }

    /// Human readable engine name
    pub fn display_name(&self) -> &'static str {
        match self {
            EngineKind::Indexed => "codesearch",
            EngineKind::Ripgrep => "ripgrep",
            EngineKind::SilverSearcher => "The Silver Searcher",
            EngineKind::PlatinumSearcher => "The Platinum Searcher",
        }
    }

    /// Where users can get the engine
    pub fn install_url(&self) -> Option<&'static str> {
        match self {
            EngineKind::Indexed => Some("https://github.com/google/codesearch"),
            EngineKind::Ripgrep => Some("https://github.com/BurntSushi/ripgrep#installation"),
            EngineKind::SilverSearcher => {
                Some("https://github.com/ggreer/the_silver_searcher#installing")
            }
            EngineKind::PlatinumSearcher => {
                Some("https://github.com/monochromegane/the_platinum_searcher#installation")
            }
        }
    }

    /// Whether the engine searches a prebuilt index instead of the live tree
    pub fn is_indexed(&self) -> bool {
        matches!(self, EngineKind::Indexed)
    }

    /// `ag` and `pt` print line numbers without being asked
    pub fn numbers_lines_by_default(&self) -> bool {
        matches!(
            self,
            EngineKind::SilverSearcher | EngineKind::PlatinumSearcher
        )
    }

    /// Flags the engine needs so every output line reads `path:line:text`
    pub fn required_flags(&self) -> &'static [&'static str] {
        match self {
            EngineKind::Ripgrep => &["--no-heading", "--with-filename"],
            _ => &[],
        }
    }

    /// Parse a configured engine name, accepting common aliases
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csearch" | "codesearch" | "cindex" => Some(EngineKind::Indexed),
            "rg" | "ripgrep" => Some(EngineKind::Ripgrep),
            "ag" | "silver_searcher" | "the_silver_searcher" => Some(EngineKind::SilverSearcher),
            "pt" | "platinum_searcher" | "the_platinum_searcher" => {
                Some(EngineKind::PlatinumSearcher)
            }
            _ => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::parse(s).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "engine".to_string(),
                value: s.to_string(),
            }
            .into()
        })
    }
}

/// Result exclusion settings read from the host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSettings {
    /// Drop files the project's version control ignores
    pub exclude_vcs_ignored: bool,
    /// Ignored-name globs such as `.git` or `*.min.js`
    pub ignored_names: Vec<String>,
}

/// Value snapshot of everything a single operation needs to run an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Active engine
    pub kind: EngineKind,
    /// Search executable for `kind`
    pub executable: PathBuf,
    /// Index-build executable (only meaningful for the indexed engine)
    pub index_executable: PathBuf,
    /// Extra search-time options
    pub extra_flags: Vec<String>,
    /// Extra index-time options
    pub index_flags: Vec<String>,
    /// Custom index directory; `None` lets the engine use its global index
    pub index_dir: Option<PathBuf>,
    /// Verbose subprocess logging
    pub debug: bool,
}

impl EngineConfig {
    /// Environment variable to hand the child, if a custom index is in use
    pub fn index_env(&self) -> Option<(&'static str, PathBuf)> {
        self.index_dir
            .as_ref()
            .map(|dir| (INDEX_ENV_VAR, dir.join(INDEX_FILE_NAME)))
    }
}
