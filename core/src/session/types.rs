//! Search requests, results and session outcomes

use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compiled search pattern
///
/// The source text is what the engine receives; the compiled form re-scans
/// each output line to locate every occurrence.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    source: String,
    case_insensitive: bool,
    regex: Regex,
}

impl SearchPattern {
    pub fn new(source: impl Into<String>, case_insensitive: bool) -> Result<Self> {
        let source = source.into();
        let regex = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            source,
            case_insensitive,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// One search, immutable once its session starts
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub pattern: SearchPattern,
    /// Scope specifiers; empty means the whole project
    pub scope: Vec<String>,
}

impl SearchRequest {
    pub fn new(pattern: SearchPattern, scope: Vec<String>) -> Self {
        Self { pattern, scope }
    }
}

/// Location of a match: zero-based row, byte columns into the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRange {
    pub row: u64,
    pub start_column: usize,
    pub end_column: usize,
}

/// One regex occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub line_text: String,
    pub match_text: String,
    pub range: MatchRange,
}

/// All matches of one file, in line order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub file_path: String,
    pub matches: Vec<MatchRecord>,
}

impl FileResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            matches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFailureKind {
    /// The engine executable could not be found
    ToolNotFound,
    /// The index could not be brought up to date
    IndexBuild,
    /// A line the engine wrote to stderr
    Stderr,
    /// Any other failure to run the engine
    Io,
}

/// Structured error delivered to the result callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFailure {
    pub kind: SearchFailureKind,
    pub message: String,
}

impl SearchFailure {
    pub fn new(kind: SearchFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What the result callback receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SearchEvent {
    File(FileResult),
    Error(SearchFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Completed,
    Cancelled,
    Failed,
}

/// How a session settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub status: SearchStatus,
    /// File results delivered
    pub files: usize,
    /// Match records delivered
    pub matches: usize,
    /// Engine exit code, when the engine ran and exited normally
    pub exit_code: Option<i32>,
}

impl SearchSummary {
    pub(crate) fn new(status: SearchStatus) -> Self {
        Self {
            status,
            files: 0,
            matches: 0,
            exit_code: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SearchStatus::Cancelled
    }
}
