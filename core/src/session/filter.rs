//! Result exclusions and stderr noise

use crate::config::ExclusionSettings;
use crate::error::Result;
use crate::paths::path_to_regex;
use crate::project::Project;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static MISSING_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^open .*: no such file or directory\s*$").expect("missing file regex is valid")
});

/// Engines complain about paths a glob overreached into; those lines are noise
pub fn is_missing_file_noise(line: &str) -> bool {
    MISSING_FILE.is_match(line)
}

/// Regex matching any ignored name right after a path separator
pub fn ignored_names_regex(globs: &[String]) -> Option<String> {
    if globs.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = globs
        .iter()
        .map(|glob| format!("({})", path_to_regex(glob)))
        .collect();
    Some(format!(r"[\\/](?:{})", alternatives.join("|")))
}

/// Drops results the user asked to hide
#[derive(Clone, Default)]
pub struct ResultFilter {
    vcs: Option<Arc<dyn Project>>,
    ignored_names: Option<Regex>,
}

impl ResultFilter {
    pub fn new(settings: &ExclusionSettings, project: Arc<dyn Project>) -> Result<Self> {
        let ignored_names = match ignored_names_regex(&settings.ignored_names) {
            Some(source) => Some(Regex::new(&source)?),
            None => None,
        };
        Ok(Self {
            vcs: settings.exclude_vcs_ignored.then_some(project),
            ignored_names,
        })
    }

    /// Filter that keeps everything
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, file_path: &str) -> bool {
        if let Some(names) = &self.ignored_names {
            if names.is_match(file_path) {
                return true;
            }
        }
        match &self.vcs {
            Some(project) => project.is_path_ignored(Path::new(file_path)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct IgnoreLogs;

    impl Project for IgnoreLogs {
        fn root_paths(&self) -> Vec<PathBuf> {
            vec![PathBuf::from("/work")]
        }

        fn is_path_ignored(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "log")
        }
    }

    #[test]
    fn test_missing_file_noise() {
        assert!(is_missing_file_noise("open /tmp/x: no such file or directory"));
        assert!(!is_missing_file_noise("permission denied: /tmp/x"));
        assert!(!is_missing_file_noise("open /tmp/x: permission denied"));
    }

    #[test]
    fn test_ignored_names_regex() {
        assert_eq!(ignored_names_regex(&[]), None);
        let source =
            ignored_names_regex(&[".git".to_string(), "*.min.js".to_string()]).unwrap();
        assert_eq!(source, r"[\\/](?:(\.git)|(.*\.min\.js))");
    }

    #[test]
    fn test_filter_by_name_and_vcs() {
        let settings = ExclusionSettings {
            exclude_vcs_ignored: true,
            ignored_names: vec!["node_modules".to_string()],
        };
        let filter = ResultFilter::new(&settings, Arc::new(IgnoreLogs)).unwrap();
        assert!(filter.is_excluded("/work/node_modules/x.js"));
        assert!(filter.is_excluded("/work/trace.log"));
        assert!(!filter.is_excluded("/work/src/main.rs"));
        // The name must follow a separator
        assert!(!filter.is_excluded("node_modules.txt"));

        let settings = ExclusionSettings {
            exclude_vcs_ignored: false,
            ignored_names: Vec::new(),
        };
        let filter = ResultFilter::new(&settings, Arc::new(IgnoreLogs)).unwrap();
        assert!(!filter.is_excluded("/work/trace.log"));
        assert!(!ResultFilter::none().is_excluded("/work/trace.log"));
    }
}
