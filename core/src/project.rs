//! Open project roots and version-control ignore checks

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The host's view of the open project
pub trait Project: Send + Sync {
    /// Absolute root paths of the open project folders, in display order
    fn root_paths(&self) -> Vec<PathBuf>;

    /// Whether any repository containing `path` ignores it
    fn is_path_ignored(&self, path: &Path) -> bool;
}

/// A git repository found at a project root
struct Repository {
    root: PathBuf,
    ignore: Gitignore,
}

/// Project made of plain directories, git-aware where a root is a repository
pub struct Workspace {
    roots: Vec<PathBuf>,
    repositories: Vec<Repository>,
}

impl Workspace {
    /// Open the given roots; duplicates are dropped, order is kept
    pub fn open<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut unique: Vec<PathBuf> = Vec::new();
        for root in roots {
            let root = root.as_ref();
            let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            if !unique.contains(&root) {
                unique.push(root);
            }
        }

        let repositories = unique
            .iter()
            .filter(|root| root.join(".git").exists())
            .filter_map(|root| load_repository(root))
            .collect();

        Self {
            roots: unique,
            repositories,
        }
    }

    /// Number of roots that are git repositories
    pub fn repository_count(&self) -> usize {
        self.repositories.len()
    }
}

impl Project for Workspace {
    fn root_paths(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn is_path_ignored(&self, path: &Path) -> bool {
        self.repositories.iter().any(|repo| {
            let candidate = if path.is_absolute() {
                path.to_path_buf()
            } else {
                repo.root.join(path)
            };
            // The matcher panics on paths outside its root
            candidate.starts_with(&repo.root)
                && repo
                    .ignore
                    .matched_path_or_any_parents(&candidate, false)
                    .is_ignore()
        })
    }
}

fn load_repository(root: &Path) -> Option<Repository> {
    let mut builder = GitignoreBuilder::new(root);
    for file in [
        root.join(".gitignore"),
        root.join(".git").join("info").join("exclude"),
    ] {
        if file.is_file() {
            if let Some(e) = builder.add(&file) {
                warn!(file = %file.display(), error = %e, "skipping unreadable ignore rules");
            }
        }
    }

    match builder.build() {
        Ok(ignore) => {
            debug!(
                root = %root.display(),
                rules = ignore.num_ignores(),
                "loaded repository ignore rules"
            );
            Some(Repository {
                root: root.to_path_buf(),
                ignore,
            })
        }
        Err(e) => {
            warn!(root = %root.display(), error = %e, "failed to build ignore rules");
            None
        }
    }
}
