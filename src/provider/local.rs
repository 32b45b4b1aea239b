//! File listing from a local checkout.

use crate::error::ProviderError;
use crate::provider::FileListingProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Settings for walking a local tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Directory names never descended into.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Search expressions run against the tree. Empty lists everything.
    #[serde(default)]
    pub search: Vec<String>,

    /// Stop walking after this many paths.
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            excludes: default_excludes(),
            search: Vec::new(),
            max_paths: default_max_paths(),
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec![".git", "node_modules", "target", "__pycache__", ".venv", "venv", ".idea"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_paths() -> usize {
    50_000
}

/// Lists files under a directory. Hidden files are included since `.env`
/// and friends are exactly what the classifier looks for.
pub struct LocalTreeProvider {
    root: PathBuf,
    config: ProviderConfig,
}

impl LocalTreeProvider {
    pub fn new(root: PathBuf, config: ProviderConfig) -> Self {
        Self { root, config }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.config.excludes.iter().any(|e| e == name))
                .unwrap_or(false)
    }

    fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl FileListingProvider for LocalTreeProvider {
    fn list_paths(&self, repository: &str, expression: &str) -> Result<Vec<String>, ProviderError> {
        if !self.root.is_dir() {
            return Err(ProviderError::NotFound(format!(
                "{} ({})",
                repository,
                self.root.display()
            )));
        }

        let needle = expression.trim().to_lowercase();
        let match_all = needle.is_empty() || needle == "*";
        let mut paths = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative_path(entry.path());
            if match_all || relative.to_lowercase().contains(&needle) {
                paths.push(relative);
                if paths.len() >= self.config.max_paths {
                    debug!("Reached max_paths limit of {}", self.config.max_paths);
                    break;
                }
            }
        }

        debug!(
            "Listed {} paths under {} for '{}'",
            paths.len(),
            self.root.display(),
            expression
        );
        Ok(paths)
    }
}
