//! Git repository acquisition.
//!
//! Remote repositories are shallow-cloned with git2 into a temporary
//! directory owned by [`CloneResult`]. Dropping the result removes the
//! checkout, so a clone never outlives the run that made it.

use anyhow::{Context, Result};
use git2::{FetchOptions, Progress, RemoteCallbacks};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// A checkout that exists for the duration of one run.
pub struct CloneResult {
    path: PathBuf,
    /// Removes the checkout on drop. `None` for caller-owned directories.
    temp_dir: Option<TempDir>,
}

impl CloneResult {
    /// Wrap a caller-owned directory without cloning.
    pub fn local(path: PathBuf) -> Self {
        Self {
            path,
            temp_dir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[allow(dead_code)] // Used by tests
    pub fn is_temporary(&self) -> bool {
        self.temp_dir.is_some()
    }
}

impl Drop for CloneResult {
    fn drop(&mut self) {
        if let Some(temp) = &self.temp_dir {
            debug!("Removing temporary checkout at {}", temp.path().display());
        }
    }
}

/// Options for cloning a repository.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Branch to checkout (None for default branch).
    pub branch: Option<String>,
    /// Depth for shallow clone (None for full clone).
    pub depth: Option<i32>,
    /// Whether to show progress.
    pub show_progress: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            branch: None,
            depth: Some(1),
            show_progress: true,
        }
    }
}

/// Clone a repository from a URL into a temporary directory.
pub fn clone_repository(url: &str, options: &CloneOptions) -> Result<CloneResult> {
    info!("Cloning repository: {}", url);

    let temp = TempDir::new().context("Failed to create temporary directory")?;
    let path = temp.path().to_path_buf();
    debug!("Clone target: {}", path.display());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.transfer_progress(move |progress: Progress<'_>| {
        if let Some(ref pb) = pb_clone {
            pb.set_length(progress.total_objects() as u64);
            pb.set_position(progress.received_objects() as u64);
        }
        true
    });

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);
    if let Some(depth) = options.depth {
        fetch_opts.depth(depth);
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    if let Some(ref branch) = options.branch {
        builder.branch(branch);
    }

    builder
        .clone(url, &path)
        .with_context(|| format!("Failed to clone repository: {}", url))?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Clone complete");
    }

    info!("Cloned repository to: {}", path.display());

    Ok(CloneResult {
        path,
        temp_dir: Some(temp),
    })
}

/// Parse a GitHub URL to extract owner and repo name.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let url = url.trim_end_matches('/').trim_end_matches(".git");

    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("git@github.com:"))?;

    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
        Some((parts[0].to_string(), parts[1].to_string()))
    } else {
        None
    }
}

/// Short identifier used in reports: `owner/repo` for GitHub URLs, the
/// input otherwise.
pub fn repository_id(url: &str) -> String {
    parse_github_url(url)
        .map(|(owner, repo)| format!("{}/{}", owner, repo))
        .unwrap_or_else(|| url.to_string())
}
