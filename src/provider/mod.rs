//! File-listing providers.
//!
//! A provider answers "which paths in this repository match this search
//! expression". Collection runs one search step per expression; a failed
//! step contributes no paths instead of aborting the analysis.

pub mod local;

use crate::error::ProviderError;
use std::collections::HashSet;
use tracing::{debug, warn};

pub use local::{LocalTreeProvider, ProviderConfig};

/// Source of repository path listings.
pub trait FileListingProvider {
    /// Paths in `repository` matching `expression`.
    fn list_paths(
        &self,
        repository: &str,
        expression: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Run every search step and merge the results.
///
/// Paths are de-duplicated across steps, keeping first-seen order. An empty
/// `expressions` list runs a single match-everything step.
pub fn collect_paths<P: FileListingProvider + ?Sized>(
    provider: &P,
    repository: &str,
    expressions: &[String],
) -> Vec<String> {
    let default_step = ["*".to_string()];
    let steps: &[String] = if expressions.is_empty() {
        &default_step
    } else {
        expressions
    };

    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for expression in steps {
        match provider.list_paths(repository, expression) {
            Ok(found) => {
                debug!("Search '{}' returned {} paths", expression, found.len());
                paths.extend(found.into_iter().filter(|p| seen.insert(p.clone())));
            }
            Err(e) => {
                warn!(
                    "Search '{}' on {} failed, treating as no files: {}",
                    expression, repository, e
                );
            }
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider with canned answers per expression.
    struct CannedProvider;

    impl FileListingProvider for CannedProvider {
        fn list_paths(
            &self,
            _repository: &str,
            expression: &str,
        ) -> Result<Vec<String>, ProviderError> {
            let owned = |paths: &[&str]| -> Vec<String> {
                paths.iter().map(|p| p.to_string()).collect()
            };
            match expression {
                "env" => Ok(owned(&[".env", "config/.env.test"])),
                "config" => Ok(owned(&["config/.env.test", "config/app.yml"])),
                "limited" => Err(ProviderError::RateLimited {
                    retry_after: Some(60),
                }),
                "*" => Ok(vec!["everything".to_string()]),
                _ => Err(ProviderError::Transport("connection reset".to_string())),
            }
        }
    }

    #[test]
    fn test_collect_merges_and_dedups() {
        let expressions = vec!["env".to_string(), "config".to_string()];
        let paths = collect_paths(&CannedProvider, "acme/api", &expressions);
        assert_eq!(paths, vec![".env", "config/.env.test", "config/app.yml"]);
    }

    #[test]
    fn test_failed_steps_yield_no_files() {
        let expressions = vec![
            "limited".to_string(),
            "env".to_string(),
            "broken".to_string(),
        ];
        let paths = collect_paths(&CannedProvider, "acme/api", &expressions);
        assert_eq!(paths, vec![".env", "config/.env.test"]);
    }

    #[test]
    fn test_empty_expressions_list_everything() {
        let paths = collect_paths(&CannedProvider, "acme/api", &[]);
        assert_eq!(paths, vec!["everything"]);
    }
}
