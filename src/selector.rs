//! File selection for an analysis intent.
//!
//! Classifies a raw path list, drops what the policy disables, orders the
//! survivors by priority and category, and truncates to the policy limit.

use crate::classifier::classify;
use crate::models::{Category, ClassifiedFile, SelectionPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Named purpose of a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisIntent {
    Secrets,
    Vulnerabilities,
    Dependencies,
    CodePatterns,
    #[default]
    Default,
}

impl AnalysisIntent {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisIntent::Secrets => "secrets",
            AnalysisIntent::Vulnerabilities => "vulnerabilities",
            AnalysisIntent::Dependencies => "dependencies",
            AnalysisIntent::CodePatterns => "code-patterns",
            AnalysisIntent::Default => "default",
        }
    }

    /// The static selection policy for this intent.
    pub fn policy(&self) -> SelectionPolicy {
        match self {
            AnalysisIntent::Secrets => {
                SelectionPolicy::new(&[Category::Secret, Category::Config], Some(20))
            }
            AnalysisIntent::Vulnerabilities => SelectionPolicy::new(
                &[Category::Security, Category::Dependency, Category::Config],
                Some(15),
            ),
            AnalysisIntent::Dependencies => SelectionPolicy::new(&[Category::Dependency], Some(10)),
            AnalysisIntent::CodePatterns => SelectionPolicy::new(
                &[Category::Security, Category::Config, Category::Deployment],
                Some(25),
            ),
            AnalysisIntent::Default => SelectionPolicy::new(&Category::ALL, Some(30)),
        }
    }
}

impl fmt::Display for AnalysisIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "secrets" | "secret" => Ok(AnalysisIntent::Secrets),
            "vulnerabilities" | "vulnerability" => Ok(AnalysisIntent::Vulnerabilities),
            "dependencies" | "dependency" => Ok(AnalysisIntent::Dependencies),
            "code-patterns" | "patterns" => Ok(AnalysisIntent::CodePatterns),
            "default" | "" => Ok(AnalysisIntent::Default),
            other => Err(format!("Unknown analysis intent: {}", other)),
        }
    }
}

/// Resolve an external intent label to a policy. Unknown labels use the default policy.
#[allow(dead_code)] // Clap parses intents on the command line; kept for string labels
pub fn resolve_intent(label: &str) -> SelectionPolicy {
    label
        .parse::<AnalysisIntent>()
        .unwrap_or_default()
        .policy()
}

/// Select and order the security-relevant files from `paths`.
pub fn select<S: AsRef<str>>(paths: &[S], policy: &SelectionPolicy) -> Vec<ClassifiedFile> {
    let mut selected: Vec<ClassifiedFile> = paths
        .iter()
        .filter_map(|p| classify(p.as_ref()))
        .filter(|f| policy.is_enabled(f.category))
        .collect();

    // sort_by is stable, so ties keep input order
    selected.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| b.category.rank().cmp(&a.category.rank()))
    });

    if let Some(max) = policy.max_files {
        selected.truncate(max);
    }

    debug!(
        "Selected {} of {} paths (max_files: {:?})",
        selected.len(),
        paths.len(),
        policy.max_files
    );

    selected
}
