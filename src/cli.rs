//! Command-line interface argument parsing.

use crate::models::RiskLevel;
use crate::selector::AnalysisIntent;
use clap::Parser;
use std::path::PathBuf;

/// riskscan - security triage for repositories
///
/// Classifies repository files by security relevance, groups them into
/// chunks, analyzes each chunk and reports an overall risk verdict.
///
/// Examples:
///   riskscan --repo https://github.com/owner/repo.git
///   riskscan --repo https://github.com/owner/repo.git --intent secrets
///   riskscan --repo local --local ./my-project --format json
///   riskscan --repo local --local . --reasoning --model llama3.2:latest
///   riskscan --repo https://github.com/owner/repo.git --dry-run
///   riskscan --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Git repository URL to analyze
    ///
    /// Supports HTTPS and SSH URLs. With --local this is only used as the
    /// repository name in the report.
    #[arg(short, long, value_name = "URL", required_unless_present = "init_config")]
    pub repo: Option<String>,

    /// Local directory to analyze instead of cloning
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Specific branch to analyze
    ///
    /// If not specified, uses the default branch
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Analysis intent deciding which file categories are selected
    #[arg(short, long, value_name = "INTENT")]
    pub intent: Option<AnalysisIntent>,

    /// Override the intent's maximum number of selected files
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Consult the Ollama model for every chunk after the heuristics
    #[arg(long)]
    pub reasoning: bool,

    /// Ollama model used with --reasoning
    #[arg(short, long, env = "RISKSCAN_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for model responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Per-chunk model timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Search expressions used to list files (comma-separated)
    ///
    /// Each expression is a case-insensitive path substring; `*` lists
    /// everything. Example: --search env,config,docker
    #[arg(long, value_name = "EXPRS", value_delimiter = ',')]
    pub search: Option<Vec<String>>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Defaults to the path in the config file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with code 2 if the overall risk is at or above this level
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Dry run: list and classify files without analyzing them
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .riskscan.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .riskscan.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Risk threshold for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl FailOnLevel {
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            FailOnLevel::Low => RiskLevel::Low,
            FailOnLevel::Medium => RiskLevel::Medium,
            FailOnLevel::High => RiskLevel::High,
            FailOnLevel::Critical => RiskLevel::Critical,
        }
    }

    /// Whether `risk` reaches this threshold.
    pub fn is_exceeded_by(&self, risk: RiskLevel) -> bool {
        risk >= self.risk_level()
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Repository name or URL as given on the command line.
    pub fn repo_url(&self) -> &str {
        self.repo.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        let repo = self.repo_url();
        if self.local.is_none() && !repo.starts_with("https://") && !repo.starts_with("git@") {
            return Err("Repository URL must start with 'https://' or 'git@'".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref local_path) = self.local {
            if !local_path.exists() {
                return Err(format!(
                    "Local directory does not exist: {}",
                    local_path.display()
                ));
            }
            if !local_path.is_dir() {
                return Err(format!(
                    "Local path is not a directory: {}",
                    local_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Log level from -v/-q and the config file's `verbose` default.
    /// `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
