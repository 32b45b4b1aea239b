//! Configuration file handling.
//!
//! Settings come from `.riskscan.toml`; command-line flags override them.

use crate::chunker::CostModel;
use crate::models::SelectionPolicy;
use crate::provider::ProviderConfig;
use crate::reasoning::EngineConfig;
use crate::selector::AnalysisIntent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".riskscan.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Which files are selected.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Chunk cost constants.
    #[serde(default)]
    pub cost: CostModel,

    /// Reasoning engine settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Local file listing.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "riskscan_report.md".to_string()
}

/// File selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Analysis intent that picks the enabled categories.
    #[serde(default)]
    pub intent: AnalysisIntent,

    /// Overrides the intent's file limit when set.
    #[serde(default)]
    pub max_files: Option<usize>,
}

/// Reasoning engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Consult the model after the heuristics.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-chunk request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    300
}

impl ModelConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ollama_url: self.ollama_url.clone(),
            model_name: self.name.clone(),
            temperature: self.temperature,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the working directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a checkout's root.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge command-line arguments into this configuration.
    ///
    /// Only flags the user actually passed override file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(intent) = args.intent {
            self.selection.intent = intent;
        }
        if let Some(max_files) = args.max_files {
            self.selection.max_files = Some(max_files);
        }

        if args.reasoning {
            self.model.enabled = true;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref search) = args.search {
            self.provider.search = search.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The intent's policy with the configured file limit applied.
    pub fn selection_policy(&self) -> SelectionPolicy {
        let mut policy = self.selection.intent.policy();
        if let Some(max_files) = self.selection.max_files {
            policy.max_files = Some(max_files);
        }
        policy
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
