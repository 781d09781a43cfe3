//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.rankcheck.toml` files. The API credential is deliberately not part
//! of the file; it comes from the environment or the command line.

use crate::backend::client::DEFAULT_API_URL;
use crate::backend::ClientConfig;
use crate::cli::OutputFormat;
use crate::models::ModelId;
use crate::ranking::{AggregatorConfig, MatchPolicy, DEFAULT_PROMPT_TEMPLATE, DEFAULT_TOP_K};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".rankcheck.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Panel settings.
    #[serde(default)]
    pub panel: PanelConfig,

    /// Backend endpoint settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Name matching settings.
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Which backends are asked, and for how many names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Model identifiers, queried for every request.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Size of the list requested from each backend.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Prompt with `{top_k}` and `{industry}` placeholders.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            top_k: default_top_k(),
            prompt_template: default_prompt_template(),
        }
    }
}

fn default_models() -> Vec<String> {
    vec![
        "openai/gpt-4o",
        "anthropic/claude-3.5-sonnet",
        "meta-llama/llama-3-70b-instruct",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Chat-completion URL shared by all panel members.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Name matching settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub policy: MatchPolicy,
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

    /// Try to load `.rankcheck.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref models) = args.models {
            self.panel.models = models.clone();
        }
        if let Some(top_k) = args.top_k {
            self.panel.top_k = top_k;
        }
        if let Some(ref api_url) = args.api_url {
            self.backend.api_url = api_url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }
        if let Some(policy) = args.match_policy {
            self.matching.policy = policy;
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
    }

    /// Check the merged configuration before any request runs.
    pub fn validate(&self) -> Result<()> {
        let models: Vec<&str> = self.panel.models.iter().map(|m| m.trim()).collect();

        if models.is_empty() {
            bail!("Panel must contain at least one model");
        }
        if models.iter().any(|m| m.is_empty()) {
            bail!("Panel contains an empty model identifier");
        }

        let mut seen = HashSet::new();
        for model in &models {
            if !seen.insert(*model) {
                bail!("Panel lists model '{}' more than once", model);
            }
        }

        if self.panel.top_k == 0 {
            bail!("top_k must be at least 1");
        }
        if !self.panel.prompt_template.contains("{industry}") {
            bail!("Prompt template must contain an {{industry}} placeholder");
        }
        if self.backend.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if !self.backend.api_url.starts_with("http://")
            && !self.backend.api_url.starts_with("https://")
        {
            bail!("API URL must start with 'http://' or 'https://'");
        }

        Ok(())
    }

    /// Panel identifiers in configured order.
    pub fn panel(&self) -> Vec<ModelId> {
        self.panel
            .models
            .iter()
            .map(|m| ModelId::new(m.trim()))
            .collect()
    }

    /// Settings for the ranking engine.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            panel: self.panel(),
            top_k: self.panel.top_k,
            prompt_template: self.panel.prompt_template.clone(),
            match_policy: self.matching.policy,
        }
    }

    /// Settings for the HTTP client, with the credential supplied separately.
    pub fn client_config(&self, api_key: Option<String>) -> ClientConfig {
        ClientConfig {
            api_url: self.backend.api_url.clone(),
            api_key,
            timeout_seconds: self.backend.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
