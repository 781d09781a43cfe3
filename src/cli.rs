//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::ranking::MatchPolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// RankCheck - ask a panel of LLMs where a company ranks in its industry
///
/// Every model on the panel receives the same prompt asking for the top
/// companies in the industry. The report shows, per model, the company's
/// position, "Not in Top K", or why the model could not be queried.
///
/// Examples:
///   rankcheck --company Stripe --industry payments
///   rankcheck --company Rivian --industry "electric vehicles" --top-k 5 --format json
///   rankcheck --company Acme --industry rockets --model openai/gpt-4o,mistralai/mistral-large
///   rankcheck --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Company to look for
    #[arg(short, long, value_name = "NAME", required_unless_present = "init_config")]
    pub company: Option<String>,

    /// Industry to ask the panel about
    #[arg(short, long, value_name = "NAME", required_unless_present = "init_config")]
    pub industry: Option<String>,

    /// Models to query (comma-separated or repeated); replaces the configured panel
    ///
    /// Example: --model openai/gpt-4o,anthropic/claude-3.5-sonnet
    #[arg(short, long = "model", value_name = "MODEL", value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Number of companies each model is asked to list
    #[arg(short = 'k', long, value_name = "K")]
    pub top_k: Option<usize>,

    /// Chat-completion endpoint URL
    #[arg(long, value_name = "URL", env = "RANKCHECK_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as a bearer token to every backend
    #[arg(long, value_name = "KEY", env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// How listed names are compared with the company
    #[arg(long, value_name = "POLICY")]
    pub match_policy: Option<MatchPolicy>,

    /// Output format (markdown, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .rankcheck.toml in the current directory
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 unless at least one model ranks the company
    #[arg(long)]
    pub require_listed: bool,

    /// Generate a default .rankcheck.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("company", &self.company)
            .field("industry", &self.industry)
            .field("models", &self.models)
            .field("top_k", &self.top_k)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("match_policy", &self.match_policy)
            .field("format", &self.format)
            .field("output", &self.output)
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("require_listed", &self.require_listed)
            .field("init_config", &self.init_config)
            .finish()
    }
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON mapping of model to outcome
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Company and industry are checked later, when the request is built.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(0) = self.top_k {
            return Err("--top-k must be at least 1".to_string());
        }

        // Validate timeout if provided
        if let Some(0) = self.timeout {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
