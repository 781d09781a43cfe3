//! RankCheck - where does a company rank, according to a panel of LLMs?
//!
//! A CLI tool that sends the same "top companies in this industry" prompt
//! to several chat-completion models and reports the company's position
//! in each model's answer.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid request, configuration error, or runtime error
//!   2 - --require-listed was set and no model ranked the company

mod backend;
mod cli;
mod config;
mod error;
mod models;
mod ranking;
mod report;

use anyhow::{Context, Result};
use backend::ChatClient;
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{RankingRequest, RankingSummary, Report, ReportMetadata};
use ranking::Aggregator;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("RankCheck v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Ranking failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .rankcheck.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model panel, list size, and endpoint.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install log subscriber: {}", e);
    }
}

/// Run one ranking request end to end. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Reject a blank company or industry before anything else happens
    let request = RankingRequest::new(
        args.company.as_deref().unwrap_or_default(),
        args.industry.as_deref().unwrap_or_default(),
    )?;

    let mut config = load_config(&args, Path::new("."))?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let client = ChatClient::new(config.client_config(args.api_key.clone()))?;
    if !client.has_credential() {
        warn!("OPENROUTER_API_KEY is not set; every backend will report a missing credential");
    }

    let aggregator = Aggregator::new(client, config.aggregator_config());
    let panel_size = config.panel.models.len();

    let progress = make_progress_bar(panel_size, args.quiet);
    let result = aggregator
        .rank_with_progress(&request, |model, outcome| {
            progress.set_message(format!(
                "{} → {}",
                model,
                outcome.describe(config.panel.top_k)
            ));
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let summary = RankingSummary::from_result(&result);
    let duration = start_time.elapsed().as_secs_f64();

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&result)?,
        OutputFormat::Markdown => report::generate_markdown_report(&Report {
            metadata: ReportMetadata {
                company: request.company().to_string(),
                industry: request.industry().to_string(),
                top_k: result.top_k(),
                generated_at: Utc::now(),
                duration_seconds: duration,
            },
            result: result.clone(),
            summary: summary.clone(),
        }),
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }

    info!(
        "{} ranked, {} not listed, {} failed ({:.1}s)",
        summary.ranked, summary.not_listed, summary.failed, duration
    );

    if args.require_listed && !summary.is_listed() {
        eprintln!(
            "\n⛔ No model ranked {} in its top {}. Failing (exit code 2).",
            request.company(),
            result.top_k()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Progress bar over panel members, drawn on stderr.
fn make_progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Load configuration from `--config`, or from `dir`, or use defaults.
///
/// A config file that exists but cannot be read or parsed is an error.
fn load_config(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_from_dir(dir).context("Invalid configuration")? {
        Some(config) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["rankcheck", "--company", "Acme", "--industry", "Rockets"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&args(&[]), dir.path()).unwrap();
        assert_eq!(config.panel.models, Config::default().panel.models);
    }

    #[test]
    fn test_load_config_reads_dir_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[panel]\nmodels = [\"mine/model\"]\n",
        )
        .unwrap();

        let config = load_config(&args(&[]), dir.path()).unwrap();
        assert_eq!(config.panel.models, vec!["mine/model"]);
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[panel\nmodels = 3").unwrap();

        let err = load_config(&args(&[]), dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid configuration"));
    }

    #[test]
    fn test_load_config_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let argv = args(&["--config", missing.to_str().unwrap()]);

        assert!(load_config(&argv, dir.path()).is_err());
    }
}
