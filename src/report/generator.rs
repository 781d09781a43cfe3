//! Markdown and JSON report generation.
//!
//! The JSON form is exactly the per-backend outcome mapping; the Markdown
//! form wraps the same mapping with metadata and a summary.

use crate::models::{BackendOutcome, RankingResult, RankingSummary, Report, ReportMetadata};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# RankCheck Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_results_section(&report.result));
    output.push_str(&generate_summary_section(&report.summary, report.result.len()));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Company:** {}\n", metadata.company));
    section.push_str(&format!("- **Industry:** {}\n", metadata.industry));
    section.push_str(&format!("- **List Size:** Top {}\n", metadata.top_k));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the per-backend results table.
fn generate_results_section(result: &RankingResult) -> String {
    let mut section = String::new();

    section.push_str("## Results\n\n");
    section.push_str("| Backend | Outcome |\n");
    section.push_str("|:---|:---|\n");

    for (model, outcome) in result.iter() {
        let marker = match outcome {
            BackendOutcome::Ranked(_) => "✅",
            BackendOutcome::NotListed => "➖",
            BackendOutcome::Failure(_) => "⚠️",
        };
        section.push_str(&format!(
            "| `{}` | {} {} |\n",
            model,
            marker,
            escape_cell(&outcome.describe(result.top_k()))
        ));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RankingSummary, panel_size: usize) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Ranked | Not Listed | Failed | **Panel** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.ranked, summary.not_listed, summary.failed, panel_size
    ));

    match (summary.best_rank, summary.mean_rank) {
        (Some(best), Some(mean)) => {
            let models: Vec<String> = summary
                .best_models
                .iter()
                .map(|m| format!("`{}`", m))
                .collect();
            section.push_str(&format!(
                "Best rank **#{}** from {}. Mean rank across ranking backends: {:.1}.\n\n",
                best,
                models.join(", "),
                mean
            ));
        }
        _ if summary.failed == panel_size => {
            section.push_str("Every backend failed; no ranking is available.\n\n");
        }
        _ => {
            section.push_str("No backend listed the company.\n\n");
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by RankCheck*\n".to_string()
}

/// Keep upstream error text from breaking the table.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate a JSON report: the outcome mapping, keyed by backend.
pub fn generate_json_report(result: &RankingResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
