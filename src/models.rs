//! Data models for the ranking check.
//!
//! This module contains the core data structures used throughout
//! the application: the inbound request, per-backend outcomes, and
//! the assembled result mapping.

use crate::error::RequestError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A validated request: which company to look for, in which industry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRequest {
    company: String,
    industry: String,
}

impl RankingRequest {
    /// Build a request, rejecting blank fields.
    ///
    /// Both values are trimmed before storage.
    pub fn new(company: &str, industry: &str) -> Result<Self, RequestError> {
        let company = company.trim();
        let industry = industry.trim();

        if company.is_empty() {
            return Err(RequestError::MissingCompany);
        }
        if industry.is_empty() {
            return Err(RequestError::MissingIndustry);
        }

        Ok(Self {
            company: company.to_string(),
            industry: industry.to_string(),
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }
}

/// Opaque name of one backend, e.g. `openai/gpt-4o`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What one backend said about the company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    /// 1-based position in the backend's list.
    Ranked(usize),
    /// The backend answered, but the company was not in its list.
    NotListed,
    /// The backend could not be queried; the reason is human readable.
    Failure(String),
}

impl BackendOutcome {
    /// Render the outcome the way it appears in the outbound mapping.
    pub fn describe(&self, top_k: usize) -> String {
        match self {
            BackendOutcome::Ranked(n) => format!("#{}", n),
            BackendOutcome::NotListed => format!("Not in Top {}", top_k),
            BackendOutcome::Failure(reason) => format!("Error: {}", reason),
        }
    }

    #[cfg(test)]
    pub fn is_failure(&self) -> bool {
        matches!(self, BackendOutcome::Failure(_))
    }
}

/// One outcome per panel member, in panel order.
///
/// Serializes as a JSON object keyed by model identifier with the
/// human-readable outcome string as value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingResult {
    top_k: usize,
    entries: Vec<(ModelId, BackendOutcome)>,
}

impl RankingResult {
    pub(crate) fn new(top_k: usize, entries: Vec<(ModelId, BackendOutcome)>) -> Self {
        Self { top_k, entries }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up the outcome for a model.
    pub fn get(&self, model: &str) -> Option<&BackendOutcome> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == model)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelId, &BackendOutcome)> {
        self.entries.iter().map(|(id, outcome)| (id, outcome))
    }
}

impl Serialize for RankingResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, outcome) in &self.entries {
            map.serialize_entry(id.as_str(), &outcome.describe(self.top_k))?;
        }
        map.end()
    }
}

/// Summary statistics over a ranking result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingSummary {
    /// Number of backends that ranked the company.
    pub ranked: usize,
    /// Number of backends that answered without listing the company.
    pub not_listed: usize,
    /// Number of backends that failed.
    pub failed: usize,
    /// Lowest rank reported by any backend.
    pub best_rank: Option<usize>,
    /// Backends reporting `best_rank`, in panel order.
    pub best_models: Vec<ModelId>,
    /// Mean rank across the backends that ranked the company.
    pub mean_rank: Option<f64>,
}

impl RankingSummary {
    /// Creates a summary from a ranking result.
    pub fn from_result(result: &RankingResult) -> Self {
        let mut summary = Self::default();
        let mut rank_total = 0usize;

        for (id, outcome) in result.iter() {
            match outcome {
                BackendOutcome::Ranked(n) => {
                    summary.ranked += 1;
                    rank_total += n;
                    match summary.best_rank {
                        Some(best) if *n > best => {}
                        Some(best) if *n == best => summary.best_models.push(id.clone()),
                        _ => {
                            summary.best_rank = Some(*n);
                            summary.best_models = vec![id.clone()];
                        }
                    }
                }
                BackendOutcome::NotListed => summary.not_listed += 1,
                BackendOutcome::Failure(_) => summary.failed += 1,
            }
        }

        if summary.ranked > 0 {
            summary.mean_rank = Some(rank_total as f64 / summary.ranked as f64);
        }

        summary
    }

    /// True when at least one backend placed the company in its list.
    pub fn is_listed(&self) -> bool {
        self.ranked > 0
    }
}

/// Metadata about one ranking run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub company: String,
    pub industry: String,
    pub top_k: usize,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// Complete report for one ranking run.
#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub result: RankingResult,
    pub summary: RankingSummary,
}
