//! Locating the target company in a parsed candidate list.

use super::parser::normalize;
use crate::models::BackendOutcome;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Corporate suffixes ignored by [`MatchPolicy::IgnoreLegalSuffix`].
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "ltd",
    "llc",
    "plc",
    "co",
    "company",
    "group",
];

/// How a candidate name is compared against the target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Equality on trimmed, lower-cased names
    #[default]
    Exact,
    /// Like `exact`, after dropping one trailing suffix such as "Inc." or "Ltd"
    IgnoreLegalSuffix,
}

impl MatchPolicy {
    /// Comparison key for an already-normalized name.
    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            MatchPolicy::Exact => Cow::Borrowed(name),
            MatchPolicy::IgnoreLegalSuffix => strip_legal_suffix(name),
        }
    }
}

fn strip_legal_suffix(name: &str) -> Cow<'_, str> {
    let words: Vec<&str> = name.split_whitespace().collect();

    let stripped = match words.split_last() {
        Some((last, rest))
            if !rest.is_empty() && LEGAL_SUFFIXES.contains(&last.trim_end_matches('.')) =>
        {
            rest.join(" ")
        }
        _ => words.join(" "),
    };

    let trimmed = stripped.trim_end_matches('.');
    if trimmed == name {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(trimmed.to_string())
    }
}

/// Find `company` in `candidates` and report its 1-based rank.
///
/// The first matching entry wins. No partial or substring matching.
pub fn resolve_rank(candidates: &[String], company: &str, policy: MatchPolicy) -> BackendOutcome {
    let target = normalize(company);
    let target = policy.key(&target);

    candidates
        .iter()
        .position(|candidate| policy.key(candidate) == target)
        .map(|index| BackendOutcome::Ranked(index + 1))
        .unwrap_or(BackendOutcome::NotListed)
}
