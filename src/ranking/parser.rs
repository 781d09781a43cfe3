//! Parsing of free-text backend replies.

/// Normalize a name for comparison: trimmed and lower-cased.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Split a reply on commas into normalized candidate names.
///
/// Blank pieces are dropped; order and duplicates are kept. Never fails.
pub fn parse_candidates(text: &str) -> Vec<String> {
    text.split(',')
        .map(normalize)
        .filter(|candidate| !candidate.is_empty())
        .collect()
}
