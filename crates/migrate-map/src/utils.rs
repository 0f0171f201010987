//! Text helpers shared by the scorer.

use std::collections::BTreeSet;

/// Normalizes text for comparison: trims, lowercases and collapses whitespace.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits normalized text into its distinct tokens.
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}
