//! Fuzzy similarity scoring between records.
//!
//! Display values are normalized (trimmed, lowercased, whitespace collapsed)
//! and compared with the configured [`SimilarityMetric`] (normalized
//! Levenshtein by default). An optional secondary field is blended in with a
//! fixed weight.

use std::cmp::Ordering;

use migrate_model::{Record, RecordKey, SecondaryField, SessionConfig, SimilarityMetric};
use rapidfuzz::distance::{jaro_winkler, levenshtein};
use serde::Serialize;

use crate::utils::{normalize_text, token_set};

/// Score for a single query-candidate pair with its breakdown.
#[derive(Debug, Clone)]
pub struct RecordScore {
    /// Final score (0.0 to 1.0).
    pub score: f64,
    /// Breakdown of score components for explainability.
    pub explanation: Vec<ScoreComponent>,
}

impl RecordScore {
    /// Human-readable explanation of the score.
    pub fn explain(&self) -> String {
        self.explanation
            .iter()
            .map(|c| format!("{}: {:.0}%", c.name, c.value * 100.0))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A component contributing to the final score.
#[derive(Debug, Clone)]
pub struct ScoreComponent {
    /// Component name (e.g., "Display similarity").
    pub name: &'static str,
    /// Component value.
    pub value: f64,
    /// Human-readable description.
    pub description: String,
}

/// A candidate record ranked against a query record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub key: RecordKey,
    /// Position of the candidate in the iteration order it was ranked from.
    pub position: usize,
    pub score: f64,
}

/// Scores query records against candidate records.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    display_field: String,
    metric: SimilarityMetric,
    secondary: Option<SecondaryField>,
}

impl SimilarityScorer {
    /// Create a scorer comparing `display_field` with the default metric.
    pub fn new(display_field: impl Into<String>) -> Self {
        Self {
            display_field: display_field.into(),
            metric: SimilarityMetric::default(),
            secondary: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            display_field: config.display_field.clone(),
            metric: config.metric,
            secondary: config.secondary.clone(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_secondary(mut self, secondary: Option<SecondaryField>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn display_field(&self) -> &str {
        &self.display_field
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Score a candidate against a query, in `[0, 1]`.
    ///
    /// Missing or empty display values score 0.
    pub fn score(&self, query: &Record, candidate: &Record) -> f64 {
        let primary = self.field_score(&self.display_field, query, candidate);
        match &self.secondary {
            Some(secondary) => match self.secondary_score(secondary, query, candidate) {
                Some(value) => blend(primary, value, secondary.weight),
                None => primary,
            },
            None => primary,
        }
    }

    /// Score a pair and keep the per-field breakdown.
    pub fn score_detailed(&self, query: &Record, candidate: &Record) -> RecordScore {
        let mut components = Vec::new();

        let primary = self.field_score(&self.display_field, query, candidate);
        components.push(ScoreComponent {
            name: "Display similarity",
            value: primary,
            description: format!("'{}' compared with {:?}", self.display_field, self.metric),
        });

        let mut score = primary;
        if let Some(secondary) = &self.secondary {
            match self.secondary_score(secondary, query, candidate) {
                Some(value) => {
                    score = blend(primary, value, secondary.weight);
                    components.push(ScoreComponent {
                        name: "Secondary similarity",
                        value,
                        description: format!(
                            "'{}' weighted {:.0}%",
                            secondary.field,
                            secondary.weight * 100.0
                        ),
                    });
                }
                None => components.push(ScoreComponent {
                    name: "Secondary missing",
                    value: 0.0,
                    description: format!("'{}' absent on one side", secondary.field),
                }),
            }
        }

        RecordScore {
            score,
            explanation: components,
        }
    }

    /// Rank candidates by descending score; ties keep iteration order.
    pub fn rank<'a, I>(&self, query: &Record, candidates: I, limit: usize) -> Vec<RankedCandidate>
    where
        I: IntoIterator<Item = (&'a RecordKey, &'a Record)>,
    {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .enumerate()
            .map(|(position, (key, record))| RankedCandidate {
                key: key.clone(),
                position,
                score: self.score(query, record),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        ranked.truncate(limit);
        ranked
    }

    fn field_score(&self, field: &str, query: &Record, candidate: &Record) -> f64 {
        match (comparable(query, field), comparable(candidate, field)) {
            (Some(left), Some(right)) => compare_normalized(&left, &right, self.metric),
            _ => 0.0,
        }
    }

    fn secondary_score(
        &self,
        secondary: &SecondaryField,
        query: &Record,
        candidate: &Record,
    ) -> Option<f64> {
        let left = comparable(query, &secondary.field)?;
        let right = comparable(candidate, &secondary.field)?;
        Some(compare_normalized(&left, &right, self.metric))
    }
}

/// Score two records on `display_field` with the default metric.
pub fn score_records(query: &Record, candidate: &Record, display_field: &str) -> f64 {
    SimilarityScorer::new(display_field).score(query, candidate)
}

/// Similarity of two raw strings under `metric`, in `[0, 1]`.
///
/// Empty strings (after normalization) score 0.
pub fn similarity(left: &str, right: &str, metric: SimilarityMetric) -> f64 {
    let left = normalize_text(left);
    let right = normalize_text(right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    compare_normalized(&left, &right, metric)
}

fn comparable(record: &Record, field: &str) -> Option<String> {
    let text = record.text(field)?;
    let normalized = normalize_text(&text);
    (!normalized.is_empty()).then_some(normalized)
}

fn compare_normalized(left: &str, right: &str, metric: SimilarityMetric) -> f64 {
    if left == right {
        return 1.0;
    }
    let raw = match metric {
        SimilarityMetric::Levenshtein => {
            levenshtein::normalized_similarity(left.chars(), right.chars())
        }
        SimilarityMetric::JaroWinkler => jaro_winkler::similarity(left.chars(), right.chars()),
        SimilarityMetric::TokenSet => token_overlap(left, right),
    };
    raw.clamp(0.0, 1.0)
}

fn token_overlap(left: &str, right: &str) -> f64 {
    let left = token_set(left);
    let right = token_set(right);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

fn blend(primary: f64, secondary: f64, weight: f64) -> f64 {
    ((1.0 - weight) * primary + weight * secondary).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Record {
        Record::new().with_field("name", name)
    }

    #[test]
    fn test_identical_after_normalization() {
        let scorer = SimilarityScorer::new("name");
        assert_eq!(scorer.score(&named("John Doe"), &named("  john   DOE ")), 1.0);
    }

    #[test]
    fn test_missing_values_score_zero() {
        let scorer = SimilarityScorer::new("name");
        assert_eq!(scorer.score(&Record::new(), &named("John")), 0.0);
        assert_eq!(scorer.score(&named(""), &named("")), 0.0);
        let null_name = Record::new().with_field("name", serde_json::Value::Null);
        assert_eq!(scorer.score(&null_name, &named("John")), 0.0);
    }

    #[test]
    fn test_disjoint_strings_score_low() {
        let score = similarity("abc", "xyz", SimilarityMetric::Levenshtein);
        assert_eq!(score, 0.0);
        let score = similarity("abc", "xyz", SimilarityMetric::JaroWinkler);
        assert!(score < 0.1, "got {score}");
    }

    #[test]
    fn test_levenshtein_scales_with_distance() {
        // "bob johnson" -> "robert johnson" takes four edits over 14 chars.
        let score = similarity("Bob Johnson", "Robert Johnson", SimilarityMetric::Levenshtein);
        assert!((score - (1.0 - 4.0 / 14.0)).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_token_set_ignores_order() {
        let score = similarity("Doe John", "john doe", SimilarityMetric::TokenSet);
        assert_eq!(score, 1.0);
        let score = similarity("acme corp", "acme inc", SimilarityMetric::TokenSet);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_display_values_compare_as_text() {
        let scorer = SimilarityScorer::new("code");
        let left = Record::new().with_field("code", 1234);
        let right = Record::new().with_field("code", "1234");
        assert_eq!(scorer.score(&left, &right), 1.0);
    }

    #[test]
    fn test_secondary_blend() {
        let scorer = SimilarityScorer::new("name").with_secondary(Some(SecondaryField {
            field: "email".to_string(),
            weight: 0.5,
        }));
        let left = named("John Doe").with_field("email", "jd@example.com");
        let right = named("John Doe").with_field("email", "zz@other.org");
        let score = scorer.score(&left, &right);
        assert!(score < 1.0 && score >= 0.5, "got {score}");

        // Missing secondary falls back to the display score.
        assert_eq!(scorer.score(&left, &named("John Doe")), 1.0);
    }

    #[test]
    fn test_explainability() {
        let scorer = SimilarityScorer::new("name").with_secondary(Some(SecondaryField {
            field: "email".to_string(),
            weight: 0.2,
        }));
        let detailed = scorer.score_detailed(&named("Jane"), &named("Jane"));
        assert_eq!(detailed.score, 1.0);
        assert_eq!(detailed.explanation.len(), 2);
        assert!(detailed.explain().contains("Display similarity: 100%"));
        assert!(detailed.explain().contains("Secondary missing"));
    }

    #[test]
    fn test_rank_orders_by_score_then_position() {
        let scorer = SimilarityScorer::new("name");
        let keys: Vec<RecordKey> = (0..3_i32).map(RecordKey::from).collect();
        let records = [named("Jon Doe"), named("John Doe"), named("John Doe")];
        let ranked = scorer.rank(&named("John Doe"), keys.iter().zip(records.iter()), 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].key, RecordKey::from(1));
        assert_eq!(ranked[1].key, RecordKey::from(2));
        assert_eq!(ranked[0].score, 1.0);
    }
}
