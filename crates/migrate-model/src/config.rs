//! Session configuration.
//!
//! Hosts build a [`SessionConfig`] in code or deserialize it from a config
//! file; every field has a default so partial files are accepted.

use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::link::CardinalityPolicy;

/// Default confidence threshold for auto-match proposals.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// String similarity algorithm used to compare display values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    /// Normalized Levenshtein similarity: `1 - distance / max(len)`.
    #[default]
    Levenshtein,
    /// Jaro-Winkler similarity, favouring shared prefixes.
    JaroWinkler,
    /// Jaccard overlap of whitespace-separated tokens.
    TokenSet,
}

/// An auxiliary field blended into the display-field score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryField {
    /// Field name compared alongside the display field.
    pub field: String,
    /// Share of the final score taken by this field (0.0 to 1.0).
    pub weight: f64,
}

/// Settings for one migration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Field whose value identifies a record within its set.
    pub key_field: String,
    /// Field compared by the scorer and shown to users.
    pub display_field: String,
    /// Cardinality rule enforced on every link mutation.
    pub policy: CardinalityPolicy,
    /// Minimum score for an auto-match proposal (0.0 to 1.0).
    pub threshold: f64,
    /// Similarity algorithm for display values.
    pub metric: SimilarityMetric,
    /// Optional auxiliary comparison field.
    pub secondary: Option<SecondaryField>,
    /// Maximum number of undoable entries kept; unbounded when absent.
    pub history_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            display_field: "name".to_string(),
            policy: CardinalityPolicy::OneToOne,
            threshold: DEFAULT_THRESHOLD,
            metric: SimilarityMetric::Levenshtein,
            secondary: None,
            history_limit: None,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    #[must_use]
    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = field.into();
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: CardinalityPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_secondary(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.secondary = Some(SecondaryField {
            field: field.into(),
            weight,
        });
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Checks field names and numeric ranges.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.key_field.trim().is_empty() {
            return Err(InputError::InvalidConfig("key field is empty".to_string()));
        }
        if self.display_field.trim().is_empty() {
            return Err(InputError::InvalidConfig(
                "display field is empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(InputError::InvalidConfig(format!(
                "threshold {} is outside 0.0..=1.0",
                self.threshold
            )));
        }
        if let Some(secondary) = &self.secondary {
            if secondary.field.trim().is_empty() {
                return Err(InputError::InvalidConfig(
                    "secondary field is empty".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(&secondary.weight) {
                return Err(InputError::InvalidConfig(format!(
                    "secondary weight {} is outside 0.0..=1.0",
                    secondary.weight
                )));
            }
        }
        if self.history_limit == Some(0) {
            return Err(InputError::InvalidConfig(
                "history limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn threshold_out_of_range() {
        let config = SessionConfig::default().with_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(InputError::InvalidConfig(msg)) if msg.contains("threshold")
        ));
        assert!(
            SessionConfig::default()
                .with_threshold(f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn secondary_weight_checked() {
        let config = SessionConfig::default().with_secondary("email", 2.0);
        assert!(config.validate().is_err());
        let config = SessionConfig::default().with_secondary("email", 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_history_limit_rejected() {
        let config = SessionConfig::default().with_history_limit(Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: SessionConfig = toml::from_str(
            r#"
            display_field = "full_name"
            policy = "many-to-one"
            metric = "jaro-winkler"

            [secondary]
            field = "email"
            weight = 0.3
            "#,
        )
        .expect("parse config");
        assert_eq!(config.key_field, "id");
        assert_eq!(config.display_field, "full_name");
        assert_eq!(config.policy, CardinalityPolicy::ManyToOne);
        assert_eq!(config.metric, SimilarityMetric::JaroWinkler);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(
            config.secondary,
            Some(SecondaryField {
                field: "email".to_string(),
                weight: 0.3
            })
        );
    }
}
