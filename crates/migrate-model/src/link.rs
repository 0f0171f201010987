//! Links between old and new records and the cardinality policy governing them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::RecordKey;

/// How a link came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkOrigin {
    /// Created by an explicit user action.
    Manual,
    /// Proposed by auto-match and accepted by the session.
    Auto,
}

impl fmt::Display for LinkOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

/// A directed association from one old record to one new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub old_key: RecordKey,
    pub new_key: RecordKey,
    /// Similarity score for auto links; manual links carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub origin: LinkOrigin,
}

impl Link {
    pub fn manual(old_key: impl Into<RecordKey>, new_key: impl Into<RecordKey>) -> Self {
        Self {
            old_key: old_key.into(),
            new_key: new_key.into(),
            score: None,
            origin: LinkOrigin::Manual,
        }
    }

    pub fn auto(old_key: impl Into<RecordKey>, new_key: impl Into<RecordKey>, score: f64) -> Self {
        Self {
            old_key: old_key.into(),
            new_key: new_key.into(),
            score: Some(score.clamp(0.0, 1.0)),
            origin: LinkOrigin::Auto,
        }
    }

    /// Confidence in [0, 1]; zero for links without a score.
    pub fn confidence(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    /// True if this link connects the given pair.
    pub fn connects(&self, old_key: &RecordKey, new_key: &RecordKey) -> bool {
        &self.old_key == old_key && &self.new_key == new_key
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.old_key, self.new_key, self.origin)
    }
}

/// Rule constraining how many links a key may take part in.
///
/// An old record is always linked at most once. The policies differ only on
/// the new side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardinalityPolicy {
    /// Each new record is the target of at most one link.
    #[default]
    OneToOne,
    /// Several old records may link to the same new record.
    ManyToOne,
}

impl CardinalityPolicy {
    /// Maps the "allow multiple links" flag onto a policy.
    #[must_use]
    pub fn from_allow_multiple(allow_multiple_links: bool) -> Self {
        if allow_multiple_links {
            Self::ManyToOne
        } else {
            Self::OneToOne
        }
    }

    /// True if a new record may be targeted by more than one link.
    #[must_use]
    pub fn allows_shared_new(self) -> bool {
        matches!(self, Self::ManyToOne)
    }
}

impl fmt::Display for CardinalityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneToOne => f.write_str("one-to-one"),
            Self::ManyToOne => f.write_str("many-to-one"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_links_have_no_score() {
        let link = Link::manual(1, 101);
        assert_eq!(link.score, None);
        assert_eq!(link.confidence(), 0.0);
        assert_eq!(link.to_string(), "1 -> 101 (manual)");
    }

    #[test]
    fn auto_scores_are_clamped() {
        assert_eq!(Link::auto(1, 101, 1.2).score, Some(1.0));
        assert_eq!(Link::auto(1, 101, -0.5).score, Some(0.0));
    }

    #[test]
    fn link_serializes_without_empty_score() {
        let json = serde_json::to_string(&Link::manual("a", "b")).expect("serialize link");
        assert_eq!(json, r#"{"old_key":"a","new_key":"b","origin":"manual"}"#);
        let back: Link = serde_json::from_str(&json).expect("deserialize link");
        assert_eq!(back, Link::manual("a", "b"));
    }

    #[test]
    fn policy_from_flag() {
        assert_eq!(
            CardinalityPolicy::from_allow_multiple(true),
            CardinalityPolicy::ManyToOne
        );
        assert!(!CardinalityPolicy::from_allow_multiple(false).allows_shared_new());
    }
}
