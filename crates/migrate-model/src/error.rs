//! Error types for record sets and link mutations.

use thiserror::Error;

use crate::record::{RecordKey, Side};

/// Errors raised while building a session from caller-supplied input.
///
/// These are fatal to session creation: no operation is accepted until the
/// input is fixed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The record set payload is not a list of records.
    #[error("{side} record set is not an array")]
    NotAnArray { side: Side },

    /// A record is not a field map.
    #[error("{side} record at index {index} is not an object")]
    NotAnObject { side: Side, index: usize },

    /// A record lacks the configured key field.
    #[error("{side} record at index {index} is missing key field '{field}'")]
    MissingKey {
        side: Side,
        index: usize,
        field: String,
    },

    /// The key field holds a value that cannot identify a record.
    #[error("{side} record at index {index} has an invalid '{field}' value: {reason}")]
    InvalidKey {
        side: Side,
        index: usize,
        field: String,
        reason: &'static str,
    },

    /// Two records in the same set share a key.
    #[error("duplicate {side} key '{key}' at indices {first} and {second}")]
    DuplicateKey {
        side: Side,
        key: RecordKey,
        first: usize,
        second: usize,
    },

    /// A session setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A link supplied to resume a session violates the link invariants.
    #[error("seed link {old} -> {new} rejected: {source}")]
    InvalidSeed {
        old: RecordKey,
        new: RecordKey,
        #[source]
        source: LinkError,
    },
}

/// Errors raised by link mutations.
///
/// All variants are recoverable: the session state is unchanged when one is
/// returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// The old record already participates in a link.
    #[error("old record '{old}' is already linked to '{existing}'")]
    OldAlreadyLinked { old: RecordKey, existing: RecordKey },

    /// The new record is already the target of a link under one-to-one policy.
    #[error("new record '{new}' is already linked from '{existing}'")]
    NewAlreadyLinked { new: RecordKey, existing: RecordKey },

    /// A key does not exist in its record set.
    #[error("{side} record '{key}' not found")]
    NotFound { side: Side, key: RecordKey },

    /// History replay expected a link that is no longer present.
    #[error("link {old} -> {new} does not exist")]
    NotLinked { old: RecordKey, new: RecordKey },

    /// A link's score is not a finite value in `[0, 1]`.
    #[error("link {old} -> {new} has score {score}, expected a value in [0, 1]")]
    InvalidScore {
        old: RecordKey,
        new: RecordKey,
        score: f64,
    },
}

impl LinkError {
    /// True for cardinality violations.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::OldAlreadyLinked { .. } | Self::NewAlreadyLinked { .. }
        )
    }

    /// True when an operation referenced an unknown key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LinkError::NewAlreadyLinked {
            new: RecordKey::from(101),
            existing: RecordKey::from(1),
        };
        assert_eq!(err.to_string(), "new record '101' is already linked from '1'");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_seed_error_keeps_source() {
        let err = InputError::InvalidSeed {
            old: RecordKey::from(2),
            new: RecordKey::from(9),
            source: LinkError::NotFound {
                side: Side::New,
                key: RecordKey::from(9),
            },
        };
        assert_eq!(
            err.to_string(),
            "seed link 2 -> 9 rejected: new record '9' not found"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_score_display() {
        let err = LinkError::InvalidScore {
            old: RecordKey::from(1),
            new: RecordKey::from(101),
            score: 7.5,
        };
        assert_eq!(
            err.to_string(),
            "link 1 -> 101 has score 7.5, expected a value in [0, 1]"
        );
        assert!(!err.is_conflict());
    }
}
