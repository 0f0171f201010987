//! Data model for record migration sessions.
//!
//! A session reconciles an "old" and a "new" [`RecordSet`] by maintaining a
//! set of [`Link`]s between their keys. This crate holds the value types and
//! the error taxonomy; the engine lives in `migrate-map`.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod link;
pub mod record;

pub use config::{SecondaryField, SessionConfig, SimilarityMetric};
pub use error::{InputError, LinkError, Result};
pub use link::{CardinalityPolicy, Link, LinkOrigin};
pub use record::{Record, RecordKey, RecordSet, Side};
