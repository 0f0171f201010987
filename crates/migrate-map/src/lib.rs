//! Matching and linking engine for record migration.
//!
//! - [`score`]: fuzzy similarity between records
//! - [`plan`]: auto-match proposals under a confidence threshold
//! - [`store`]: the authoritative, policy-checked link state
//! - [`history`]: invertible commands with undo/redo
//! - [`session`]: the façade hosts drive

#![deny(unsafe_code)]

pub mod confidence;
pub mod event;
pub mod history;
pub mod plan;
pub mod score;
pub mod session;
pub mod store;
mod utils;

pub use confidence::{ConfidenceLevel, ConfidenceProfile, ConfidenceReport, ConfidenceThresholds};
pub use event::SessionEvent;
pub use history::{Command, History};
pub use plan::AutoMatchPlanner;
pub use score::{
    RankedCandidate, RecordScore, ScoreComponent, SimilarityScorer, score_records, similarity,
};
pub use session::{ExportSnapshot, MigrationSession, Progress};
pub use store::{LinkStore, RemovedLink};
pub use utils::normalize_text;
