use std::path::PathBuf;

use migrate_map::{ConfidenceReport, Progress};
use migrate_model::{CardinalityPolicy, LinkOrigin, RecordKey};

#[derive(Debug)]
pub struct MatchResult {
    pub policy: CardinalityPolicy,
    pub threshold: f64,
    /// Links created (or planned, on a dry run) by this auto-match pass.
    pub matched: usize,
    pub rows: Vec<LinkRow>,
    pub progress: Progress,
    /// Review levels of the links matched by this pass.
    pub confidence: ConfidenceReport,
    pub unlinked_old: Vec<RecordKey>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    pub incomplete: bool,
}

#[derive(Debug)]
pub struct LinkRow {
    pub old_key: RecordKey,
    pub old_display: String,
    pub new_key: RecordKey,
    pub new_display: String,
    pub score: Option<f64>,
    pub origin: LinkOrigin,
}

#[derive(Debug)]
pub struct SuggestResult {
    pub old_key: RecordKey,
    pub old_display: String,
    pub rows: Vec<SuggestionRow>,
}

#[derive(Debug)]
pub struct SuggestionRow {
    pub new_key: RecordKey,
    pub new_display: String,
    pub score: f64,
    /// Per-field score breakdown.
    pub explanation: String,
    /// Already linked to the queried old record.
    pub linked: bool,
}
