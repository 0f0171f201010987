//! CLI argument definitions for `record-migrate`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use migrate_map::ConfidenceProfile;
use migrate_model::SimilarityMetric;

#[derive(Parser)]
#[command(
    name = "record-migrate",
    version,
    about = "Match and link records between an old and a new dataset",
    long_about = "Match records of an old dataset to records of a new dataset.\n\n\
                  Records are compared on a display field (plus optional weighted\n\
                  fields), linked greedily above a similarity threshold, and the\n\
                  resulting mapping is exported as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow record values in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Auto-match two record files and report the resulting links.
    Match(MatchArgs),

    /// Rank new-record candidates for one old record.
    Suggest(SuggestArgs),
}

/// Inputs and configuration shared by every command.
#[derive(Args)]
pub struct SessionArgs {
    /// Old records (.json array of objects or .csv with a header row).
    #[arg(long = "old", value_name = "FILE")]
    pub old: PathBuf,

    /// New records (.json or .csv).
    #[arg(long = "new", value_name = "FILE")]
    pub new: PathBuf,

    /// TOML session configuration; flags below override its values.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Field holding each record's unique key.
    #[arg(long = "key", value_name = "FIELD")]
    pub key_field: Option<String>,

    /// Field compared for similarity.
    #[arg(long = "display", value_name = "FIELD")]
    pub display_field: Option<String>,

    /// Minimum similarity (0.0 to 1.0) for an automatic link.
    #[arg(long = "threshold", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Allow several old records to link to the same new record.
    #[arg(long = "allow-multiple")]
    pub allow_multiple: bool,

    /// String similarity metric.
    #[arg(long = "metric", value_enum)]
    pub metric: Option<MetricArg>,

    /// Resume from links in a previous export (or a JSON array of links).
    #[arg(long = "seed", value_name = "FILE")]
    pub seed: Option<PathBuf>,
}

#[derive(Args)]
pub struct MatchArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Write the export snapshot to this JSON file.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show the planned links without applying or writing them.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Exit with status 1 unless every old record ends up linked.
    #[arg(long = "require-complete")]
    pub require_complete: bool,

    /// Score bands used to sort matched links into review levels.
    #[arg(long = "confidence", value_enum, default_value = "standard")]
    pub confidence: ConfidenceArg,
}

#[derive(Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Key of the old record to rank candidates for.
    #[arg(long = "record", value_name = "KEY")]
    pub record: String,

    /// Maximum number of candidates to show.
    #[arg(long = "limit", default_value_t = 5)]
    pub limit: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MetricArg {
    Levenshtein,
    JaroWinkler,
    TokenSet,
}

impl From<MetricArg> for SimilarityMetric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Levenshtein => Self::Levenshtein,
            MetricArg::JaroWinkler => Self::JaroWinkler,
            MetricArg::TokenSet => Self::TokenSet,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConfidenceArg {
    Standard,
    Strict,
    Relaxed,
}

impl From<ConfidenceArg> for ConfidenceProfile {
    fn from(value: ConfidenceArg) -> Self {
        match value {
            ConfidenceArg::Standard => Self::Standard,
            ConfidenceArg::Strict => Self::Strict,
            ConfidenceArg::Relaxed => Self::Relaxed,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
