//! Reading record sets, configuration and seed links from disk, and writing
//! export snapshots.
//!
//! Record files are JSON (an array of objects) or CSV (a header row; every
//! cell becomes a string field, empty cells become null).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use migrate_map::ExportSnapshot;
use migrate_model::{InputError, Link, RecordSet, SessionConfig, Side};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from host file handling.
#[derive(Debug, Error)]
pub enum FileError {
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON.
    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed CSV.
    #[error("failed to parse CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed TOML configuration.
    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Record file extension is neither `.json` nor `.csv`.
    #[error("unsupported record file {path} (expected .json or .csv)")]
    UnsupportedFormat { path: PathBuf },

    /// File parsed but its contents are not a valid record set or config.
    #[error("invalid input in {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: InputError,
    },
}

/// Result type for file operations.
pub type Result<T> = std::result::Result<T, FileError>;

/// Supported record file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    /// Detects the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Parses CSV text into one JSON object per row.
pub fn parse_csv_records<R: Read>(reader: R) -> std::result::Result<Vec<Value>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut fields = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let value = if cell.trim().is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(header.to_string(), value);
        }
        rows.push(Value::Object(fields));
    }
    Ok(rows)
}

/// Loads a keyed record set from a JSON or CSV file.
pub fn load_records(path: &Path, side: Side, key_field: &str) -> Result<RecordSet> {
    let format =
        RecordFormat::from_path(path).ok_or_else(|| FileError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
    let text = read(path)?;
    let set = match format {
        RecordFormat::Json => {
            let payload: Value = serde_json::from_str(&text).map_err(|source| FileError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            RecordSet::from_json(side, key_field, payload)
        }
        RecordFormat::Csv => {
            let rows = parse_csv_records(text.as_bytes()).map_err(|source| FileError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            RecordSet::from_values(side, key_field, rows)
        }
    };
    set.map_err(|source| FileError::Input {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses and validates a TOML session configuration.
pub fn parse_config(text: &str) -> std::result::Result<SessionConfig, ConfigError> {
    let config: SessionConfig = toml::from_str(text).map_err(ConfigError::Toml)?;
    config.validate().map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Why a configuration text was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Toml(toml::de::Error),
    #[error(transparent)]
    Invalid(InputError),
}

/// Loads a TOML session configuration file.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = read(path)?;
    parse_config(&text).map_err(|err| match err {
        ConfigError::Toml(source) => FileError::Toml {
            path: path.to_path_buf(),
            source,
        },
        ConfigError::Invalid(source) => FileError::Input {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Seed links come from a previous export or a bare list of links.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedFile {
    Snapshot { links: Vec<Link> },
    Links(Vec<Link>),
}

/// Parses seed links from JSON text.
pub fn parse_seed(text: &str) -> std::result::Result<Vec<Link>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        SeedFile::Snapshot { links } | SeedFile::Links(links) => links,
    })
}

/// Loads links to resume a session from.
pub fn load_seed(path: &Path) -> Result<Vec<Link>> {
    let text = read(path)?;
    parse_seed(&text).map_err(|source| FileError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes an export snapshot as pretty-printed JSON.
pub fn write_snapshot(path: &Path, snapshot: &ExportSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| FileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| FileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            RecordFormat::from_path(Path::new("old.JSON")),
            Some(RecordFormat::Json)
        );
        assert_eq!(
            RecordFormat::from_path(Path::new("dir/new.csv")),
            Some(RecordFormat::Csv)
        );
        assert_eq!(RecordFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(RecordFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_format_error() {
        let err = load_records(Path::new("records.xml"), Side::Old, "id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported record file records.xml (expected .json or .csv)"
        );
    }

    #[test]
    fn test_missing_file_error() {
        let err = load_records(Path::new("/nonexistent/old.json"), Side::Old, "id").unwrap_err();
        assert!(matches!(err, FileError::Read { .. }));
    }
}
