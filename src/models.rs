use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use csv::StringRecord;
use serde::Serialize;

use crate::error::RowError;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_COVER: &str = "cover";
pub const FIELD_GAME: &str = "game";
pub const FIELD_CATE: &str = "cate";
pub const FIELD_FILENAME: &str = "filename";
pub const FIELD_CONTENT: &str = "content";

/// One data row of the input, keyed by header name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CsvRecord {
    pub line: u64,
    pub fields: HashMap<String, String>,
}

impl CsvRecord {
    /// Pair a raw record with the header row. Short rows simply lack the
    /// trailing fields; extra values past the header are dropped.
    pub fn from_string_record(headers: &StringRecord, record: &StringRecord, line: u64) -> Self {
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { line, fields }
    }

    pub fn from_pairs<K, V>(line: u64, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { line, fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn get_or_empty(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn require(&self, field: &str) -> Result<&str, RowError> {
        self.get(field).ok_or_else(|| RowError::missing(field))
    }

    pub fn title(&self) -> Result<&str, RowError> {
        self.require(FIELD_TITLE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    pub directory: PathBuf,
    pub file_name: String,
}

impl OutputPath {
    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub kind: String,
    pub error: String,
}

impl RowFailure {
    pub fn new(record: Option<&CsvRecord>, line: u64, err: &RowError) -> Self {
        Self {
            line,
            title: record.and_then(|r| r.get(FIELD_TITLE)).map(str::to_string),
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// A path that was written more than once during a run.
///
/// `case_only` marks paths that differ from the earlier one only in letter
/// case; they are separate files on case-sensitive filesystems but overwrite
/// each other elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct Collision {
    pub path: PathBuf,
    pub first_path: PathBuf,
    pub first_line: u64,
    pub line: u64,
    pub case_only: bool,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    pub output_root: PathBuf,
    pub dry_run: bool,
    pub rows_read: usize,
    pub files_written: usize,
    pub failures: Vec<RowFailure>,
    pub collisions: Vec<Collision>,
    pub started_at: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Local>>,
}

impl RunReport {
    pub fn new(input: PathBuf, output_root: PathBuf, dry_run: bool) -> Self {
        Self {
            input,
            output_root,
            dry_run,
            rows_read: 0,
            files_written: 0,
            failures: Vec::new(),
            collisions: Vec::new(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
