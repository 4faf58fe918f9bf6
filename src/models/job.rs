//! Import job models for batch user ingestion.
//!
//! One job is created per uploaded roster file and tracks counters and
//! status across the batch calls that drive it to completion.

#![allow(dead_code)]

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Processing,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Source file format for an import job.
///
/// Derived from the file extension when the job is created and fixed
/// for the lifetime of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Xml,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Csv),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Detect the format from a file path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_str(&ext)
    }
}

/// A bulk user import job.
///
/// Rows are retained after completion so past imports remain queryable
/// as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    /// Database row ID, assigned at creation.
    pub id: i32,
    /// Display name of the uploaded file.
    pub file_name: String,
    /// Path to the already-persisted source file.
    pub file_path: String,
    /// Source format, derived from the file extension.
    pub format: SourceFormat,
    /// Total data rows counted once at creation.
    pub total_rows: i32,
    /// Rows consumed so far, across all batches.
    pub processed_rows: i32,
    /// Rows the dedup policy declined to write.
    pub skipped_rows: i32,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl ImportJob {
    /// Whether the job has reached its terminal state.
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Completion percentage, rounded to the nearest whole number.
    ///
    /// A job with zero total rows reports 0 rather than dividing by zero.
    pub fn percentage(&self) -> i32 {
        percentage(self.processed_rows, self.total_rows)
    }
}

/// Rounded completion percentage for `processed` out of `total` rows.
///
/// Defined as 0 when `total` is zero or negative.
pub fn percentage(processed: i32, total: i32) -> i32 {
    if total <= 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0).round() as i32
}
