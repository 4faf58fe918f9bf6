//! Offset-based roster file readers.
//!
//! Each source format implements [`RecordSource`]: count the logical
//! records in a file, or read a bounded batch starting at a record
//! offset. Readers are stateless across calls. Every call reopens the
//! file and seeks by offset, so a batch is a pure function of
//! (path, offset, limit) and any caller can resume at any offset
//! without a retained file handle.

mod csv_source;
mod xml_source;

pub use csv_source::CsvRecordSource;
pub use xml_source::XmlRecordSource;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{SourceFormat, UserRecord};

/// Errors that can occur while reading a roster file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML parse error: {0}")]
    Xml(String),
}

impl From<quick_xml::Error> for ReadError {
    fn from(e: quick_xml::Error) -> Self {
        ReadError::Xml(e.to_string())
    }
}

/// A roster file that can be counted and read in offset-addressed batches.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Format this source parses.
    fn format(&self) -> SourceFormat;

    /// Path to the roster file being read.
    fn source_path(&self) -> &Path;

    /// Count the logical records in the file.
    async fn total_rows(&self) -> Result<usize, ReadError>;

    /// Read up to `limit` records starting at record `offset`.
    ///
    /// Returns fewer than `limit` records at end of file and an empty
    /// vector when `offset` is at or past the end.
    async fn read_batch(&self, offset: usize, limit: usize) -> Result<Vec<UserRecord>, ReadError>;
}

/// Build the reader for a file in the given format.
pub fn source_for(path: &Path, format: SourceFormat) -> Box<dyn RecordSource> {
    let path = PathBuf::from(path);
    match format {
        SourceFormat::Csv => Box::new(CsvRecordSource::new(path)),
        SourceFormat::Xml => Box::new(XmlRecordSource::new(path)),
    }
}
