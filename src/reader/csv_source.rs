//! CSV roster reader.
//!
//! Rows carry five positional fields: username, email, first name,
//! last name, role. The first row is a header and is never a record.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::models::{SourceFormat, UserRecord};

use super::{ReadError, RecordSource};

/// Offset-addressed reader for CSV roster files.
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open_reader(&self) -> Result<csv::Reader<File>, ReadError> {
        // flexible: short rows pad to empty fields instead of failing
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        Ok(reader)
    }
}

#[async_trait::async_trait]
impl RecordSource for CsvRecordSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn source_path(&self) -> &Path {
        &self.path
    }

    /// Number of parsed records after the header row, counted with the
    /// same parser configuration the batch reader uses. Quoted embedded
    /// newlines and blank lines do not affect the count.
    async fn total_rows(&self) -> Result<usize, ReadError> {
        let mut reader = self.open_reader()?;
        let mut count = 0usize;
        for result in reader.byte_records() {
            result?;
            count += 1;
        }
        Ok(count)
    }

    async fn read_batch(&self, offset: usize, limit: usize) -> Result<Vec<UserRecord>, ReadError> {
        let mut reader = self.open_reader()?;
        let mut records = Vec::new();

        for result in reader.records().skip(offset).take(limit) {
            let row = result?;
            records.push(UserRecord {
                username: row.get(0).unwrap_or("").to_string(),
                email: row.get(1).unwrap_or("").to_string(),
                first_name: row.get(2).unwrap_or("").to_string(),
                last_name: row.get(3).unwrap_or("").to_string(),
                role: row.get(4).unwrap_or("").to_string(),
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_roster(dir: &tempfile::TempDir, name: &str, rows: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        for i in 0..rows {
            writeln!(
                f,
                "user{i},user{i}@example.com,First{i},Last{i},subscriber"
            )
            .unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_total_rows_excludes_header() {
        let dir = tempdir().unwrap();
        let path = write_roster(&dir, "roster.csv", 3);

        let source = CsvRecordSource::new(path);
        assert_eq!(source.total_rows().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_total_rows_header_only_and_empty() {
        let dir = tempdir().unwrap();

        let header_only = write_roster(&dir, "header.csv", 0);
        let source = CsvRecordSource::new(header_only);
        assert_eq!(source.total_rows().await.unwrap(), 0);

        let empty = dir.path().join("empty.csv");
        File::create(&empty).unwrap();
        let source = CsvRecordSource::new(empty);
        assert_eq!(source.total_rows().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_rows_counts_records_not_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multiline.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "jdoe,jdoe@example.com,Jane,\"Doe\nJr\",editor").unwrap();

        // One record spanning two physical lines
        let source = CsvRecordSource::new(path);
        assert_eq!(source.total_rows().await.unwrap(), 1);

        let records = source.read_batch(0, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].last_name, "Doe\nJr");
    }

    #[tokio::test]
    async fn test_total_rows_ignores_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gappy.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "user0,user0@example.com,First0,Last0,subscriber").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "user1,user1@example.com,First1,Last1,subscriber").unwrap();

        let source = CsvRecordSource::new(path);
        assert_eq!(source.total_rows().await.unwrap(), 2);
        assert_eq!(source.read_batch(0, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_batch_fields() {
        let dir = tempdir().unwrap();
        let path = write_roster(&dir, "roster.csv", 2);

        let source = CsvRecordSource::new(path);
        let records = source.read_batch(0, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username, "user0");
        assert_eq!(records[0].email, "user0@example.com");
        assert_eq!(records[0].first_name, "First0");
        assert_eq!(records[0].last_name, "Last0");
        assert_eq!(records[0].role, "subscriber");
    }

    #[tokio::test]
    async fn test_read_batch_offset_windows() {
        let dir = tempdir().unwrap();
        let path = write_roster(&dir, "roster.csv", 7);
        let source = CsvRecordSource::new(path);

        let first = source.read_batch(0, 3).await.unwrap();
        let second = source.read_batch(3, 3).await.unwrap();
        let third = source.read_batch(6, 3).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert_eq!(third.len(), 1);
        assert_eq!(first[0].username, "user0");
        assert_eq!(second[0].username, "user3");
        assert_eq!(third[0].username, "user6");

        // Windows are contiguous and disjoint
        let mut all: Vec<_> = first.into_iter().chain(second).chain(third).collect();
        all.dedup_by(|a, b| a.username == b.username);
        assert_eq!(all.len(), 7);
    }

    #[tokio::test]
    async fn test_read_batch_past_end_is_empty() {
        let dir = tempdir().unwrap();
        let path = write_roster(&dir, "roster.csv", 2);
        let source = CsvRecordSource::new(path);

        assert!(source.read_batch(2, 5).await.unwrap().is_empty());
        assert!(source.read_batch(100, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_short_rows_pad_to_empty_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "jdoe,jdoe@example.com").unwrap();

        let source = CsvRecordSource::new(path);
        let records = source.read_batch(0, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "jdoe");
        assert_eq!(records[0].first_name, "");
        assert_eq!(records[0].role, "");
    }

    #[tokio::test]
    async fn test_quoted_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quoted.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, r#"jdoe,jdoe@example.com,"Jane, M.",Doe,editor"#).unwrap();

        let source = CsvRecordSource::new(path);
        let records = source.read_batch(0, 10).await.unwrap();
        assert_eq!(records[0].first_name, "Jane, M.");
    }

    #[tokio::test]
    async fn test_stateless_rereads_are_deterministic() {
        let dir = tempdir().unwrap();
        let path = write_roster(&dir, "roster.csv", 5);
        let source = CsvRecordSource::new(path);

        let once = source.read_batch(2, 2).await.unwrap();
        let again = source.read_batch(2, 2).await.unwrap();
        assert_eq!(once, again);
    }
}
