//! Batch import engine.
//!
//! One job is registered per roster file, then the file is consumed in
//! fixed-size batches addressed by row offset. The caller drives the
//! loop: each batch call reads its window, applies the records, and
//! persists cumulative counters, so progress survives between calls
//! and a poll from another connection sees live numbers.

mod driver;
mod upsert;

pub use driver::ImportDriver;
pub use upsert::{BatchStats, RecordOutcome, UserUpsert};

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::models::{percentage, ImportJob, JobStatus, SourceFormat};
use crate::reader::source_for;
use crate::repository::diesel_context::DieselDbContext;
use crate::repository::diesel_pool::DieselError;

/// Rows consumed per batch call.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Pause between records while applying a batch.
pub const DEFAULT_RECORD_DELAY: Duration = Duration::from_millis(10);

/// Failures surfaced by import operations.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The caller is not allowed to run imports.
    #[error("permission denied")]
    PermissionDenied,
    /// The file extension does not map to an importable format.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// The source file could not be registered for import.
    #[error("file upload failed: {0}")]
    UploadFailed(String),
    /// The supplied job id is not a valid identifier.
    #[error("invalid import id")]
    InvalidId,
    /// No job exists under the given id.
    #[error("import job {0} not found")]
    JobNotFound(i32),
    /// The job's source file could not be read back.
    #[error("could not read import file: {0}")]
    UnreadableFile(String),
    /// The job store failed.
    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

/// Returned by [`ImportEngine::start_import`].
#[derive(Debug, Clone, Serialize)]
pub struct StartReceipt {
    pub import_id: i32,
    pub total_rows: i32,
    pub file_name: String,
}

/// Returned by [`ImportEngine::process_batch`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Cumulative rows consumed, including this batch.
    pub processed: i32,
    pub total_rows: i32,
    pub percentage: i32,
    pub status: JobStatus,
}

/// Returned by [`ImportEngine::progress`].
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub processed: i32,
    pub total_rows: i32,
    pub percentage: i32,
    pub status: JobStatus,
    pub file_name: String,
}

impl From<&ImportJob> for ProgressReport {
    fn from(job: &ImportJob) -> Self {
        Self {
            processed: job.processed_rows,
            total_rows: job.total_rows,
            percentage: job.percentage(),
            status: job.status,
            file_name: job.file_name.clone(),
        }
    }
}

/// Orchestrates import jobs against one database.
pub struct ImportEngine {
    db: DieselDbContext,
    batch_size: usize,
    record_delay: Duration,
}

impl ImportEngine {
    pub fn new(db: DieselDbContext) -> Self {
        Self {
            db,
            batch_size: DEFAULT_BATCH_SIZE,
            record_delay: DEFAULT_RECORD_DELAY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_record_delay(mut self, record_delay: Duration) -> Self {
        self.record_delay = record_delay;
        self
    }

    pub fn db(&self) -> &DieselDbContext {
        &self.db
    }

    /// Register an import job for a roster file already on disk.
    ///
    /// The file is sized up front; the row total recorded here is what
    /// every later batch call measures completion against.
    pub async fn start_import(&self, path: &Path) -> Result<StartReceipt, ImportError> {
        self.start_import_as(path, None, None).await
    }

    /// As [`start_import`](Self::start_import), with optional overrides
    /// for the display name and the detected format.
    pub async fn start_import_as(
        &self,
        path: &Path,
        file_name: Option<&str>,
        format: Option<SourceFormat>,
    ) -> Result<StartReceipt, ImportError> {
        let format = match format {
            Some(format) => format,
            None => SourceFormat::from_path(path).ok_or_else(|| {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string();
                ImportError::UnsupportedFormat(ext)
            })?,
        };

        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        };

        let source = source_for(path, format);
        let total_rows = source
            .total_rows()
            .await
            .map_err(|e| ImportError::UploadFailed(e.to_string()))? as i32;

        let import_id = self
            .db
            .jobs()
            .create(&file_name, &path.to_string_lossy(), format, total_rows)
            .await?;

        tracing::info!(
            import_id,
            file = %file_name,
            format = format.as_str(),
            total_rows,
            "import job registered"
        );

        Ok(StartReceipt {
            import_id,
            total_rows,
            file_name,
        })
    }

    /// Consume one batch starting at `offset` and persist the counters.
    ///
    /// Calling on a completed job changes nothing and returns the
    /// stored state, so a stray retry after the final batch is safe.
    pub async fn process_batch(&self, id: i32, offset: i32) -> Result<BatchOutcome, ImportError> {
        let job = self.job(id).await?;

        if job.is_completed() {
            return Ok(BatchOutcome {
                processed: job.processed_rows,
                total_rows: job.total_rows,
                percentage: job.percentage(),
                status: job.status,
            });
        }

        let offset = offset.unsigned_abs() as usize;
        let source = source_for(Path::new(&job.file_path), job.format);
        let records = source
            .read_batch(offset, self.batch_size)
            .await
            .map_err(|e| ImportError::UnreadableFile(e.to_string()))?;

        let upsert = UserUpsert::new(self.db.users()).with_record_delay(self.record_delay);
        let stats = upsert.apply_batch(&records).await;

        let processed = job.processed_rows + stats.processed as i32;
        let skipped = job.skipped_rows + stats.skipped as i32;
        let status = if processed >= job.total_rows {
            JobStatus::Completed
        } else {
            JobStatus::Processing
        };

        self.db
            .jobs()
            .update_progress(id, processed, skipped, status)
            .await?;

        tracing::debug!(
            import_id = id,
            offset,
            batch = stats.processed,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            errors = stats.errors,
            status = status.as_str(),
            "batch applied"
        );

        Ok(BatchOutcome {
            processed,
            total_rows: job.total_rows,
            percentage: percentage(processed, job.total_rows),
            status,
        })
    }

    /// Read-only snapshot of a job's progress.
    pub async fn progress(&self, id: i32) -> Result<ProgressReport, ImportError> {
        let job = self.job(id).await?;
        Ok(ProgressReport::from(&job))
    }

    /// Past jobs, newest first.
    pub async fn history(&self, limit: i64) -> Result<Vec<ImportJob>, ImportError> {
        Ok(self.db.jobs().history(limit).await?)
    }

    /// Fetch a job, rejecting malformed and unknown ids.
    pub async fn job(&self, id: i32) -> Result<ImportJob, ImportError> {
        if id <= 0 {
            return Err(ImportError::InvalidId);
        }
        self.db
            .jobs()
            .get(id)
            .await?
            .ok_or(ImportError::JobNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    async fn setup(batch_size: usize) -> (ImportEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let engine = ImportEngine::new(ctx)
            .with_batch_size(batch_size)
            .with_record_delay(Duration::ZERO);
        (engine, dir)
    }

    fn write_csv(dir: &tempfile::TempDir, name: &str, rows: usize) -> PathBuf {
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

    fn write_xml(dir: &tempfile::TempDir, name: &str, usernames: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        writeln!(f, "<users>").unwrap();
        for username in usernames {
            writeln!(
                f,
                "<user><username>{username}</username><email>{username}@example.com</email><role>subscriber</role></user>"
            )
            .unwrap();
        }
        writeln!(f, "</users>").unwrap();
        path
    }

    #[tokio::test]
    async fn test_start_import_registers_job() {
        let (engine, dir) = setup(500).await;
        let path = write_csv(&dir, "roster.csv", 3);

        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 3);
        assert_eq!(receipt.file_name, "roster.csv");

        let job = engine.job(receipt.import_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.processed_rows, 0);
        assert_eq!(job.total_rows, 3);
        assert_eq!(job.format, SourceFormat::Csv);
    }

    #[tokio::test]
    async fn test_start_import_rejects_unknown_extension() {
        let (engine, dir) = setup(500).await;
        let path = dir.path().join("roster.xlsx");
        File::create(&path).unwrap();

        match engine.start_import(&path).await {
            Err(ImportError::UnsupportedFormat(ext)) => assert_eq!(ext, "xlsx"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_import_missing_file_is_upload_failure() {
        let (engine, dir) = setup(500).await;
        let path = dir.path().join("ghost.csv");

        assert!(matches!(
            engine.start_import(&path).await,
            Err(ImportError::UploadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_single_batch_import_completes() {
        let (engine, dir) = setup(500).await;
        let path = write_csv(&dir, "roster.csv", 3);

        let receipt = engine.start_import(&path).await.unwrap();
        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();

        assert_eq!(outcome.processed, 3);
        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.percentage, 100);
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(engine.db().users().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_multi_batch_import_accumulates() {
        let (engine, dir) = setup(2).await;
        let path = write_csv(&dir, "roster.csv", 5);

        let receipt = engine.start_import(&path).await.unwrap();
        let id = receipt.import_id;

        let first = engine.process_batch(id, 0).await.unwrap();
        assert_eq!(first.processed, 2);
        assert_eq!(first.percentage, 40);
        assert_eq!(first.status, JobStatus::Processing);

        let second = engine.process_batch(id, first.processed).await.unwrap();
        assert_eq!(second.processed, 4);
        assert_eq!(second.percentage, 80);
        assert_eq!(second.status, JobStatus::Processing);

        let third = engine.process_batch(id, second.processed).await.unwrap();
        assert_eq!(third.processed, 5);
        assert_eq!(third.percentage, 100);
        assert_eq!(third.status, JobStatus::Completed);

        assert_eq!(engine.db().users().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_xml_import_end_to_end() {
        let (engine, dir) = setup(2).await;
        let path = write_xml(&dir, "roster.xml", &["ada", "grace", "edsger"]);

        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 3);

        let mut offset = 0;
        loop {
            let outcome = engine.process_batch(receipt.import_id, offset).await.unwrap();
            if outcome.status == JobStatus::Completed {
                break;
            }
            offset = outcome.processed;
        }

        let users = engine.db().users().list(10).await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["ada", "edsger", "grace"]);
    }

    #[tokio::test]
    async fn test_reimport_updates_instead_of_duplicating() {
        let (engine, dir) = setup(500).await;

        let first = write_csv(&dir, "first.csv", 3);
        let receipt = engine.start_import(&first).await.unwrap();
        engine.process_batch(receipt.import_id, 0).await.unwrap();

        // Same usernames again, different profile data
        let second = dir.path().join("second.csv");
        let mut f = File::create(&second).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        for i in 0..3 {
            writeln!(f, "user{i},user{i}@example.com,Renamed{i},Last{i},editor").unwrap();
        }
        drop(f);

        let receipt = engine.start_import(&second).await.unwrap();
        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);

        assert_eq!(engine.db().users().count().await.unwrap(), 3);
        let account = engine
            .db()
            .users()
            .find_by_username("user1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.first_name, "Renamed1");
        assert_eq!(account.role, "editor");
    }

    #[tokio::test]
    async fn test_email_collision_counts_as_skipped() {
        let (engine, dir) = setup(500).await;

        let path = dir.path().join("collide.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "original,shared@example.com,One,Owner,editor").unwrap();
        writeln!(f, "imposter,shared@example.com,Two,Claimer,editor").unwrap();
        drop(f);

        let receipt = engine.start_import(&path).await.unwrap();
        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();

        // Both rows consumed; only one account exists
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(engine.db().users().count().await.unwrap(), 1);

        let job = engine.job(receipt.import_id).await.unwrap();
        assert_eq!(job.skipped_rows, 1);
    }

    #[tokio::test]
    async fn test_empty_file_completes_immediately() {
        let (engine, dir) = setup(500).await;
        let path = write_csv(&dir, "empty.csv", 0);

        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 0);

        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.percentage, 0);
        assert_eq!(outcome.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_xml_with_no_users_completes_immediately() {
        let (engine, dir) = setup(500).await;
        let path = write_xml(&dir, "empty.xml", &[]);

        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 0);

        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.percentage, 0);
        assert_eq!(outcome.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_quoted_newline_rows_complete() {
        let (engine, dir) = setup(500).await;
        let path = dir.path().join("multiline.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "jdoe,jdoe@example.com,Jane,\"Doe\nJr\",editor").unwrap();
        writeln!(f, "bsmith,bsmith@example.com,Bob,Smith,subscriber").unwrap();
        drop(f);

        // Three physical data lines, two records
        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 2);

        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.percentage, 100);
        assert_eq!(outcome.status, JobStatus::Completed);

        let account = engine
            .db()
            .users()
            .find_by_username("jdoe")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.last_name, "Doe\nJr");
    }

    #[tokio::test]
    async fn test_blank_lines_do_not_stall_completion() {
        let (engine, dir) = setup(500).await;
        let path = dir.path().join("gappy.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "username,email,first_name,last_name,role").unwrap();
        writeln!(f, "user0,user0@example.com,First0,Last0,subscriber").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "user1,user1@example.com,First1,Last1,subscriber").unwrap();
        drop(f);

        let receipt = engine.start_import(&path).await.unwrap();
        assert_eq!(receipt.total_rows, 2);

        let outcome = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_progress_is_a_read_only_snapshot() {
        let (engine, dir) = setup(2).await;
        let path = write_csv(&dir, "roster.csv", 5);

        let receipt = engine.start_import(&path).await.unwrap();
        engine.process_batch(receipt.import_id, 0).await.unwrap();

        let once = engine.progress(receipt.import_id).await.unwrap();
        let again = engine.progress(receipt.import_id).await.unwrap();

        assert_eq!(once.processed, 2);
        assert_eq!(once.percentage, 40);
        assert_eq!(once.status, JobStatus::Processing);
        assert_eq!(once.file_name, "roster.csv");
        assert_eq!(again.processed, once.processed);
        assert_eq!(again.status, once.status);
    }

    #[tokio::test]
    async fn test_invalid_and_unknown_ids() {
        let (engine, _dir) = setup(500).await;

        assert!(matches!(
            engine.progress(0).await,
            Err(ImportError::InvalidId)
        ));
        assert!(matches!(
            engine.progress(-4).await,
            Err(ImportError::InvalidId)
        ));
        assert!(matches!(
            engine.progress(999).await,
            Err(ImportError::JobNotFound(999))
        ));
        assert!(matches!(
            engine.process_batch(999, 0).await,
            Err(ImportError::JobNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_batch_on_completed_job_is_a_no_op() {
        let (engine, dir) = setup(500).await;
        let path = write_csv(&dir, "roster.csv", 2);

        let receipt = engine.start_import(&path).await.unwrap();
        engine.process_batch(receipt.import_id, 0).await.unwrap();

        let replay = engine.process_batch(receipt.import_id, 0).await.unwrap();
        assert_eq!(replay.processed, 2);
        assert_eq!(replay.status, JobStatus::Completed);
        // No rows re-applied
        assert_eq!(engine.db().users().count().await.unwrap(), 2);
        let job = engine.job(receipt.import_id).await.unwrap();
        assert_eq!(job.processed_rows, 2);
    }

    #[tokio::test]
    async fn test_deleted_source_file_is_unreadable() {
        let (engine, dir) = setup(500).await;
        let path = write_csv(&dir, "roster.csv", 3);

        let receipt = engine.start_import(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            engine.process_batch(receipt.import_id, 0).await,
            Err(ImportError::UnreadableFile(_))
        ));
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let (engine, dir) = setup(500).await;

        for name in ["a.csv", "b.csv", "c.csv"] {
            let path = write_csv(&dir, name, 1);
            engine.start_import(&path).await.unwrap();
        }

        let history = engine.history(10).await.unwrap();
        assert_eq!(history.len(), 3);
        let names: Vec<_> = history.iter().map(|j| j.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.csv", "b.csv", "a.csv"]);

        let capped = engine.history(2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }
}
