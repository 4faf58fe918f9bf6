//! Diesel-based import job repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{ImportJobRecord, NewImportJob};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::parse_datetime;
use crate::models::{ImportJob, JobStatus, SourceFormat};
use crate::schema::import_jobs;

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    id: i64,
}

/// Convert a database record to a domain model.
impl From<ImportJobRecord> for ImportJob {
    fn from(record: ImportJobRecord) -> Self {
        ImportJob {
            id: record.id,
            file_name: record.file_name,
            file_path: record.file_path,
            format: SourceFormat::from_str(&record.source_format).unwrap_or(SourceFormat::Csv),
            total_rows: record.total_rows,
            processed_rows: record.processed_rows,
            skipped_rows: record.skipped_rows,
            status: JobStatus::from_str(&record.status).unwrap_or(JobStatus::New),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based import job repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselImportJobRepository {
    pool: AsyncSqlitePool,
}

impl DieselImportJobRepository {
    /// Create a new Diesel import job repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new job and return its assigned ID.
    ///
    /// Jobs start in `processing` with zeroed counters; the total row
    /// count is fixed here and never changes afterwards.
    pub async fn create(
        &self,
        file_name: &str,
        file_path: &str,
        format: SourceFormat,
        total_rows: i32,
    ) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339();
        let new_job = NewImportJob {
            file_name,
            file_path,
            source_format: format.as_str(),
            total_rows,
            processed_rows: 0,
            skipped_rows: 0,
            status: JobStatus::Processing.as_str(),
            created_at: &created_at,
        };

        diesel::insert_into(import_jobs::table)
            .values(&new_job)
            .execute(&mut conn)
            .await?;

        // Same connection as the insert, so the rowid is ours.
        diesel::sql_query("SELECT last_insert_rowid()")
            .get_result::<LastInsertRowId>(&mut conn)
            .await
            .map(|r| r.id as i32)
    }

    /// Get a job by ID.
    pub async fn get(&self, id: i32) -> Result<Option<ImportJob>, DieselError> {
        let mut conn = self.pool.get().await?;

        import_jobs::table
            .find(id)
            .first::<ImportJobRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(ImportJob::from))
    }

    /// Persist the counters and status for a job after a batch.
    pub async fn update_progress(
        &self,
        id: i32,
        processed_rows: i32,
        skipped_rows: i32,
        status: JobStatus,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(import_jobs::table.find(id))
            .set((
                import_jobs::processed_rows.eq(processed_rows),
                import_jobs::skipped_rows.eq(skipped_rows),
                import_jobs::status.eq(status.as_str()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// List past jobs, newest first.
    pub async fn history(&self, limit: i64) -> Result<Vec<ImportJob>, DieselError> {
        let mut conn = self.pool.get().await?;

        import_jobs::table
            .order((import_jobs::created_at.desc(), import_jobs::id.desc()))
            .limit(limit)
            .load::<ImportJobRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ImportJob::from).collect())
    }

    /// Check if a job exists.
    #[allow(dead_code)]
    pub async fn exists(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = import_jobs::table
            .filter(import_jobs::id.eq(id))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }
}
