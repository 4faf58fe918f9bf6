//! Diesel database context for managing connections and repository access.
//!
//! Provides a unified entry point for database operations using Diesel ORM
//! over SQLite (via SyncConnectionWrapper).

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_jobs::DieselImportJobRepository;
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::diesel_users::DieselUserRepository;

/// Idempotent schema bootstrap, kept in parity with the migration
/// registry (see tests/migration_parity.rs).
pub const INIT_SCHEMA_SQL: &str = r#"
-- Import jobs table
CREATE TABLE IF NOT EXISTS import_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    source_format TEXT NOT NULL,
    total_rows INTEGER NOT NULL DEFAULT 0,
    processed_rows INTEGER NOT NULL DEFAULT 0,
    skipped_rows INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'new',
    created_at TEXT NOT NULL
);

-- User accounts table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL DEFAULT '',
    password_digest TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_import_jobs_status ON import_jobs(status);
CREATE INDEX IF NOT EXISTS idx_import_jobs_created ON import_jobs(created_at);
CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
"#;

/// Diesel database context that provides repository access.
///
/// This is the primary interface for Diesel-based database operations.
/// Create one context per command or service, then use it to access all
/// repositories.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::new(&db_path);
/// let job = ctx.jobs().get(7).await?;
/// let account = ctx.users().find_by_username("jdoe").await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: AsyncSqlitePool,
}

impl DieselDbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a database URL.
    ///
    /// Accepts `sqlite:path/to/db.sqlite` URLs or bare file paths.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Create a context with an existing pool.
    #[allow(dead_code)]
    pub fn with_pool(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[allow(dead_code)]
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get an import job repository.
    pub fn jobs(&self) -> DieselImportJobRepository {
        DieselImportJobRepository::new(self.pool.clone())
    }

    /// Get a user account repository.
    pub fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    /// Initialize all database schemas.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(INIT_SCHEMA_SQL).await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<TableName> = diesel_async::RunQueryDsl::load(
            diesel::sql_query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            ),
            &mut conn,
        )
        .await?;

        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}
