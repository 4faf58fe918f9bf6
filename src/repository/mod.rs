//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over SQLite.

pub mod diesel_context;
pub mod diesel_jobs;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_users;
pub mod util;

// Re-export main types (may be unused in main binary but are public API)
#[allow(unused_imports)]
pub use diesel_context::DieselDbContext;
#[allow(unused_imports)]
pub use diesel_jobs::DieselImportJobRepository;
#[allow(unused_imports)]
pub use diesel_models::{ImportJobRecord, NewImportJob, NewUserAccount, UserAccountRecord};
#[allow(unused_imports)]
pub use diesel_pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
#[allow(unused_imports)]
pub use diesel_users::DieselUserRepository;

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
