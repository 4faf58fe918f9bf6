//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.

use diesel::prelude::*;

use crate::schema;

/// Import job record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::import_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImportJobRecord {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub source_format: String,
    pub total_rows: i32,
    pub processed_rows: i32,
    pub skipped_rows: i32,
    pub status: String,
    pub created_at: String,
}

/// New import job for insertion. The row ID is assigned by SQLite.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::import_jobs)]
pub struct NewImportJob<'a> {
    pub file_name: &'a str,
    pub file_path: &'a str,
    pub source_format: &'a str,
    pub total_rows: i32,
    pub processed_rows: i32,
    pub skipped_rows: i32,
    pub status: &'a str,
    pub created_at: &'a str,
}

/// User account record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserAccountRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub password_digest: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New user account for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUserAccount<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: &'a str,
    pub password_digest: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}
