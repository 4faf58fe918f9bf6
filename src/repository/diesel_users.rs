//! Diesel-based user account repository for SQLite.
//!
//! The import upsert resolves records against this store: usernames are
//! unique, emails are only checked for existence at creation time.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewUserAccount, UserAccountRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::parse_datetime;
use crate::models::UserAccount;
use crate::schema::users;

/// Convert a database record to a domain model.
impl From<UserAccountRecord> for UserAccount {
    fn from(record: UserAccountRecord) -> Self {
        UserAccount {
            id: record.id,
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            password_digest: record.password_digest,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based user account repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: AsyncSqlitePool,
}

impl DieselUserRepository {
    /// Create a new Diesel user repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an account by username.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(username))
            .first::<UserAccountRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(UserAccount::from))
    }

    /// Check whether any account holds this email address.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = users::table
            .filter(users::email.eq(email))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    /// Insert a new account.
    pub async fn create(&self, account: &UserAccount) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = account.created_at.to_rfc3339();
        let updated_at = account.updated_at.to_rfc3339();
        let new_account = NewUserAccount {
            id: &account.id,
            username: &account.username,
            email: &account.email,
            first_name: &account.first_name,
            last_name: &account.last_name,
            role: &account.role,
            password_digest: &account.password_digest,
            created_at: &created_at,
            updated_at: &updated_at,
        };

        diesel::insert_into(users::table)
            .values(&new_account)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Apply a profile update to the account with this username.
    ///
    /// Email is never changed here; it is fixed at account creation.
    /// Returns false when no account matched.
    pub async fn update_profile(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let updated_at = Utc::now().to_rfc3339();

        let rows = diesel::update(users::table.filter(users::username.eq(username)))
            .set((
                users::first_name.eq(first_name),
                users::last_name.eq(last_name),
                users::role.eq(role),
                users::updated_at.eq(&updated_at),
            ))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// List accounts ordered by username.
    pub async fn list(&self, limit: i64) -> Result<Vec<UserAccount>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .order(users::username.asc())
            .limit(limit)
            .load::<UserAccountRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(UserAccount::from).collect())
    }

    /// Total number of accounts in the store.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        users::table.select(count_star()).first(&mut conn).await
    }
}
