//! Per-record account upsert policy.
//!
//! Each roster record resolves against the account store in order:
//! username match updates the profile, otherwise an email held by any
//! other account skips the record, otherwise a new account is created
//! with a generated initial password.

use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::models::{UserAccount, UserRecord};
use crate::repository::diesel_pool::DieselError;
use crate::repository::diesel_users::DieselUserRepository;

/// Length of generated initial passwords.
const GENERATED_PASSWORD_LEN: usize = 12;

/// What happened to a single roster record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new account was created.
    Created,
    /// An existing account's profile was updated.
    Updated,
    /// Not applied: the email already belongs to a different account.
    Skipped,
    /// The store rejected the record.
    Failed,
}

/// Tally of outcomes across one or more batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records consumed, whatever their outcome.
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Failed => self.errors += 1,
        }
    }

    pub fn merge(&mut self, other: &BatchStats) {
        self.processed += other.processed;
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// Applies parsed roster records to the account store.
pub struct UserUpsert {
    users: DieselUserRepository,
    record_delay: Duration,
}

impl UserUpsert {
    pub fn new(users: DieselUserRepository) -> Self {
        Self {
            users,
            record_delay: Duration::from_millis(10),
        }
    }

    /// Pause inserted after each record to pace store writes.
    pub fn with_record_delay(mut self, record_delay: Duration) -> Self {
        self.record_delay = record_delay;
        self
    }

    /// Apply one record. Store failures are folded into the outcome so a
    /// bad record never aborts the batch it arrived in.
    pub async fn apply_record(&self, record: &UserRecord) -> RecordOutcome {
        match self.resolve(record).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    username = %record.username,
                    error = %err,
                    "record rejected by account store"
                );
                RecordOutcome::Failed
            }
        }
    }

    async fn resolve(&self, record: &UserRecord) -> Result<RecordOutcome, DieselError> {
        if record.username.is_empty() {
            return Ok(RecordOutcome::Failed);
        }

        if self
            .users
            .find_by_username(&record.username)
            .await?
            .is_some()
        {
            self.users
                .update_profile(
                    &record.username,
                    &record.first_name,
                    &record.last_name,
                    &record.role,
                )
                .await?;
            return Ok(RecordOutcome::Updated);
        }

        // The username is free but the email is taken. Creating would
        // attach a second account to the address, so the record is
        // dropped instead.
        if !record.email.is_empty() && self.users.email_exists(&record.email).await? {
            tracing::warn!(
                username = %record.username,
                email = %record.email,
                "email already belongs to another account, record skipped"
            );
            return Ok(RecordOutcome::Skipped);
        }

        let password = generate_password(GENERATED_PASSWORD_LEN);
        let account = UserAccount::from_record(record, &password);
        self.users.create(&account).await?;
        Ok(RecordOutcome::Created)
    }

    /// Apply a whole batch in order, pacing with the configured delay.
    pub async fn apply_batch(&self, records: &[UserRecord]) -> BatchStats {
        let mut stats = BatchStats::default();
        for record in records {
            let outcome = self.apply_record(record).await;
            stats.record(outcome);
            if !self.record_delay.is_zero() {
                tokio::time::sleep(self.record_delay).await;
            }
        }
        stats
    }
}

/// Random alphanumeric password for newly created accounts.
fn generate_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
