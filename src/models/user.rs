//! User account models for the import target store.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One parsed row from a roster file.
///
/// Transient: exists only between the reader and the upsert for a single
/// record. Missing columns or elements parse to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: role.into(),
        }
    }
}

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique identifier for this account.
    pub id: String,
    /// Login name, unique across the store.
    pub username: String,
    /// Email address, set at creation.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Hex SHA-256 digest of the account's initial password.
    pub password_digest: String,
    /// When the account was first created.
    pub created_at: DateTime<Utc>,
    /// When the account profile was last written.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Compute the stored digest for a password.
    pub fn digest_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a new account from a parsed record and a generated password.
    pub fn from_record(record: &UserRecord, password: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: record.username.clone(),
            email: record.email.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            role: record.role.clone(),
            password_digest: Self::digest_password(password),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_password() {
        let digest = UserAccount::digest_password("hunter2");
        assert_eq!(digest.len(), 64); // SHA-256 produces 64 hex chars
        assert_eq!(digest, UserAccount::digest_password("hunter2"));
        assert_ne!(digest, UserAccount::digest_password("hunter3"));
    }

    #[test]
    fn test_from_record() {
        let record = UserRecord::new("jdoe", "jdoe@example.com", "Jane", "Doe", "editor");
        let account = UserAccount::from_record(&record, "generated");
        assert_eq!(account.username, "jdoe");
        assert_eq!(account.email, "jdoe@example.com");
        assert_eq!(account.role, "editor");
        assert_eq!(account.created_at, account.updated_at);
        assert!(!account.id.is_empty());
    }
}
