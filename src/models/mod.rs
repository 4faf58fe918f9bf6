//! Data models for rosterload.

mod job;
mod user;

pub use job::{percentage, ImportJob, JobStatus, SourceFormat};
pub use user::{UserAccount, UserRecord};
