//! Persistence seam for validated volunteer records.
//!
//! The upload pipeline only ever talks to [`RecordStore`]; the SQLite
//! implementation in [`sqlite`] is what the server wires in.

mod sqlite;

pub use sqlite::SqliteRecordStore;

use async_trait::async_trait;
use common::model::outcome::BatchFailureKind;
use common::model::record::CandidateRecord;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A record collided with one already stored before this upload.
    #[error("Duplicate record: {detail}")]
    UniqueViolation { detail: String },

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn failure_kind(&self) -> BatchFailureKind {
        match self {
            StoreError::UniqueViolation { .. } => BatchFailureKind::UniqueViolation,
            StoreError::Backend(_) => BatchFailureKind::Store,
        }
    }

    /// Names the offending key in a uniqueness failure.
    pub(crate) fn for_key(self, key: &str) -> Self {
        match self {
            StoreError::UniqueViolation { detail } => StoreError::UniqueViolation {
                detail: format!("{} already exists ({})", key, detail),
            },
            other => other,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && matches!(
                        e.extended_code,
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    ) =>
            {
                StoreError::UniqueViolation {
                    detail: msg.clone().unwrap_or_else(|| err.to_string()),
                }
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Insert-many collaborator used by the batch writer.
///
/// One call is one batch. Implementations report how many rows the call
/// stored; a returned error means the batch as a whole failed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_many(&self, records: &[CandidateRecord]) -> Result<u64, StoreError>;
}
