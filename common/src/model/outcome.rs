//! The report handed back to whoever started an upload.
//!
//! An upload either never reaches the record store ([`UploadOutcome::Rejected`],
//! carrying the human-readable reasons) or runs the write stage and reports
//! the full breakdown ([`UploadOutcome::Processed`]). Both shapes are built
//! once at the end of a job and never mutated afterwards.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Rejected(UploadRejection),
    Processed(UploadSummary),
}

impl UploadOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, UploadOutcome::Rejected(_))
    }

    pub fn summary(&self) -> Option<&UploadSummary> {
        match self {
            UploadOutcome::Processed(summary) => Some(summary),
            UploadOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&UploadRejection> {
        match self {
            UploadOutcome::Rejected(rejection) => Some(rejection),
            UploadOutcome::Processed(_) => None,
        }
    }
}

/// Why nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    UnsupportedFormat,
    UnreadableFile,
    EmptyFile,
    MissingHeaders,
    AmbiguousHeaders,
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRejection {
    pub kind: RejectionKind,
    /// Data rows seen before rejecting; zero for structural failures.
    pub total_rows: usize,
    pub reasons: Vec<String>,
}

impl UploadRejection {
    pub fn validation_error_count(&self) -> usize {
        match self.kind {
            RejectionKind::Validation => self.reasons.len(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailureKind {
    /// The store already holds one of the batch's keys.
    UniqueViolation,
    Store,
}

/// One batch the record store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Zero-based position of the batch in submission order.
    pub batch_index: usize,
    pub record_count: usize,
    pub first_key: Option<String>,
    pub last_key: Option<String>,
    pub kind: BatchFailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub total_rows: usize,
    pub unique_rows: usize,
    pub duplicate_rows: usize,
    pub duplicate_ids: Vec<String>,
    pub successful_insert_count: u64,
    pub batch_errors: Vec<BatchFailure>,
    /// Non-fatal repairs and resets applied while validating.
    pub warnings: Vec<String>,
    /// Header cells that matched no known field.
    pub ignored_columns: Vec<String>,
    /// Hex MD5 of the uploaded bytes.
    pub file_md5: String,
    /// Set when the job was cancelled before every batch was submitted.
    pub cancelled: bool,
}

impl UploadSummary {
    pub fn failed_batch_count(&self) -> usize {
        self.batch_errors.len()
    }
}
