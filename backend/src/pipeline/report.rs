use super::batch::BatchReport;
use super::dedup::DedupStats;
use crate::error::UploadError;
use common::model::outcome::{RejectionKind, UploadOutcome, UploadRejection, UploadSummary};

/// Accumulates what earlier stages learned about an upload and turns it
/// into the single outcome value handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    file_md5: String,
    total_rows: usize,
    warnings: Vec<String>,
    ignored_columns: Vec<String>,
}

impl ReportBuilder {
    pub fn new(file_md5: impl Into<String>) -> Self {
        Self {
            file_md5: file_md5.into(),
            ..Self::default()
        }
    }

    pub fn total_rows(mut self, total_rows: usize) -> Self {
        self.total_rows = total_rows;
        self
    }

    pub fn ignored_columns(mut self, columns: &[String]) -> Self {
        self.ignored_columns = columns.to_vec();
        self
    }

    pub fn warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn structural(self, err: &UploadError) -> UploadOutcome {
        self.reject(err.kind(), err.reasons())
    }

    pub fn invalid_rows(self, errors: Vec<String>) -> UploadOutcome {
        self.reject(RejectionKind::Validation, errors)
    }

    fn reject(self, kind: RejectionKind, reasons: Vec<String>) -> UploadOutcome {
        UploadOutcome::Rejected(UploadRejection {
            kind,
            total_rows: self.total_rows,
            reasons,
        })
    }

    pub fn processed(self, dedup: DedupStats, batches: BatchReport) -> UploadOutcome {
        UploadOutcome::Processed(UploadSummary {
            total_rows: self.total_rows,
            unique_rows: dedup.unique_rows,
            duplicate_rows: dedup.duplicate_rows,
            duplicate_ids: dedup.duplicate_ids,
            successful_insert_count: batches.successful_insert_count,
            batch_errors: batches.failures,
            warnings: self.warnings,
            ignored_columns: self.ignored_columns,
            file_md5: self.file_md5,
            cancelled: batches.cancelled,
        })
    }
}
