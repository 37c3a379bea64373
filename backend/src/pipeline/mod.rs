//! The volunteer bulk-upload pipeline.
//!
//! An upload moves through these stages in order:
//!
//! 1. [`reader`] decodes the workbook or CSV into a header row and raw rows.
//! 2. [`headers`] maps header cells onto canonical field keys.
//! 3. [`normalize`] turns every raw row into a typed [`CandidateRecord`].
//! 4. [`validate`] checks and repairs each record. A single invalid row
//!    rejects the whole upload before anything is written.
//! 5. [`dedup`] keeps the first record per unique key.
//! 6. [`batch`] writes the survivors through a [`RecordStore`] in batches.
//! 7. [`report`] folds everything into one [`UploadOutcome`].
//!
//! Stages 1 to 5 are synchronous and CPU-bound ([`UploadPipeline::prepare`]);
//! the job runner calls them on the blocking pool. Only the batch writer
//! awaits the store.

pub mod batch;
pub mod dedup;
pub mod headers;
pub mod normalize;
pub mod reader;
pub mod report;
pub mod validate;

use self::batch::BatchWriter;
use self::dedup::{deduplicate, DedupStats};
use self::headers::HeaderResolver;
use self::normalize::normalize_row;
use self::reader::read_sheet;
use self::report::ReportBuilder;
use self::validate::{validate_row, RowValidation};
use crate::store::RecordStore;
use common::model::outcome::UploadOutcome;
use common::model::record::CandidateRecord;
use common::model::schema::FieldSchema;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

/// Receives percent-complete updates from a running upload.
///
/// Values are non-decreasing and never exceed 100.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u32);
}

impl ProgressSink for () {
    fn report(&self, _percent: u32) {}
}

/// Everything the batch writer needs once the file has been accepted.
#[derive(Debug)]
pub struct PreparedUpload {
    pub records: Vec<CandidateRecord>,
    pub dedup: DedupStats,
    report: ReportBuilder,
}

#[derive(Debug)]
pub enum Preparation {
    Ready(PreparedUpload),
    /// Nothing may be written; the outcome explains why.
    Rejected(UploadOutcome),
}

#[derive(Debug, Clone)]
pub struct UploadPipeline {
    schema: FieldSchema,
    resolver: HeaderResolver,
    writer: BatchWriter,
}

impl Default for UploadPipeline {
    fn default() -> Self {
        Self::new(FieldSchema::volunteer(), HeaderResolver::default(), BatchWriter::default())
    }
}

impl UploadPipeline {
    pub fn new(schema: FieldSchema, resolver: HeaderResolver, writer: BatchWriter) -> Self {
        Self {
            schema,
            resolver,
            writer,
        }
    }

    /// Runs every stage up to and including deduplication.
    pub fn prepare(&self, file_name: &str, bytes: &[u8], progress: &dyn ProgressSink) -> Preparation {
        progress.report(10);
        let report = ReportBuilder::new(format!("{:x}", md5::compute(bytes)));

        let sheet = match read_sheet(file_name, bytes) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!("Rejected '{}': {}", file_name, err);
                return Preparation::Rejected(report.structural(&err));
            }
        };
        let report = report.total_rows(sheet.rows.len());
        progress.report(30);

        let mapping = match self.resolver.resolve(&sheet.headers, &self.schema) {
            Ok(mapping) => mapping,
            Err(err) => {
                warn!("Rejected '{}': {}", file_name, err);
                return Preparation::Rejected(report.structural(&err));
            }
        };
        let report = report.ignored_columns(mapping.ignored());

        let mut records = Vec::with_capacity(sheet.rows.len());
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        for row in &sheet.rows {
            let record = normalize_row(&row.cells, &mapping, &self.schema);
            match validate_row(record, row.number, &self.schema) {
                RowValidation::Accepted { record, repairs } => {
                    warnings.extend(repairs);
                    records.push(record);
                }
                RowValidation::Rejected { errors: row_errors, .. } => errors.extend(row_errors),
            }
        }

        if !errors.is_empty() {
            warn!(
                "Rejected '{}': {} validation errors in {} rows",
                file_name,
                errors.len(),
                sheet.rows.len()
            );
            return Preparation::Rejected(report.invalid_rows(errors));
        }

        let deduplicated = deduplicate(records, self.schema.unique_key());
        if deduplicated.stats.missing_key_rows > 0 {
            warn!(
                "Skipped {} rows without {} in '{}'",
                deduplicated.stats.missing_key_rows,
                self.schema.unique_key(),
                file_name
            );
        }
        if deduplicated.stats.duplicate_rows > 0 {
            info!(
                "Dropped {} duplicate rows from '{}'",
                deduplicated.stats.duplicate_rows, file_name
            );
        }
        progress.report(50);

        Preparation::Ready(PreparedUpload {
            records: deduplicated.records,
            dedup: deduplicated.stats,
            report: report.warnings(warnings),
        })
    }

    /// Hands prepared records to the batch writer and builds the final summary.
    pub async fn write<S>(
        &self,
        prepared: PreparedUpload,
        store: &S,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> UploadOutcome
    where
        S: RecordStore + ?Sized,
    {
        let batches = self
            .writer
            .write(store, self.schema.unique_key(), &prepared.records, progress, cancel)
            .await;
        info!(
            "Stored {} of {} unique records in {} batches ({} failed)",
            batches.successful_insert_count,
            prepared.records.len(),
            batches.total_batches,
            batches.failures.len()
        );
        prepared.report.processed(prepared.dedup, batches)
    }

    /// `prepare` followed by `write`, on the current task.
    #[cfg(test)]
    pub async fn run<S>(
        &self,
        file_name: &str,
        bytes: &[u8],
        store: &S,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> UploadOutcome
    where
        S: RecordStore + ?Sized,
    {
        match self.prepare(file_name, bytes, progress) {
            Preparation::Ready(prepared) => self.write(prepared, store, progress, cancel).await,
            Preparation::Rejected(outcome) => outcome,
        }
    }
}
