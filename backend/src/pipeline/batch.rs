//! Submits deduplicated records to the record store in fixed-size batches.
//!
//! Batches go through an ordered stream whose concurrency bound is the
//! writer's `concurrency` field. The default bound of 1 keeps writes strictly
//! sequential, which keeps progress monotonic and the store's load bounded.
//! A failed batch is recorded and the next one still runs; nothing is retried.

use super::ProgressSink;
use crate::store::RecordStore;
use common::model::outcome::BatchFailure;
use common::model::record::CandidateRecord;
use common::model::schema::FieldKey;
use futures_util::stream::{self, StreamExt};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BATCH_SIZE: usize = 50;

// Preparation ends at 50%; batches fill the remaining half.
const PROGRESS_BASE: u32 = 50;
const PROGRESS_SPAN: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total_batches: usize,
    pub completed_batches: usize,
    pub successful_insert_count: u64,
    pub failures: Vec<BatchFailure>,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct BatchWriter {
    batch_size: usize,
    concurrency: usize,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchWriter {
    /// A zero batch size is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn progress_at(&self, completed: usize, total: usize) -> u32 {
        if total == 0 {
            return PROGRESS_BASE + PROGRESS_SPAN;
        }
        let done = completed.min(total) as u64;
        PROGRESS_BASE + (done * PROGRESS_SPAN as u64 / total as u64) as u32
    }

    pub async fn write<S>(
        &self,
        store: &S,
        key: FieldKey,
        records: &[CandidateRecord],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> BatchReport
    where
        S: RecordStore + ?Sized,
    {
        let batches: Vec<&[CandidateRecord]> = records.chunks(self.batch_size).collect();
        let mut report = BatchReport {
            total_batches: batches.len(),
            ..BatchReport::default()
        };
        if batches.is_empty() {
            progress.report(self.progress_at(0, 0));
            return report;
        }

        // Indices rather than slices go through the stream so the closure's
        // input carries no borrow and the future stays Send.
        let batches = &batches;
        let mut results = stream::iter(0..batches.len())
            .map(|index| {
                let batch = batches[index];
                async move {
                    if cancel.is_cancelled() {
                        return (index, batch, None);
                    }
                    (index, batch, Some(store.insert_many(batch).await))
                }
            })
            .buffered(self.concurrency);

        while let Some((index, batch, result)) = results.next().await {
            match result {
                None => {
                    report.cancelled = true;
                    continue;
                }
                Some(Ok(inserted)) => {
                    info!(
                        "Batch {}/{} stored {} of {} records",
                        index + 1,
                        report.total_batches,
                        inserted,
                        batch.len()
                    );
                    report.successful_insert_count += inserted;
                }
                Some(Err(err)) => {
                    error!("Batch {}/{} failed: {}", index + 1, report.total_batches, err);
                    report.failures.push(BatchFailure {
                        batch_index: index,
                        record_count: batch.len(),
                        first_key: batch.first().and_then(|r| r.text(key)).map(str::to_string),
                        last_key: batch.last().and_then(|r| r.text(key)).map(str::to_string),
                        kind: err.failure_kind(),
                        message: err.to_string(),
                    });
                }
            }
            report.completed_batches += 1;
            progress.report(self.progress_at(report.completed_batches, report.total_batches));
        }

        if report.cancelled {
            warn!(
                "Upload cancelled after {} of {} batches",
                report.completed_batches, report.total_batches
            );
        }
        report
    }
}
