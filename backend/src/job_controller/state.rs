//! Tracks upload jobs that run outside the request/response cycle.
//!
//! - `JobsState`: clonable shared state injected into the actix app as
//!   `web::Data`. Holds every job's latest status and the cancellation token
//!   of each job that is still running.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the single task that drains `JobUpdate` messages
//!   and applies them to the status map.
//! - `JobProgress`: the pipeline's progress sink for one job.

use crate::pipeline::ProgressSink;
use common::jobs::JobStatus;
use log::debug;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Capacity of the update channel created by [`JobsState::new`].
pub const UPDATE_CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct JobsState {
    /// Latest status per job ID. Read by the status endpoint, written by
    /// `start_job_updater` and by the scheduler when a job is registered.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Tokens of jobs that have not finished yet.
    pub cancellations: Arc<RwLock<HashMap<String, CancellationToken>>>,

    /// Running jobs push their status changes here instead of writing
    /// `jobs` directly, so updates from one job apply in send order.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Fresh state plus the receiver to hand to [`start_job_updater`].
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            cancellations: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its ID and token.
    pub async fn register(&self) -> (String, CancellationToken) {
        let job_id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        self.jobs.write().await.insert(job_id.clone(), JobStatus::Pending);
        self.cancellations
            .write()
            .await
            .insert(job_id.clone(), token.clone());
        (job_id, token)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Trips the token of a running job. Returns false when the job is
    /// unknown or has already finished.
    pub async fn cancel(&self, job_id: &str) -> bool {
        match self.cancellations.read().await.get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Queues the final status and forgets the job's token.
    pub async fn finish(&self, job_id: &str, status: JobStatus) {
        self.cancellations.write().await.remove(job_id);
        let update = JobUpdate {
            job_id: job_id.to_string(),
            status,
        };
        if let Err(mpsc::error::SendError(update)) = self.tx.send(update).await {
            // updater is gone; write through so pollers still see the result
            self.jobs.write().await.insert(update.job_id, update.status);
        }
    }

    pub fn progress_sink(&self, job_id: &str) -> JobProgress {
        JobProgress {
            job_id: job_id.to_string(),
            tx: self.tx.clone(),
        }
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies updates in arrival order. A finished job keeps its final status.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        match jobs.get(&update.job_id) {
            Some(current) if current.is_finished() => {
                debug!("Ignoring late update for finished job {}", update.job_id);
            }
            _ => {
                jobs.insert(update.job_id, update.status);
            }
        }
    }
}

/// Forwards pipeline progress as `InProgress` updates.
///
/// Uses `try_send`: when the channel is full the update is dropped, and the
/// next one carries a higher percentage anyway.
pub struct JobProgress {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
}

impl ProgressSink for JobProgress {
    fn report(&self, percent: u32) {
        let _ = self.tx.try_send(JobUpdate {
            job_id: self.job_id.clone(),
            status: JobStatus::InProgress(percent.min(100)),
        });
    }
}
