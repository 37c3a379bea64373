use crate::model::outcome::UploadOutcome;
use serde::Serialize;

/// Status of a background upload job as seen by a polling client.
///
/// `InProgress` carries an advisory percentage in `0..=100`. A job that
/// rejected its file still ends in `Completed`: the rejection reasons live
/// in the outcome. `Failed` is reserved for infrastructure problems (the
/// worker panicked, the store could not be opened).
#[derive(Clone, Debug, Serialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(UploadOutcome),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
