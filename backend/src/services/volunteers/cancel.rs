use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Serialize;

#[derive(Serialize)]
struct CancelResponse {
    job_id: String,
    cancelled: bool,
}

/// Batches already written stay written; the job ends with a summary whose
/// `cancelled` flag is set.
pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = job_id.into_inner();
    if !state.cancel(&job_id).await {
        return Err(ApiError::NotFound(format!("running job {}", job_id)));
    }
    info!("Cancellation requested for upload job {}", job_id);
    Ok(HttpResponse::Ok().json(CancelResponse {
        job_id,
        cancelled: true,
    }))
}
