use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use crate::pipeline::Preparation;
use crate::services::AppContext;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::jobs::JobStatus;
use common::requests::{StartUploadResponse, UploadRequest};
use futures_util::StreamExt;
use log::{error, info};
use serde_json::from_slice;
use tokio_util::sync::CancellationToken;

/// A fully received upload, ready to hand to a job.
struct ReceivedUpload {
    file_name: String,
    bytes: Vec<u8>,
    request: UploadRequest,
}

pub(crate) async fn process(
    payload: Multipart,
    ctx: web::Data<AppContext>,
    jobs_state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    let upload = read_upload(payload, ctx.max_upload_bytes).await?;
    let job_id = schedule_upload_job(jobs_state.get_ref().clone(), ctx.get_ref().clone(), upload).await;
    Ok(HttpResponse::Ok().json(StartUploadResponse { job_id }))
}

/// Collects the `json` and `file` parts. Parts may arrive in either order;
/// unknown parts are skipped.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<ReceivedUpload, ApiError> {
    let mut request = UploadRequest::default();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("file") => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if file_name.trim().is_empty() {
                    return Err(ApiError::BadRequest("the file part has no file name".into()));
                }

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk?;
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge(max_bytes));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((file_name, bytes));
            }
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                if !bytes.iter().all(u8::is_ascii_whitespace) {
                    request = from_slice(&bytes)?;
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ApiError::BadRequest("missing file part".into()))?;
    Ok(ReceivedUpload {
        file_name,
        bytes,
        request,
    })
}

/// Registers a job and runs the upload in the background. Returns at once
/// with the job ID; the job reports through `JobsState`.
async fn schedule_upload_job(jobs_state: JobsState, ctx: AppContext, upload: ReceivedUpload) -> String {
    let (job_id, cancel) = jobs_state.register().await;
    let value = job_id.clone();

    tokio::spawn(async move {
        let status = run_upload_job(&jobs_state, &ctx, &value, upload, &cancel).await;
        if let JobStatus::Failed(reason) = &status {
            error!("Upload job {} failed: {}", value, reason);
        }
        jobs_state.finish(&value, status).await;
    });

    job_id
}

async fn run_upload_job(
    jobs_state: &JobsState,
    ctx: &AppContext,
    job_id: &str,
    upload: ReceivedUpload,
    cancel: &CancellationToken,
) -> JobStatus {
    let ReceivedUpload {
        file_name,
        bytes,
        request,
    } = upload;
    info!("Upload job {} started for '{}' ({} bytes)", job_id, file_name, bytes.len());

    let progress = jobs_state.progress_sink(job_id);
    let pipeline = ctx.pipeline.clone();
    // decoding and validation are CPU-bound; keep them off the async workers
    let handle = tokio::task::spawn_blocking(move || {
        let preparation = pipeline.prepare(&file_name, &bytes, &progress);
        (preparation, progress)
    });
    let (preparation, progress) = match handle.await {
        Ok(prepared) => prepared,
        Err(join_err) => return JobStatus::Failed(format!("join error: {}", join_err)),
    };

    let outcome = match preparation {
        Preparation::Rejected(outcome) => outcome,
        Preparation::Ready(prepared) => {
            let store = ctx.store.with_created_by(request.created_by_id);
            ctx.pipeline.write(prepared, &store, &progress, cancel).await
        }
    };
    info!(
        "Upload job {} finished: {}",
        job_id,
        if outcome.is_rejected() { "rejected" } else { "processed" }
    );
    JobStatus::Completed(outcome)
}
