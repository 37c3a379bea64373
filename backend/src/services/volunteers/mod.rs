//! Volunteer register endpoints.
//!
//! - `POST /api/volunteers/upload`: multipart upload with an optional `json`
//!   part (`UploadRequest`) and a required `file` part holding the
//!   spreadsheet. Schedules a background job and returns its `job_id`.
//! - `GET /api/volunteers/upload/status/{job_id}`: the job's `JobStatus`.
//! - `POST /api/volunteers/upload/cancel/{job_id}`: stops a running job
//!   before its next batch.
//! - `GET /api/volunteers/stats`: register totals.
//! - `GET /api/volunteers/{sai_connect_id}`: one stored volunteer.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod cancel;
mod get;
mod get_status;
mod stats;
mod upload;

const API_PATH: &str = "/api/volunteers";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/upload/status/{job_id}", get().to(get_status::process))
        .route("/upload/cancel/{job_id}", post().to(cancel::process))
        // must stay ahead of the catch-all ID route
        .route("/stats", get().to(stats::process))
        .route("/{sai_connect_id}", get().to(get::process))
}
