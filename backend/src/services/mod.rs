//! HTTP services exposed by the backend.

use crate::pipeline::UploadPipeline;
use crate::store::SqliteRecordStore;
use std::sync::Arc;

pub mod volunteers;

/// Shared handles every volunteer route needs, injected as `web::Data`.
#[derive(Clone)]
pub struct AppContext {
    pub store: SqliteRecordStore,
    pub pipeline: Arc<UploadPipeline>,
    pub max_upload_bytes: usize,
}
