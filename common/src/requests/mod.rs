use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Default, Debug, Clone)]
/// Optional metadata sent as the `json` part of an upload request.
/// `created_by_id` is stamped on every inserted volunteer row.
pub struct UploadRequest {
    #[serde(default)]
    pub created_by_id: Option<String>,
}

/// Response body returned when an upload job has been scheduled.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StartUploadResponse {
    pub job_id: String,
}
