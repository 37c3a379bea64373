//! Error types for the volunteer backend.
//!
//! `UploadError` covers everything that makes an upload structurally
//! unusable before a single row is looked at. It never reaches the HTTP
//! layer as an error: the pipeline folds it into a rejected outcome.
//! `ApiError` is what request handlers return.

use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::model::outcome::RejectionKind;
use common::model::schema::FieldKey;
use serde_json::json;
use thiserror::Error;

/// Two header cells that resolve to the same canonical field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Columns '{first}' (column {first_position}) and '{second}' (column {second_position}) both map to '{key}'")]
pub struct HeaderConflict {
    pub key: FieldKey,
    pub first: String,
    pub first_position: usize,
    pub second: String,
    pub second_position: usize,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file '{0}'. Please upload an Excel (.xlsx, .xls) or CSV file")]
    UnsupportedFormat(String),

    #[error("Could not read the uploaded file: {0}")]
    Unreadable(String),

    #[error("No data found in the uploaded file")]
    EmptyFile,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("Ambiguous columns: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    AmbiguousHeaders(Vec<HeaderConflict>),
}

impl UploadError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            UploadError::UnsupportedFormat(_) => RejectionKind::UnsupportedFormat,
            UploadError::Unreadable(_) => RejectionKind::UnreadableFile,
            UploadError::EmptyFile => RejectionKind::EmptyFile,
            UploadError::MissingHeaders(_) => RejectionKind::MissingHeaders,
            UploadError::AmbiguousHeaders(_) => RejectionKind::AmbiguousHeaders,
        }
    }

    /// One human-readable line per problem.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            UploadError::MissingHeaders(labels) => labels
                .iter()
                .map(|label| format!("Missing required column '{}'", label))
                .collect(),
            UploadError::AmbiguousHeaders(conflicts) => {
                conflicts.iter().map(ToString::to_string).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

impl From<csv::Error> for UploadError {
    fn from(err: csv::Error) -> Self {
        UploadError::Unreadable(err.to_string())
    }
}

impl From<calamine::Error> for UploadError {
    fn from(err: calamine::Error) -> Self {
        UploadError::Unreadable(err.to_string())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("invalid json part: {}", err))
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Store(_) => "STORE_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_headers_yield_one_reason_per_label() {
        let err = UploadError::MissingHeaders(vec!["Full Name".into(), "SAI Connect ID".into()]);
        assert_eq!(err.kind(), RejectionKind::MissingHeaders);
        assert_eq!(
            err.reasons(),
            vec![
                "Missing required column 'Full Name'".to_string(),
                "Missing required column 'SAI Connect ID'".to_string(),
            ]
        );
    }

    #[test]
    fn conflict_message_names_both_columns() {
        let conflict = HeaderConflict {
            key: FieldKey::FullName,
            first: "Name".into(),
            first_position: 2,
            second: "पूरा नाम".into(),
            second_position: 5,
        };
        assert_eq!(
            conflict.to_string(),
            "Columns 'Name' (column 2) and 'पूरा नाम' (column 5) both map to 'full_name'"
        );
    }

    #[test]
    fn api_errors_map_to_status_codes() {
        assert_eq!(ApiError::NotFound("job".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::PayloadTooLarge(10).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ApiError::Store(StoreError::Backend("disk full".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
