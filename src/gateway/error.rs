//! Gateway error types.

use std::path::PathBuf;

use serde::Serialize;
use warp::http::StatusCode;

use crate::ai::AIError;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by the upload endpoint.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request carried no image.
    #[error("No files uploaded")]
    NoFiles,

    /// More images than the configured limit.
    #[error("Too many files")]
    TooManyFiles { limit: usize },

    /// The body exceeds the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// The multipart body could not be read.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Strict mode: at least one enhancement failed.
    #[error("Gemini processing failed")]
    EnhancementFailed { failed: usize },

    /// The analyzer returned an error instead of an outcome.
    #[error("Gemini processing failed")]
    AnalysisFailed(#[source] AIError),

    /// Writing an uploaded file failed.
    #[error("Failed to store {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoFiles
            | Self::TooManyFiles { .. }
            | Self::PayloadTooLarge
            | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::EnhancementFailed { .. } | Self::AnalysisFailed(_) | Self::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to clients.
    ///
    /// Storage errors stay generic so server paths do not leak.
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage { .. } => "Server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Build the JSON error response.
    pub fn into_response(self) -> warp::reply::Response {
        error_response(self.status_code(), self.public_message())
    }
}

/// `{"message": ...}` error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Build a JSON `{message}` response with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> warp::reply::Response {
    use warp::Reply;

    warp::reply::with_status(warp::reply::json(&ErrorBody { message: message.into() }), status)
        .into_response()
}
