//! Workflow error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for workflow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors raised by workflow transitions.
#[derive(Debug, Error)]
pub enum FlowError {
    /// `proceed` was called without any approved image.
    #[error("Please approve at least one image to proceed.")]
    NoImageApproved,

    /// The upload did not carry the expected number of images.
    #[error("Expected exactly {expected} images, got {found}")]
    ImageCount { expected: usize, found: usize },

    /// The image id is not part of the current upload.
    #[error("Unknown image: {0}")]
    UnknownImage(String),

    /// The image has no enhanced version to approve.
    #[error("Enhancement failed for '{0}', only the original can be used")]
    EnhancementUnavailable(String),

    /// Persisting or loading the documents failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FlowError {
    /// Whether this error ends the session with a full reset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoImageApproved)
    }
}

/// Errors from the keyed document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Client-side upload validation errors.
///
/// Raised before any network call, without touching the workflow state.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Too many or too few files.
    #[error("Please select exactly {expected} images (got {found})")]
    WrongCount { expected: usize, found: usize },

    /// A file is not one of the accepted image formats.
    #[error("Only JPEG, PNG, WebP, BMP, and TIFF files are allowed: {0}")]
    UnsupportedType(PathBuf),

    /// A selected file could not be read.
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_image_approved_message() {
        assert_eq!(
            FlowError::NoImageApproved.to_string(),
            "Please approve at least one image to proceed."
        );
    }

    #[test]
    fn test_only_no_approval_is_fatal() {
        assert!(FlowError::NoImageApproved.is_fatal());
        assert!(!FlowError::UnknownImage("a".into()).is_fatal());
        assert!(!FlowError::ImageCount { expected: 4, found: 3 }.is_fatal());
    }
}
