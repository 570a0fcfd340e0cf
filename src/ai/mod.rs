//! AI integration module.
//!
//! Image enhancement and product analysis behind two small traits, so the
//! gateway can run against Gemini or a test double.
//!
//! ## Providers
//!
//! - `GeminiClient` - REST `generateContent` for both capabilities

mod gemini;
mod prompts;

pub use gemini::{parse_analysis, GeminiClient};
pub use prompts::{
    enhancement_prompt, strip_json_fences, ANALYSIS_INSTRUCTION, ANALYSIS_REQUEST, AUTO_DETECT,
    INVALID_JSON_MESSAGE, PROCESSING_FAILED_MESSAGE, RATE_LIMIT_MESSAGE,
};

use async_trait::async_trait;

use crate::core::AnalysisOutcome;

/// An image handed to a provider.
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    /// Raw file contents
    pub bytes: &'a [u8],
    /// MIME type sent upstream
    pub mime_type: &'a str,
    /// Stored file name, for logging
    pub file_name: &'a str,
}

impl<'a> ImageInput<'a> {
    /// Create a new image input.
    pub fn new(bytes: &'a [u8], mime_type: &'a str, file_name: &'a str) -> Self {
        Self { bytes, mime_type, file_name }
    }
}

/// Produces an enhanced version of a product photo.
#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    /// Return the bytes of the enhanced image.
    async fn enhance(&self, image: &ImageInput<'_>, prompt: &str) -> Result<Vec<u8>, AIError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Extracts structured product details from a photo.
#[async_trait]
pub trait ProductAnalyzer: Send + Sync {
    /// Analyze one image.
    ///
    /// Recoverable model failures come back as [`AnalysisOutcome::Failed`].
    /// An `Err` aborts the whole upload.
    async fn analyze(&self, image: &ImageInput<'_>) -> Result<AnalysisOutcome, AIError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// AI error types.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("GEMINI_API not set")]
    MissingApiKey,

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("No image in model response")]
    NoImage,

    #[error("No response from AI")]
    NoResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid image data: {0}")]
    Decode(#[from] base64::DecodeError),
}
