//! Upload processing.
//!
//! Stores the originals, enhances them concurrently, analyzes the first one
//! and assembles the manifest.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use super::details_log::DetailsLog;
use super::error::{GatewayError, GatewayResult};
use super::storage::UploadStorage;
use crate::ai::{enhancement_prompt, ImageEnhancer, ImageInput, ProductAnalyzer};
use crate::core::{image_mime_type, Config, ManifestFile, UploadManifest, DEFAULT_ENHANCE_PROMPT};

/// Message of a fully successful upload.
pub const SUCCESS_MESSAGE: &str = "Images uploaded and processed successfully";

/// MIME type used when the extension is unknown.
const FALLBACK_MIME: &str = "image/png";

/// One file received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// File name sent by the client
    pub client_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Create a new uploaded image.
    pub fn new(client_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { client_name: client_name.into(), bytes }
    }
}

/// A parsed upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    /// Images in upload order
    pub images: Vec<UploadedImage>,
    /// Category label (free text)
    pub category: String,
}

/// The upload pipeline.
#[derive(Clone)]
pub struct EnhancementPipeline {
    enhancer: Arc<dyn ImageEnhancer>,
    analyzer: Arc<dyn ProductAnalyzer>,
    storage: UploadStorage,
    details_log: DetailsLog,
    prompt: String,
    partial_results: bool,
    thread_category: bool,
    max_files: usize,
}

impl EnhancementPipeline {
    /// Create a pipeline with default settings.
    pub fn new(
        enhancer: Arc<dyn ImageEnhancer>,
        analyzer: Arc<dyn ProductAnalyzer>,
        storage: UploadStorage,
        details_log: DetailsLog,
    ) -> Self {
        Self {
            enhancer,
            analyzer,
            storage,
            details_log,
            prompt: DEFAULT_ENHANCE_PROMPT.to_string(),
            partial_results: true,
            thread_category: true,
            max_files: 4,
        }
    }

    /// Create a pipeline from the loaded configuration.
    pub fn from_config(
        config: &Config,
        enhancer: Arc<dyn ImageEnhancer>,
        analyzer: Arc<dyn ProductAnalyzer>,
    ) -> Self {
        Self::new(
            enhancer,
            analyzer,
            UploadStorage::from_config(&config.storage),
            DetailsLog::new(&config.storage.data_dir()),
        )
        .with_prompt(config.gemini.enhance_prompt.clone())
        .with_partial_results(config.gateway.partial_results)
        .with_thread_category(config.gateway.thread_category)
        .with_max_files(config.server.max_files)
    }

    /// Use a custom enhancement prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Report per-file failures (`true`) or fail the request (`false`).
    pub fn with_partial_results(mut self, enabled: bool) -> Self {
        self.partial_results = enabled;
        self
    }

    /// Append the category to the enhancement prompt.
    pub fn with_thread_category(mut self, enabled: bool) -> Self {
        self.thread_category = enabled;
        self
    }

    /// Maximum number of images per request.
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Maximum number of images per request.
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Upload storage.
    pub fn storage(&self) -> &UploadStorage {
        &self.storage
    }

    /// Details log.
    pub fn details_log(&self) -> &DetailsLog {
        &self.details_log
    }

    /// Process one upload request.
    pub async fn process(&self, request: UploadRequest) -> GatewayResult<UploadManifest> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "upload",
            %request_id,
            files = request.images.len(),
            category = %request.category
        );

        self.process_inner(request).instrument(span).await
    }

    async fn process_inner(&self, request: UploadRequest) -> GatewayResult<UploadManifest> {
        if request.images.is_empty() {
            return Err(GatewayError::NoFiles);
        }
        if request.images.len() > self.max_files {
            return Err(GatewayError::TooManyFiles { limit: self.max_files });
        }

        self.storage.ensure_dirs().await?;

        let mut stored = Vec::with_capacity(request.images.len());
        for image in request.images {
            let name = self.storage.store_original(&image.client_name, &image.bytes).await?;
            stored.push((name, image.bytes));
        }

        let prompt = enhancement_prompt(&self.prompt, &request.category, self.thread_category);
        let files = join_all(
            stored.iter().map(|(name, bytes)| self.enhance_one(name, bytes, &prompt, &request.category)),
        )
        .await;

        let failed = files.iter().filter(|f| f.error.is_some()).count();
        if failed > 0 && !self.partial_results {
            tracing::warn!(failed, "Enhancement failed, rejecting upload");
            return Err(GatewayError::EnhancementFailed { failed });
        }

        let (first_name, first_bytes) = &stored[0];
        let input = ImageInput::new(first_bytes, mime_for(first_name), first_name);
        let details = self.analyzer.analyze(&input).await.map_err(GatewayError::AnalysisFailed)?;

        if let Some(extracted) = details.details() {
            let log = self.details_log.clone();
            let image = first_name.clone();
            let extracted = extracted.clone();
            tokio::spawn(async move {
                if let Err(e) = log.append(&image, &extracted).await {
                    tracing::warn!(error = %e, "Failed to append product details");
                }
            });
        } else {
            tracing::info!(image = %first_name, "Analysis returned an error object");
        }

        let message = summary_message(files.len(), failed);
        tracing::info!(files = files.len(), failed, "Upload processed");

        Ok(UploadManifest { message, files, details })
    }

    async fn enhance_one(
        &self,
        original: &str,
        bytes: &[u8],
        prompt: &str,
        category: &str,
    ) -> ManifestFile {
        let started = Instant::now();
        let input = ImageInput::new(bytes, mime_for(original), original);

        let result = match self.enhancer.enhance(&input, prompt).await {
            Ok(data) => self.storage.write_enhanced(original, &data).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let mut file = ManifestFile::new(original);
        file.category = category.to_string();
        file.processing_time = started.elapsed().as_secs_f64();

        match result {
            Ok(enhanced) => {
                tracing::debug!(image = original, enhanced = %enhanced, "Saved enhanced image");
                file
            }
            Err(e) => {
                tracing::warn!(image = original, provider = self.enhancer.name(), error = %e, "Enhancement failed");
                file.with_failure(e)
            }
        }
    }
}

fn mime_for(name: &str) -> &'static str {
    image_mime_type(name).unwrap_or(FALLBACK_MIME)
}

fn summary_message(total: usize, failed: usize) -> String {
    if failed == 0 {
        SUCCESS_MESSAGE.to_string()
    } else {
        format!("Images uploaded; {failed} of {total} enhancements failed")
    }
}
