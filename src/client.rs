//! Gateway client used by the wizard's upload step.

use std::time::Duration;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::core::UploadManifest;
use crate::workflow::UploadSelection;

/// Upload endpoint path.
pub const UPLOAD_PATH: &str = "/api/upload-images";

/// Error body returned by the gateway.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the enhancement gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into() }
    }

    /// Use an overall request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> anyhow::Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full upload URL.
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), UPLOAD_PATH)
    }

    /// Send a validated selection and return the manifest.
    pub async fn upload(&self, selection: &UploadSelection) -> anyhow::Result<UploadManifest> {
        let mut form = Form::new();
        for image in selection.images() {
            let part = Part::bytes(image.read()?)
                .file_name(image.file_name.clone())
                .mime_str(image.mime_type)?;
            form = form.part("images", part);
        }
        form = form.text("category", selection.category().to_string());

        tracing::info!(url = %self.upload_url(), files = selection.images().len(), "Uploading images");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Could not reach gateway at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body).map(|e| e.message).unwrap_or(body);
            anyhow::bail!("Upload failed ({}): {}", status, message);
        }

        let manifest: UploadManifest = response.json().await.context("Invalid upload response")?;
        Ok(manifest)
    }
}
