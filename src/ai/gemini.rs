//! Gemini API integration.
//!
//! Implements [`ImageEnhancer`] and [`ProductAnalyzer`] over the REST
//! `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::prompts::{
    strip_json_fences, ANALYSIS_INSTRUCTION, ANALYSIS_REQUEST, INVALID_JSON_MESSAGE,
    PROCESSING_FAILED_MESSAGE, RATE_LIMIT_MESSAGE,
};
use super::{AIError, ImageEnhancer, ImageInput, ProductAnalyzer};
use crate::core::{AnalysisOutcome, GeminiConfig};

/// Gemini API provider.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    /// Create a client with default models and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = GeminiConfig::default();
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: defaults.base_url,
            image_model: defaults.image_model,
            text_model: defaults.text_model,
        }
    }

    /// Create a client from the `[gemini]` config section.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, AIError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AIError::MissingApiKey)?;

        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs.max(1))).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        })
    }

    /// Create with a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Use a specific image generation model.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Use a specific analysis model.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url.trim_end_matches('/'), model)
    }

    /// Make a request to the Gemini API.
    async fn request(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, AIError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AIError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AIError::ApiError { status: status.as_u16(), body });
        }

        Ok(response.json().await?)
    }

    async fn request_analysis(&self, image: &ImageInput<'_>) -> Result<String, AIError> {
        let request = GenerateRequest {
            contents: vec![Content::user(vec![Part::text(ANALYSIS_REQUEST), Part::image(image)])],
            system_instruction: Some(Content::system(ANALYSIS_INSTRUCTION)),
            generation_config: None,
        };

        let response = self.request(&self.text_model, &request).await?;
        response.text().ok_or(AIError::NoResponse)
    }
}

#[async_trait]
impl ImageEnhancer for GeminiClient {
    async fn enhance(&self, image: &ImageInput<'_>, prompt: &str) -> Result<Vec<u8>, AIError> {
        let request = GenerateRequest {
            contents: vec![Content::user(vec![Part::text(prompt), Part::image(image)])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        };

        let response = self.request(&self.image_model, &request).await?;
        let data = response.first_image().ok_or(AIError::NoImage)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(&data.data)?;

        tracing::debug!(image = image.file_name, bytes = bytes.len(), "Received enhanced image");
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl ProductAnalyzer for GeminiClient {
    async fn analyze(&self, image: &ImageInput<'_>) -> Result<AnalysisOutcome, AIError> {
        match self.request_analysis(image).await {
            Ok(text) => Ok(parse_analysis(&text)),
            Err(AIError::RateLimited) => {
                tracing::warn!(image = image.file_name, "Analysis rate limited");
                Ok(AnalysisOutcome::failed(RATE_LIMIT_MESSAGE))
            }
            Err(e) => {
                tracing::warn!(image = image.file_name, error = %e, "Analysis failed");
                Ok(AnalysisOutcome::failed(PROCESSING_FAILED_MESSAGE))
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Parse the text answer of an analysis call.
///
/// Fences are stripped first. Anything that is not a JSON object becomes the
/// invalid-JSON failure.
pub fn parse_analysis(text: &str) -> AnalysisOutcome {
    let cleaned = strip_json_fences(text);
    let parsed = serde_json::from_str(&cleaned).ok().and_then(AnalysisOutcome::from_json);

    parsed.unwrap_or_else(|| {
        tracing::warn!(raw = %cleaned, "Analysis answer is not a JSON object");
        AnalysisOutcome::failed(INVALID_JSON_MESSAGE)
    })
}

/// Gemini `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Generation settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

/// A turn made of parts.
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self { role: Some("user".to_string()), parts }
    }

    fn system(text: &str) -> Self {
        Self { role: None, parts: vec![Part::text(text)] }
    }
}

/// Text or inline binary data.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), ..Self::default() }
    }

    fn image(image: &ImageInput<'_>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: image.mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(image.bytes),
            }),
            ..Self::default()
        }
    }
}

/// Base64 payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Gemini `generateContent` response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates.first().and_then(|c| c.content.as_ref()).into_iter().flat_map(|c| c.parts.iter())
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First inline image of the first candidate.
    fn first_image(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}
