//! Upload manifest and product detail types.
//!
//! These are the wire types of `POST /api/upload-images`. The gateway produces
//! them and the wizard stores them in its ProductInfo document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys the analyzer is asked to return.
pub const DETAIL_KEYS: [&str; 8] =
    ["title", "description", "color", "material", "dimension", "shape", "details", "recommendations"];

/// Ordered product attributes, as extracted and later edited by the seller.
pub type Details = IndexMap<String, DetailValue>;

/// A single product attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    /// Plain text value
    Text(String),
    /// List value (e.g. recommendations)
    List(Vec<String>),
}

impl DetailValue {
    /// Convert an arbitrary JSON value returned by a model.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(json_to_text).collect()),
            Value::Null => Self::Text("Unknown".to_string()),
            other => Self::Text(json_to_text(other)),
        }
    }

    /// Apply a user edit, keeping the value's shape.
    ///
    /// List values are edited as a comma separated line.
    pub fn edit(&self, input: &str) -> Self {
        match self {
            Self::Text(_) => Self::Text(input.to_string()),
            Self::List(_) => Self::List(input.split(',').map(|s| s.trim().to_string()).collect()),
        }
    }

    /// Render the value for display.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for DetailValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

fn json_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Result of the product analysis call.
///
/// Serialized untagged: either the detail object itself or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    /// The model could not describe the image
    Failed {
        /// Human-readable reason
        error: String,
    },
    /// Extracted attributes
    Details(Details),
}

impl AnalysisOutcome {
    /// Create a failed outcome.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { error: message.into() }
    }

    /// Build an outcome from a parsed model response.
    ///
    /// Objects carrying an `error` key are failures, other objects become
    /// details. Anything else is rejected.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        if let Some(error) = map.get("error") {
            return Some(Self::failed(json_to_text(error.clone())));
        }

        let details =
            map.into_iter().map(|(key, value)| (key, DetailValue::from_json(value))).collect();
        Some(Self::Details(details))
    }

    /// Whether this outcome is an error object.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The extracted details, if any.
    pub fn details(&self) -> Option<&Details> {
        match self {
            Self::Details(details) => Some(details),
            Self::Failed { .. } => None,
        }
    }

    /// Whether every documented key is present.
    pub fn has_documented_keys(&self) -> bool {
        self.details().is_some_and(|d| DETAIL_KEYS.iter().all(|key| d.contains_key(*key)))
    }

    /// Flatten into the detail map stored by the wizard.
    pub fn into_details(self) -> Details {
        match self {
            Self::Details(details) => details,
            Self::Failed { error } => {
                let mut details = Details::new();
                details.insert("error".to_string(), DetailValue::Text(error));
                details
            }
        }
    }
}

impl Default for AnalysisOutcome {
    fn default() -> Self {
        Self::Details(Details::new())
    }
}

/// Per-file enhancement result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Enhanced image was written
    #[default]
    Succeeded,
    /// The enhancement call failed, only the original exists
    Failed,
}

/// One uploaded file in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    /// Stored original file name
    pub original: String,

    /// Predicted enhanced file name
    pub enhanced: String,

    /// Enhancement result
    #[serde(default)]
    pub status: FileStatus,

    /// Failure reason when `status` is failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Category label sent with the upload
    #[serde(default)]
    pub category: String,

    /// Seconds spent in the enhancement call
    #[serde(default)]
    pub processing_time: f64,
}

impl ManifestFile {
    /// Create a successful entry for a stored original.
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let enhanced = super::naming::enhanced_name(&original);
        Self {
            original,
            enhanced,
            status: FileStatus::Succeeded,
            error: None,
            category: String::new(),
            processing_time: 0.0,
        }
    }

    /// Mark the entry as failed.
    pub fn with_failure(mut self, error: impl Into<String>) -> Self {
        self.status = FileStatus::Failed;
        self.error = Some(error.into());
        self
    }
}

/// Response payload of `POST /api/upload-images`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadManifest {
    /// Summary message
    pub message: String,

    /// Files in upload order
    pub files: Vec<ManifestFile>,

    /// Analysis of the first image
    #[serde(default)]
    pub details: AnalysisOutcome,
}

impl UploadManifest {
    /// Number of files whose enhancement failed.
    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Failed).count()
    }
}
