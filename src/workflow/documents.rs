//! Persisted wizard documents.
//!
//! Two documents make up the whole wizard state: `ProductInfo` (uploaded
//! images, extracted details, the approved list) and `ApprovalMap`
//! (per-image decisions). Field names follow the stored JSON layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Details, FileStatus, ManifestFile, UploadManifest};

/// Number of images an upload must carry.
pub const EXPECTED_IMAGE_COUNT: usize = 4;

/// An uploaded image and its enhanced counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Stored original file name, also the image id
    pub original: String,

    /// Enhanced file name
    pub enhanced: String,

    /// Category label chosen at upload
    #[serde(default)]
    pub category: String,

    /// Seconds the enhancement took
    #[serde(default)]
    pub processing_time: f64,

    /// Whether the enhanced file exists
    #[serde(default)]
    pub enhancement_status: FileStatus,
}

impl ImageRecord {
    /// Whether the enhanced version can be chosen.
    pub fn has_enhanced(&self) -> bool {
        self.enhancement_status == FileStatus::Succeeded
    }
}

impl From<ManifestFile> for ImageRecord {
    fn from(file: ManifestFile) -> Self {
        Self {
            original: file.original,
            enhanced: file.enhanced,
            category: file.category,
            processing_time: file.processing_time,
            enhancement_status: file.status,
        }
    }
}

/// Final choice for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedImage {
    /// Original file name
    pub original: String,

    /// Chosen file name: the enhanced one when approved, else the original
    pub approved: String,
}

impl ApprovedImage {
    /// Whether the enhanced file was chosen.
    pub fn uses_enhanced(&self) -> bool {
        self.approved != self.original
    }
}

/// The `productInfo` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    /// Uploaded images in upload order
    #[serde(default)]
    pub images: Vec<ImageRecord>,

    /// Extracted (and possibly edited) attributes
    #[serde(default)]
    pub details: Details,

    /// Derived list of chosen images
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approved_images: Vec<ApprovedImage>,
}

impl ProductInfo {
    /// Build the document from an upload manifest.
    pub fn from_manifest(manifest: UploadManifest) -> Self {
        Self {
            images: manifest.files.into_iter().map(ImageRecord::from).collect(),
            details: manifest.details.into_details(),
            approved_images: Vec::new(),
        }
    }

    /// Whether any image has been uploaded.
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    /// Find an image by id.
    pub fn image(&self, id: &str) -> Option<&ImageRecord> {
        self.images.iter().find(|img| img.original == id)
    }
}

/// The `imageApprovals` document.
///
/// `true` means use the enhanced image, `false` keeps the original and a
/// missing key means the seller has not decided yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalMap(BTreeMap<String, bool>);

impl ApprovalMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decision for an image, `None` when undecided.
    pub fn decision(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    /// Whether the image is explicitly approved.
    pub fn is_approved(&self, id: &str) -> bool {
        self.decision(id) == Some(true)
    }

    /// Upsert a decision.
    pub fn set(&mut self, id: impl Into<String>, decision: bool) {
        self.0.insert(id.into(), decision);
    }

    /// Whether any decision was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded decisions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether at least one image is approved.
    pub fn any_approved(&self) -> bool {
        self.0.values().any(|approved| *approved)
    }

    /// Iterate over recorded decisions.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, approved)| (id.as_str(), *approved))
    }
}

impl FromIterator<(String, bool)> for ApprovalMap {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
