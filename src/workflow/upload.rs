//! Client-side upload selection.
//!
//! Validates the chosen files before anything is sent to the gateway.

use std::path::{Path, PathBuf};

use super::documents::EXPECTED_IMAGE_COUNT;
use super::error::UploadError;
use crate::core::image_mime_type;

/// Category used when the seller does not pick one.
pub const DEFAULT_CATEGORY: &str = "auto-detect";

/// Categories offered by the wizard as `(value, label)`.
///
/// The gateway accepts any string.
pub const KNOWN_CATEGORIES: [(&str, &str); 4] = [
    ("auto-detect", "Auto Detect"),
    ("furniture", "Furniture"),
    ("home_decor", "Home Decor"),
    ("grocery", "Grocery"),
];

/// A validated image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    /// Path on disk
    pub path: PathBuf,
    /// File name sent to the gateway
    pub file_name: String,
    /// MIME type from the extension
    pub mime_type: &'static str,
}

impl SelectedImage {
    fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::UnsupportedType(path.to_path_buf()))?;
        let mime_type =
            image_mime_type(&file_name).ok_or_else(|| UploadError::UnsupportedType(path.to_path_buf()))?;

        std::fs::metadata(path)
            .map_err(|source| UploadError::Unreadable { path: path.to_path_buf(), source })?;

        Ok(Self { path: path.to_path_buf(), file_name, mime_type })
    }

    /// Read the file contents.
    pub fn read(&self) -> Result<Vec<u8>, UploadError> {
        std::fs::read(&self.path)
            .map_err(|source| UploadError::Unreadable { path: self.path.clone(), source })
    }
}

/// Exactly four validated images plus a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSelection {
    images: Vec<SelectedImage>,
    category: String,
}

impl UploadSelection {
    /// Validate a selection.
    pub fn new(paths: &[PathBuf], category: impl Into<String>) -> Result<Self, UploadError> {
        if paths.len() != EXPECTED_IMAGE_COUNT {
            return Err(UploadError::WrongCount {
                expected: EXPECTED_IMAGE_COUNT,
                found: paths.len(),
            });
        }

        let images =
            paths.iter().map(|p| SelectedImage::from_path(p)).collect::<Result<Vec<_>, _>>()?;

        let category = category.into();
        let category = if category.trim().is_empty() { DEFAULT_CATEGORY.to_string() } else { category };

        Ok(Self { images, category })
    }

    /// Validated images in selection order.
    pub fn images(&self) -> &[SelectedImage] {
        &self.images
    }

    /// Category label.
    pub fn category(&self) -> &str {
        &self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|n| {
                let p = dir.path().join(n);
                std::fs::write(&p, b"img").unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn test_valid_selection() {
        let dir = TempDir::new().unwrap();
        let paths = touch(&dir, &["a.png", "b.jpg", "c.webp", "d.tiff"]);

        let selection = UploadSelection::new(&paths, "furniture").unwrap();
        assert_eq!(selection.images().len(), 4);
        assert_eq!(selection.images()[1].mime_type, "image/jpeg");
        assert_eq!(selection.category(), "furniture");
    }

    #[test]
    fn test_wrong_count() {
        let dir = TempDir::new().unwrap();
        let paths = touch(&dir, &["a.png", "b.png", "c.png"]);
        assert!(matches!(
            UploadSelection::new(&paths, ""),
            Err(UploadError::WrongCount { expected: 4, found: 3 })
        ));

        let paths = touch(&dir, &["a.png", "b.png", "c.png", "d.png", "e.png"]);
        assert!(matches!(
            UploadSelection::new(&paths, ""),
            Err(UploadError::WrongCount { found: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let dir = TempDir::new().unwrap();
        let paths = touch(&dir, &["a.png", "b.png", "c.png", "d.gif"]);
        assert!(matches!(UploadSelection::new(&paths, ""), Err(UploadError::UnsupportedType(_))));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let mut paths = touch(&dir, &["a.png", "b.png", "c.png"]);
        paths.push(dir.path().join("missing.png"));
        assert!(matches!(UploadSelection::new(&paths, ""), Err(UploadError::Unreadable { .. })));
    }

    #[test]
    fn test_blank_category_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = touch(&dir, &["a.png", "b.png", "c.png", "d.png"]);
        assert_eq!(UploadSelection::new(&paths, "  ").unwrap().category(), DEFAULT_CATEGORY);
    }
}
