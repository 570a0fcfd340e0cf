//! Final curated listing.

use serde::Serialize;

use super::documents::ProductInfo;

/// Folder an image is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFolder {
    /// `/uploads/original`
    Original,
    /// `/uploads/ai`
    Ai,
}

impl ImageFolder {
    /// URL path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Ai => "ai",
        }
    }
}

/// Build the public URL of a stored image.
pub fn image_url(base_url: &str, folder: ImageFolder, file_name: &str) -> String {
    format!(
        "{}/uploads/{}/{}",
        base_url.trim_end_matches('/'),
        folder.as_str(),
        urlencoding::encode(file_name)
    )
}

/// What the preview step shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PreviewView {
    /// `approvedImages` is empty, the seller has to start over
    NoApprovedImages,
    /// The curated listing
    Listing(Listing),
}

/// Curated product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// Chosen images in upload order
    pub images: Vec<ListingImage>,
    /// URL of the main image (the first chosen one)
    pub main_image: String,
    /// Details as display pairs
    pub details: Vec<(String, String)>,
}

/// One chosen image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingImage {
    /// Original file name
    pub original: String,
    /// Chosen file name
    pub approved: String,
    /// Folder the chosen file lives in
    pub folder: ImageFolder,
    /// Public URL
    pub url: String,
}

impl PreviewView {
    /// Build the preview from the ProductInfo document.
    pub fn from_product(product: &ProductInfo, base_url: &str) -> Self {
        let images: Vec<ListingImage> = product
            .approved_images
            .iter()
            .map(|img| {
                let folder =
                    if img.uses_enhanced() { ImageFolder::Ai } else { ImageFolder::Original };
                ListingImage {
                    original: img.original.clone(),
                    approved: img.approved.clone(),
                    folder,
                    url: image_url(base_url, folder, &img.approved),
                }
            })
            .collect();

        let Some(first) = images.first() else {
            return Self::NoApprovedImages;
        };
        let main_image = first.url.clone();

        let details =
            product.details.iter().map(|(key, value)| (key.clone(), value.display())).collect();

        Self::Listing(Listing { images, main_image, details })
    }
}
