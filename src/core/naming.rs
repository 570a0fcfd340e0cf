//! File naming rules shared by the gateway and the wizard.
//!
//! The client predicts enhanced file names without asking the server, so both
//! sides must use exactly this derivation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix inserted before the extension of an enhanced image.
pub const ENHANCED_SUFFIX: &str = "-ai";

/// Fallback stem when a client sends an empty or path-only file name.
const FALLBACK_NAME: &str = "image";

// ASCII word characters only, same as the upload naming rule the client mirrors.
static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.[0-9A-Za-z_]+)$").unwrap());

/// Derive the enhanced file name for a stored original.
///
/// `"1700-chair.png"` becomes `"1700-chair-ai.png"`. Names without an
/// extension are returned unchanged.
pub fn enhanced_name(original: &str) -> String {
    EXTENSION.replace(original, format!("{ENHANCED_SUFFIX}$1").as_str()).into_owned()
}

/// Build the stored name for an uploaded file: `{millis}-{basename}`.
pub fn original_name(timestamp_millis: i64, client_name: &str) -> String {
    format!("{}-{}", timestamp_millis, sanitize_client_name(client_name))
}

/// Strip any directory components a client may have sent.
pub fn sanitize_client_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    if base.is_empty() || base == "." || base == ".." {
        FALLBACK_NAME.to_string()
    } else {
        base.to_string()
    }
}

/// Guess the MIME type of an image from its file extension.
pub fn image_mime_type(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}
