//! Prompts and canned messages for the Gemini calls.

use once_cell::sync::Lazy;
use regex::Regex;

/// System instruction for product analysis.
pub const ANALYSIS_INSTRUCTION: &str = r#"
You are a professional product analysis AI.
You must return only JSON with the following structure:

{
  "title": "...",
  "description": "...",
  "color": "...",
  "material": "...",
  "dimension": "...",
  "shape": "...",
  "details": "...",
  "recommendations": ["...", "..."]
}

Guidelines:
- Strictly analyze the given product image.
- Avoid hallucinating unknown properties.
- If a detail is not visually identifiable, return "Unknown".
- Only return the JSON. No extra explanation or markdown.
- Be consistent with key names and format.
- If image is invalid or not a product, return:
{ "error": "Invalid input. Please provide a valid product image." }
"#;

/// User message sent with the image to analyze.
pub const ANALYSIS_REQUEST: &str =
    "Analyze this product image and extract structured product info in JSON.";

/// Analysis error when the model answer is not JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format received from Gemini API.";

/// Analysis error on HTTP 429.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Try again later.";

/// Analysis error for every other failure.
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image. Please try again.";

/// Category value meaning "let the model figure it out".
pub const AUTO_DETECT: &str = "auto-detect";

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json|```").unwrap());

/// Remove markdown code fences around a JSON answer.
pub fn strip_json_fences(text: &str) -> String {
    JSON_FENCE.replace_all(text, "").trim().to_string()
}

/// Build the enhancement prompt for an upload.
///
/// With `thread_category` set, a concrete category is appended so the model
/// can pick a matching scene.
pub fn enhancement_prompt(base: &str, category: &str, thread_category: bool) -> String {
    let category = category.trim();
    if !thread_category || category.is_empty() || category.eq_ignore_ascii_case(AUTO_DETECT) {
        return base.to_string();
    }

    format!("{}\n\nPRODUCT CATEGORY: {}", base.trim_end(), category)
}
