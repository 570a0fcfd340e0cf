//! Core types shared by the gateway and the wizard.
//!
//! This module contains configuration, the upload manifest wire types,
//! and the file naming rules both sides must agree on.

mod config;
mod manifest;
pub mod naming;

pub use config::{
    Config, FlowConfig, GatewayConfig, GeminiConfig, ServerConfig, StorageConfig,
    DEFAULT_ENHANCE_PROMPT, DEFAULT_GEMINI_BASE_URL,
};
pub use manifest::{
    AnalysisOutcome, DetailValue, Details, FileStatus, ManifestFile, UploadManifest, DETAIL_KEYS,
};
pub use naming::{enhanced_name, image_mime_type};
