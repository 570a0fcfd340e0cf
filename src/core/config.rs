//! Configuration management for Product Studio.
//!
//! Handles loading configuration from TOML files and environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gemini calls chained by one upload request.
const UPLOAD_GEMINI_CALLS: u64 = 2;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default studio prompt sent with every enhancement call.
pub const DEFAULT_ENHANCE_PROMPT: &str = "You are a professional product photographer. \
Take the provided product image and place it in a realistic and contextually appropriate \
environment that suits the product's purpose. Do not alter the product's shape, color, size, \
material, or any visual details. Only enhance the lighting, shadows, and contrast subtly to \
blend the product naturally into the new background.

For example:

A kitchen utensil should be placed in a modern kitchen counter or dining table scene.

A cosmetic product should be set on a bathroom shelf, makeup desk, or styled vanity setup.

A tech gadget should appear on a desk setup, office space, or living room environment.

The final output should look like a high-quality, real-life photoshoot where the product is \
naturally integrated into its environment, keeping all visual integrity of the original \
product image intact.";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// On-disk storage settings
    pub storage: StorageConfig,

    /// Gemini API settings
    pub gemini: GeminiConfig,

    /// Upload pipeline behavior
    pub gateway: GatewayConfig,

    /// Wizard (client) settings
    pub flow: FlowConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Maximum number of files per upload
    pub max_files: usize,

    /// Maximum multipart body size in megabytes
    pub body_limit_mb: u64,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

/// On-disk storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory holding `original/` and `ai/`
    pub upload_dir: PathBuf,

    /// Directory for the details log
    pub data_dir: PathBuf,
}

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (usually provided through `GEMINI_API`), never written out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// REST base URL
    pub base_url: String,

    /// Model used for image enhancement
    pub image_model: String,

    /// Model used for product analysis
    pub text_model: String,

    /// Prompt sent with each enhancement call
    pub enhance_prompt: String,

    /// Overall timeout for one API call, in seconds
    pub timeout_secs: u64,
}

/// Upload pipeline behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Report per-file failures instead of failing the whole request
    pub partial_results: bool,

    /// Append the upload category to the enhancement prompt
    pub thread_category: bool,
}

/// Wizard settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Path of the wizard state file (defaults to the data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Gateway URL used by `upload`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_files: 4,
            body_limit_mb: 50,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { upload_dir: PathBuf::from("uploads"), data_dir: PathBuf::from("data") }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            enhance_prompt: DEFAULT_ENHANCE_PROMPT.to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { partial_results: true, thread_category: true }
    }
}

impl ServerConfig {
    /// Get the socket address.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Body limit in bytes.
    pub fn body_limit_bytes(&self) -> u64 {
        self.body_limit_mb * 1024 * 1024
    }

    /// Base URL a local client would use to reach this server.
    pub fn local_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    /// Directory holding uploaded originals.
    pub fn original_dir(&self) -> PathBuf {
        expand_path(&self.upload_dir).join("original")
    }

    /// Directory holding enhanced images.
    pub fn ai_dir(&self) -> PathBuf {
        expand_path(&self.upload_dir).join("ai")
    }

    /// Directory for append-only logs.
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.product-studio.toml` in current directory
    /// 2. `~/.config/product-studio/config.toml`
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied last.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_file_or_default()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file_or_default() -> anyhow::Result<Self> {
        // Try local config first
        let local_config = PathBuf::from(".product-studio.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        // Try global config
        if let Some(global_config) = Self::global_config_path() {
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(key) = lookup("GEMINI_API").filter(|k| !k.trim().is_empty()) {
            self.gemini.api_key = Some(key.trim().to_string());
        }
        if let Some(origins) = lookup("DEV_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(dir) = lookup("UPLOAD_DIR").filter(|d| !d.trim().is_empty()) {
            self.storage.upload_dir = PathBuf::from(dir);
        }
    }

    /// Path of the global config file.
    pub fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("product-studio"))
    }

    /// Get the data directory path (for wizard state).
    pub fn app_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("product-studio"))
    }

    /// Resolve the wizard state file.
    pub fn state_file(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.flow.state_file {
            return Ok(expand_path(path));
        }

        Self::app_data_dir()
            .map(|d| d.join("flow.json"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    /// Resolve the gateway URL used by the wizard.
    pub fn server_url(&self) -> String {
        self.flow.server_url.clone().unwrap_or_else(|| self.server.local_url())
    }

    /// How long the wizard waits for one upload.
    ///
    /// The gateway chains the enhancement calls and the analysis call, each
    /// bounded by the Gemini timeout.
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.timeout_secs.max(1).saturating_mul(UPLOAD_GEMINI_CALLS))
    }
}

/// Expand `~` and environment variables in a configured path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
