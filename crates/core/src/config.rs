use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CREATIVE_AUTOMATION__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub creative: CreativeConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Parameters of the image-generation call. Fixed for the lifetime of one
/// generation client.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Edge length of the square image requested from the provider.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    /// Pause after every successful call; ~5 images/min by default.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Upper bound on time spent waiting out rate limits for one product.
    /// `None` retries until the provider accepts the request.
    #[serde(default)]
    pub retry_budget_secs: Option<u64>,
    #[serde(default = "default_placeholder_reason_limit")]
    pub placeholder_reason_limit: usize,
}

/// Provider endpoint and credentials. Credentials never come from ambient
/// process state inside the libraries; the binary fills them in.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Caption styling for renditions.
#[derive(Debug, Clone, Deserialize)]
pub struct CreativeConfig {
    /// Preferred TrueType face. System bold sans faces are tried next.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default = "default_padding_scale")]
    pub padding_scale: f32,
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Prometheus exporter, started by the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}
fn default_model() -> String {
    "gpt-image-1".to_string()
}
fn default_image_size() -> u32 {
    1024
}
fn default_throttle_ms() -> u64 {
    13_000
}
fn default_initial_backoff_ms() -> u64 {
    2_000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_placeholder_reason_limit() -> usize {
    280
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_font_scale() -> f32 {
    0.05
}
fn default_padding_scale() -> f32 {
    0.05
}
fn default_overlay_alpha() -> u8 {
    180
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            image_size: default_image_size(),
            throttle_ms: default_throttle_ms(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            retry_budget_secs: None,
            placeholder_reason_limit: default_placeholder_reason_limit(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            project_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_scale: default_font_scale(),
            padding_scale: default_padding_scale(),
            overlay_alpha: default_overlay_alpha(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            generation: GenerationConfig::default(),
            provider: ProviderConfig::default(),
            creative: CreativeConfig::default(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl GenerationConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn retry_budget(&self) -> Option<Duration> {
        self.retry_budget_secs.map(Duration::from_secs)
    }

    /// Provider size string, e.g. `1024x1024`.
    pub fn size_param(&self) -> String {
        format!("{0}x{0}", self.image_size)
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file and environment variables.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("CREATIVE_AUTOMATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
