pub mod validation;

use serde::{Deserialize, Serialize};

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Listener and outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Upstream request timeout in seconds, covering the whole exchange.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub base_path: String,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    pub http_pool_max_idle_per_host: usize,
    #[serde(default = "default_http_pool_idle_timeout_secs")]
    pub http_pool_idle_timeout_secs: u64,
    #[serde(default)]
    pub http_use_env_proxy: bool,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_timeout() -> u64 {
    600
}
fn default_http_pool_max_idle_per_host() -> usize {
    16
}
fn default_http_pool_idle_timeout_secs() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            timeout: default_timeout(),
            base_path: String::new(),
            http_pool_max_idle_per_host: default_http_pool_max_idle_per_host(),
            http_pool_idle_timeout_secs: default_http_pool_idle_timeout_secs(),
            http_use_env_proxy: false,
        }
    }
}

/// Upstream DashScope endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashScopeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Credential used when a request carries no `Authorization` header.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_reasoning_delta_max")]
    pub reasoning_delta_max: usize,
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_base_url() -> String {
    "https://dashscope.aliyuncs.com/api/v1".to_string()
}
fn default_reasoning_delta_max() -> usize {
    180
}

impl Default for DashScopeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            reasoning_delta_max: default_reasoning_delta_max(),
            proxy: None,
        }
    }
}

/// One published model backed by a Bailian application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: String,
    pub app_id: String,
    #[serde(default)]
    pub enable_thinking: Option<bool>,
    #[serde(default)]
    pub has_thoughts: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn new(model: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            app_id: app_id.into(),
            enable_thinking: None,
            has_thoughts: None,
            description: None,
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Effort assumed when a request omits `reasoning_effort`. `null` leaves it
    /// unset so explicit booleans and per-app defaults apply.
    #[serde(default = "default_reasoning_effort")]
    pub default_reasoning_effort: Option<String>,
    /// Emit a terminal chunk and `[DONE]` when the upstream stream ends
    /// without a terminal marker.
    #[serde(default = "default_true")]
    pub synthesize_stream_end: bool,
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "INFO".to_string()
}
#[allow(clippy::unnecessary_wraps)]
fn default_reasoning_effort() -> Option<String> {
    Some("low".to_string())
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_reasoning_effort: default_reasoning_effort(),
            synthesize_stream_end: true,
        }
    }
}

/// Top-level shim configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShimConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashscope: DashScopeConfig,
    pub apps: Vec<AppConfig>,
    #[serde(default)]
    pub features: FeaturesConfig,
}

impl ShimConfig {
    /// Configuration with defaults everywhere and the given app mappings.
    #[must_use]
    pub fn with_apps(apps: Vec<AppConfig>) -> Self {
        Self {
            server: ServerConfig::default(),
            dashscope: DashScopeConfig::default(),
            apps,
            features: FeaturesConfig::default(),
        }
    }
}

/// Load configuration from a YAML file, apply environment overrides and
/// validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when an override cannot be
/// parsed or semantic validation fails.
pub fn load_config(path: &str) -> Result<ShimConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let mut config: ShimConfig = serde_yaml::from_str(&contents)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Overlay environment variables onto a parsed config. Empty values are
/// ignored.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when a numeric override is not a number.
pub fn apply_env_overrides<F>(config: &mut ShimConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(api_key) = get("DASHSCOPE_API_KEY") {
        config.dashscope.api_key = Some(api_key);
    }
    if let Some(base_url) = get("DASHSCOPE_BASE_URL") {
        config.dashscope.base_url = base_url;
    }
    if let Some(raw) = get("BAILIAN_REASONING_DELTA_MAX") {
        config.dashscope.reasoning_delta_max =
            parse_override("BAILIAN_REASONING_DELTA_MAX", &raw)?;
    }
    if let Some(raw) = get("REQUEST_TIMEOUT") {
        config.server.timeout = parse_override("REQUEST_TIMEOUT", &raw)?;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.features.log_level = level;
    }
    Ok(())
}

fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::Validation(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}
