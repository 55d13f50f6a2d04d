//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted rate limit window
pub const MAX_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Upstream API configuration
    pub api: ApiConfig,
    /// Client-side rate budget
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Input and batching limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Whether request metrics are collected
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Upstream completion API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// API key
    pub api_key: String,
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Default maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Sliding-window rate limit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: f64,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum retry attempts after the first call
    pub max_retries: u32,
    /// Base delay (milliseconds) when no explicit schedule is given
    pub base_delay_ms: u64,
    /// Explicit delay schedule (milliseconds); doubles past its end
    #[serde(default)]
    pub delays_ms: Vec<u64>,
    /// Maximum delay time (milliseconds)
    pub max_delay_ms: u64,
    /// Fixed wait after an upstream 429 without Retry-After (milliseconds)
    pub rate_limit_delay_ms: u64,
}

/// Input and batching limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    /// Maximum characters per input text
    pub max_text_length: usize,
    /// Maximum texts per batch call
    pub max_batch_size: usize,
    /// Texts per combined batch prompt
    pub batch_chunk_size: usize,
    /// Pause between sequential fan-out calls (milliseconds)
    pub request_delay_ms: u64,
    /// Target count above which multi-target calls may use one prompt
    pub multi_target_batch_threshold: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_seconds: 60.0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            delays_ms: Vec::new(),
            max_delay_ms: 30_000,
            rate_limit_delay_ms: 1000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_length: 50_000,
            max_batch_size: 100,
            batch_chunk_size: 20,
            request_delay_ms: 500,
            multi_target_batch_threshold: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl RateLimitConfig {
    /// Window as a duration; must be positive and at most one day
    pub fn window(&self) -> Result<Duration> {
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            anyhow::bail!("Rate limit window must be a positive number of seconds");
        }
        match Duration::try_from_secs_f64(self.window_seconds) {
            Ok(window) if window <= MAX_RATE_LIMIT_WINDOW => Ok(window),
            _ => anyhow::bail!(
                "Rate limit window cannot exceed {} seconds, got {}",
                MAX_RATE_LIMIT_WINDOW.as_secs(),
                self.window_seconds
            ),
        }
    }
}

impl RetryConfig {
    /// Wait before retry number `attempt + 1`
    ///
    /// Uses the explicit schedule while it lasts, then keeps doubling its last
    /// entry; without a schedule it is `base_delay_ms * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let ms = match self.delays_ms.get(attempt as usize) {
            Some(ms) => *ms,
            None => match self.delays_ms.last() {
                Some(last) => {
                    let overflow = attempt + 1 - self.delays_ms.len() as u32;
                    last.saturating_mul(2_u64.saturating_pow(overflow))
                }
                None => self.base_delay_ms.saturating_mul(2_u64.saturating_pow(attempt)),
            },
        };
        Duration::from_millis(ms.min(self.max_delay_ms))
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

impl LimitsConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Settings {
    /// Create a new configuration instance from the environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let api_key = std::env::var("AI_TRANSLATOR_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .context("AI_TRANSLATOR_API_KEY (or OPENAI_API_KEY) environment variable not set")?;

        let retry_defaults = RetryConfig::default();
        let limit_defaults = LimitsConfig::default();

        let settings = Self {
            api: ApiConfig {
                api_key,
                base_url: get_env_or_default("AI_TRANSLATOR_BASE_URL", &default_base_url()),
                model: get_env_or_default("AI_TRANSLATOR_MODEL", &default_model()),
                timeout: parse_env("AI_TRANSLATOR_TIMEOUT", default_timeout())
                    .context("Invalid timeout value")?,
                max_tokens: parse_env("AI_TRANSLATOR_MAX_TOKENS", default_max_tokens())
                    .context("Invalid max tokens value")?,
                temperature: parse_env("AI_TRANSLATOR_TEMPERATURE", default_temperature())
                    .context("Invalid temperature value")?,
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_env("AI_TRANSLATOR_RATE_LIMIT_REQUESTS", 60)
                    .context("Invalid rate limit request count")?,
                window_seconds: parse_env("AI_TRANSLATOR_RATE_LIMIT_WINDOW", 60.0)
                    .context("Invalid rate limit window")?,
            },
            retry: RetryConfig {
                max_retries: parse_env("AI_TRANSLATOR_MAX_RETRIES", retry_defaults.max_retries)
                    .context("Invalid max retries")?,
                delays_ms: parse_delay_list(&get_env_or_default("AI_TRANSLATOR_RETRY_DELAYS", ""))
                    .context("Invalid retry delay schedule")?,
                ..retry_defaults
            },
            limits: LimitsConfig {
                request_delay_ms: parse_env("AI_TRANSLATOR_REQUEST_DELAY_MS", limit_defaults.request_delay_ms)
                    .context("Invalid request delay")?,
                max_batch_size: parse_env("AI_TRANSLATOR_MAX_BATCH_SIZE", limit_defaults.max_batch_size)
                    .context("Invalid maximum batch size")?,
                ..limit_defaults
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
            metrics_enabled: parse_env("AI_TRANSLATOR_METRICS", true)
                .context("Invalid metrics flag")?,
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Default settings around an explicit API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                api_key: api_key.into(),
                base_url: default_base_url(),
                model: default_model(),
                timeout: default_timeout(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
            },
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
            metrics_enabled: true,
        }
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.is_empty() {
            anyhow::bail!("API key cannot be empty");
        }

        if self.api.api_key.contains(char::is_whitespace) {
            anyhow::bail!("API key cannot contain whitespace characters");
        }

        if !self.api.base_url.starts_with("http") {
            anyhow::bail!("Invalid base URL format, should start with 'http'");
        }

        if self.api.model.trim().is_empty() {
            anyhow::bail!("Model name cannot be empty");
        }

        if self.api.timeout == 0 {
            anyhow::bail!("Timeout value cannot be 0");
        }

        if !(0.0..=2.0).contains(&self.api.temperature) {
            anyhow::bail!("Temperature must be between 0.0 and 2.0, got {}", self.api.temperature);
        }

        if self.rate_limit.max_requests == 0 {
            anyhow::bail!("Rate limit request count cannot be 0");
        }

        self.rate_limit.window()?;

        if self.limits.max_text_length == 0 {
            anyhow::bail!("Maximum text length cannot be 0");
        }

        if self.limits.max_batch_size == 0 || self.limits.batch_chunk_size == 0 {
            anyhow::bail!("Batch sizes cannot be 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{}={:?} could not be parsed", key, value)),
        Err(_) => Ok(default),
    }
}

/// Parse a comma separated list of milliseconds
fn parse_delay_list(value: &str) -> Result<Vec<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().with_context(|| format!("Invalid delay: {}", part)))
        .collect()
}
