//! Configuration management for the `LaWander` engine
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::LaWanderError;
use crate::geocoding::queries::{QueryRule, default_query_rules};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LaWanderConfig {
    /// Geocoder endpoint and resolver tuning
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// AI completion endpoint
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Geocode cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP host settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Geocoding endpoint and resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible search API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// User-Agent sent with every request (Nominatim rejects anonymous clients)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_geocoding_max_retries")]
    pub max_retries: u32,
    /// Maximum number of hits requested per place query
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
    /// Candidates farther than this from the destination are discarded
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    /// Places geocoded concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Regional qualifier appended to queries as a second attempt (e.g. a county seat)
    #[serde(default)]
    pub secondary_locale: Option<String>,
    /// Category-triggered query broadenings
    #[serde(default = "default_query_rules")]
    pub query_rules: Vec<QueryRule>,
}

/// AI completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Bearer token for the completion endpoint
    pub api_key: Option<String>,
    /// Base URL, without the `/v1/chat/completions` suffix
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_completion_timeout")]
    pub timeout_seconds: u32,
}

/// Geocode cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether geocoder responses are cached on disk
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for one request, itinerary generation included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("LaWander/{}", crate::VERSION)
}

fn default_geocoding_timeout() -> u32 {
    20
}

fn default_geocoding_max_retries() -> u32 {
    2
}

fn default_result_limit() -> u32 {
    15
}

fn default_max_distance_km() -> f64 {
    50.0
}

fn default_batch_size() -> u32 {
    3
}

fn default_batch_delay_ms() -> u64 {
    300
}

fn default_completion_base_url() -> String {
    "https://api.cerebras.ai".to_string()
}

fn default_model() -> String {
    "llama3.1-8b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_completion_timeout() -> u32 {
    60
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    24 * 7
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("lawander").to_string_lossy().to_string())
        .unwrap_or_else(|| ".lawander-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u32 {
    120
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
            max_retries: default_geocoding_max_retries(),
            result_limit: default_result_limit(),
            max_distance_km: default_max_distance_km(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            secondary_locale: None,
            query_rules: default_query_rules(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_completion_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl LaWanderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // LAWANDER_GEOCODING__SECONDARY_LOCALE=... style overrides
        builder = builder.add_source(
            Environment::with_prefix("LAWANDER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: LaWanderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lawander").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.geocoding.result_limit == 0 {
            self.geocoding.result_limit = default_result_limit();
        }
        if self.geocoding.batch_size == 0 {
            self.geocoding.batch_size = default_batch_size();
        }
        if self
            .geocoding
            .secondary_locale
            .as_deref()
            .is_some_and(|locale| locale.trim().is_empty())
        {
            self.geocoding.secondary_locale = None;
        }
        if self.completion.api_key.is_none() {
            self.completion.api_key = std::env::var("CEREBRAS_API_KEY").ok();
        }
        if self.completion.base_url.is_empty() {
            self.completion.base_url = default_completion_base_url();
        }
        if self.completion.model.is_empty() {
            self.completion.model = default_model();
        }
        if self.completion.timeout_seconds == 0 {
            self.completion.timeout_seconds = default_completion_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is only required once a completion is actually requested
        if let Some(api_key) = &self.completion.api_key {
            if api_key.is_empty() {
                return Err(LaWanderError::config(
                    "Completion API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(LaWanderError::config(
                    "Completion API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 200 {
                return Err(LaWanderError::config(
                    "Completion API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.geocoding.timeout_seconds > 300 || self.completion.timeout_seconds > 300 {
            return Err(LaWanderError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.geocoding.max_retries > 10 {
            return Err(LaWanderError::config("Geocoding max retries cannot exceed 10").into());
        }

        if self.geocoding.result_limit > 50 {
            return Err(LaWanderError::config("Geocoding result limit cannot exceed 50").into());
        }

        if !(self.geocoding.max_distance_km > 0.0 && self.geocoding.max_distance_km <= 500.0) {
            return Err(LaWanderError::config(
                "Maximum place distance must be between 0 and 500 km",
            )
            .into());
        }

        if self.geocoding.batch_size > 10 {
            return Err(LaWanderError::config("Geocoding batch size cannot exceed 10").into());
        }

        if self.geocoding.batch_delay_ms > 10_000 {
            return Err(LaWanderError::config(
                "Geocoding batch delay cannot exceed 10000 ms",
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(LaWanderError::config(
                "Completion temperature must be between 0.0 and 2.0",
            )
            .into());
        }

        if self.cache.ttl_hours > 24 * 90 {
            return Err(LaWanderError::config("Cache TTL cannot exceed 2160 hours (90 days)").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(LaWanderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(LaWanderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Completion", &self.completion.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LaWanderError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LaWanderConfig::default();
        assert_eq!(config.geocoding.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.geocoding.result_limit, 15);
        assert_eq!(config.geocoding.max_distance_km, 50.0);
        assert_eq!(config.geocoding.batch_size, 3);
        assert_eq!(config.geocoding.batch_delay(), Duration::from_millis(300));
        assert_eq!(config.completion.model, "llama3.1-8b");
        assert_eq!(config.logging.level, "info");
        assert!(config.geocoding.secondary_locale.is_none());
        assert!(!config.geocoding.query_rules.is_empty());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(LaWanderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = LaWanderConfig::default();
        config.completion.api_key = Some("abc".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = LaWanderConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = LaWanderConfig::default();
        config.geocoding.batch_size = 50;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("batch size cannot exceed"));
    }

    #[test]
    fn test_config_validation_rejects_non_http_url() {
        let mut config = LaWanderConfig::default();
        config.geocoding.base_url = "ftp://example.org".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Geocoding base URL"));
    }

    #[test]
    fn test_apply_defaults_clears_blank_locale() {
        let mut config = LaWanderConfig::default();
        config.geocoding.secondary_locale = Some("  ".to_string());
        config.geocoding.batch_size = 0;
        config.apply_defaults();
        assert!(config.geocoding.secondary_locale.is_none());
        assert_eq!(config.geocoding.batch_size, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[geocoding]\nsecondary_locale = \"Anyksciai\"\nbatch_delay_ms = 500\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = LaWanderConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.geocoding.secondary_locale.as_deref(), Some("Anyksciai"));
        assert_eq!(config.geocoding.batch_delay_ms, 500);
        assert_eq!(config.geocoding.batch_size, 3);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = LaWanderConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("lawander"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
