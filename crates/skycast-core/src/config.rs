use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use skycast_weather::provider::{FORECAST_API_URL, SUN_API_URL, USER_AGENT};
use skycast_weather::{ProviderConfig, ServiceOptions};

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Forecast service settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// met.no classic locationforecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// met.no sunrise endpoint
    #[serde(default = "default_sun_url")]
    pub sun_url: String,

    /// Identifying User-Agent, required by met.no's terms of service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cache directory override (default: local data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_forecast_url() -> String {
    FORECAST_API_URL.to_string()
}

fn default_sun_url() -> String {
    SUN_API_URL.to_string()
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            sun_url: default_sun_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_dir: None,
        }
    }
}

impl From<&WeatherConfig> for ServiceOptions {
    fn from(config: &WeatherConfig) -> Self {
        ServiceOptions {
            provider: ProviderConfig {
                forecast_url: config.forecast_url.clone(),
                sun_url: config.sun_url.clone(),
                user_agent: config.user_agent.clone(),
                timeout: Duration::from_secs(config.request_timeout_secs),
            },
            cache_dir: config.cache_dir.clone(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.sun_url, "weather.sun_url", &mut result);

        if self.weather.user_agent.trim().is_empty() {
            result.add_error(
                "weather.user_agent",
                "User-Agent must identify the client",
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.weather.request_timeout_secs > 120 {
            result.add_warning(
                "weather.request_timeout_secs",
                "Request timeout is unusually long (>120 seconds)",
            );
        }

        if let Some(dir) = &self.weather.cache_dir {
            if dir.exists() && !dir.is_dir() {
                result.add_error(
                    "weather.cache_dir",
                    format!("Path is not a directory: {}", dir.display()),
                );
            }
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config dir>/skycast/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.weather.forecast_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "weather.forecast_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.sun_url = "ftp://api.met.no/sun".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_empty_user_agent() {
        let mut config = Config::default();
        config.weather.user_agent = "  ".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "weather.user_agent"));
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = Config::default();
        config.weather.request_timeout_secs = 0;
        assert!(!config.validate().is_valid());

        config.weather.request_timeout_secs = 300;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "weather.request_timeout_secs"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_load_from_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skycast").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.weather.forecast_url, FORECAST_API_URL);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.weather.user_agent, config.weather.user_agent);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[weather]\nuser_agent = \"acme-weather/2.0 ops@acme.test\"\ncache_dir = \"/tmp/acme\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.weather.user_agent, "acme-weather/2.0 ops@acme.test");
        assert_eq!(config.weather.sun_url, SUN_API_URL);
        assert_eq!(config.weather.request_timeout_secs, 10);
        assert_eq!(config.weather.cache_dir, Some(PathBuf::from("/tmp/acme")));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\nrequest_timeout_secs = 0\n").unwrap();
        let err = Config::load_validated(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_into_service_options() {
        let mut config = WeatherConfig::default();
        config.request_timeout_secs = 3;
        config.cache_dir = Some(PathBuf::from("/var/cache/skycast"));

        let options = ServiceOptions::from(&config);
        assert_eq!(options.provider.timeout, Duration::from_secs(3));
        assert_eq!(options.provider.forecast_url, FORECAST_API_URL);
        assert_eq!(options.cache_dir, Some(PathBuf::from("/var/cache/skycast")));
    }
}
