//! Application-level error types.
//!
//! `AppError` gathers everything the command-line front end can hit and maps
//! it to a message fit for the terminal via `user_message()`.

use skycast_weather::WeatherServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Recover the typed error behind an `anyhow::Error`.
    ///
    /// Anything unrecognised stays in `Other`, whose message still looks
    /// through context for a `ConfigError`.
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<AppError>() {
            Ok(app) => return app,
            Err(err) => err,
        };
        match err.downcast::<WeatherServiceError>() {
            Ok(weather) => AppError::Weather(weather),
            Err(err) => AppError::Other(err),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(e) => match e.downcast_ref::<ConfigError>() {
                Some(config) => config.user_message().to_string(),
                None => "An unexpected error occurred. Please try again.".to_string(),
            },
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = WeatherServiceError::RateLimited("429".into()).into();
        assert!(matches!(
            err,
            AppError::Weather(WeatherServiceError::RateLimited(_))
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let err = AppError::Weather(WeatherServiceError::RateLimited("429".into()));
        assert_eq!(err.user_message(), "Too many requests. Please try again later.");

        let err = AppError::Config(ConfigError::Invalid("weather.sun_url".into()));
        assert_eq!(err.user_message(), "Invalid configuration. Check your settings.");
    }

    #[test]
    fn test_classify_recovers_weather_error() {
        let err = anyhow::Error::from(WeatherServiceError::RateLimited("429".into()));
        let app = AppError::classify(err);
        assert!(matches!(app, AppError::Weather(WeatherServiceError::RateLimited(_))));
        assert_eq!(app.user_message(), "Too many requests. Please try again later.");
    }

    #[test]
    fn test_classify_unwraps_app_error() {
        let err = anyhow::Error::from(AppError::Config(ConfigError::Invalid("x".into())));
        assert!(matches!(AppError::classify(err), AppError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_classify_keeps_config_context() {
        let err = anyhow::Error::from(ConfigError::Invalid("weather.sun_url".into()))
            .context("Failed to load config");
        let app = AppError::classify(err);
        assert!(matches!(app, AppError::Other(_)));
        assert_eq!(app.user_message(), "Invalid configuration. Check your settings.");
    }

    #[test]
    fn test_classify_unknown_error() {
        let app = AppError::classify(anyhow::anyhow!("disk on fire"));
        assert_eq!(app.user_message(), "An unexpected error occurred. Please try again.");
    }

    #[test]
    fn test_wrapped_config_error_message() {
        let inner = anyhow::Error::from(ConfigError::ParseError("line 1".into()))
            .context("Failed to parse config file");
        let err = AppError::Other(inner);
        assert_eq!(
            err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
    }
}
