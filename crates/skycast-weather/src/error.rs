//! Weather service error types.

use thiserror::Error;

/// Failures surfaced by [`crate::WeatherCache::get_weather_data`].
///
/// Sun-event and disk-cache problems never show up here; they degrade to
/// "no annotation" and "cache miss" respectively.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherServiceError {
    /// Invalid coordinates, non-2xx status (other than 429) or transport failure.
    #[error("{0}")]
    RequestFailed(String),

    #[error("{0}")]
    RateLimited(String),

    /// The forecast body, or its structure, could not be understood.
    #[error("{0}")]
    ParseError(String),
}

/// Discriminant of [`WeatherServiceError`] without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherErrorKind {
    RequestFailed,
    RateLimited,
    ParseError,
}

impl WeatherServiceError {
    pub fn kind(&self) -> WeatherErrorKind {
        match self {
            Self::RequestFailed(_) => WeatherErrorKind::RequestFailed,
            Self::RateLimited(_) => WeatherErrorKind::RateLimited,
            Self::ParseError(_) => WeatherErrorKind::ParseError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::RequestFailed(msg) | Self::RateLimited(msg) | Self::ParseError(msg) => msg,
        }
    }

    /// User-friendly status line for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited(_) => "Too many requests. Please try again later.".to_string(),
            Self::ParseError(_) => "Error parsing weather data. Please try again.".to_string(),
            Self::RequestFailed(msg) => format!("Error: {}", msg),
        }
    }
}

impl From<reqwest::Error> for WeatherServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self::RequestFailed(format!(
            "Network error while fetching weather data: {}",
            e
        ))
    }
}
