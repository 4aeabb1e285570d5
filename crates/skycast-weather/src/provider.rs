//! met.no HTTP client: location forecasts plus sun events.

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::error::WeatherServiceError;
use crate::sun;
use crate::types::{Coordinates, SunData, WeatherPayload};

pub const FORECAST_API_URL: &str =
    "https://api.met.no/weatherapi/locationforecast/2.0/classic";
pub const SUN_API_URL: &str = "https://api.met.no/weatherapi/sunrise/3.0/sun";
pub const USER_AGENT: &str = "skycast/0.1.0 (https://github.com/skycast/skycast)";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Endpoints and client identity for [`WeatherProvider`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub forecast_url: String,
    pub sun_url: String,
    /// met.no rejects requests without an identifying User-Agent.
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            forecast_url: FORECAST_API_URL.to_string(),
            sun_url: SUN_API_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// A parsed forecast together with the headers that govern its lifetime.
#[derive(Debug, Clone)]
pub struct FetchedForecast {
    pub payload: WeatherPayload,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    forecast_url: String,
    sun_url: String,
}

impl WeatherProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, WeatherServiceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            forecast_url: config.forecast_url,
            sun_url: config.sun_url,
        })
    }

    /// Fetch and parse the XML forecast for `coords`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        coords: &Coordinates,
    ) -> Result<FetchedForecast, WeatherServiceError> {
        let url = format!(
            "{}?lat={}&lon={}",
            self.forecast_url,
            coords.lat_param(),
            coords.lon_param()
        );
        tracing::info!("Fetching weather data from: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/xml")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await?;
            let payload = WeatherPayload::parse(&body)?;
            Ok(FetchedForecast { payload, headers })
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(WeatherServiceError::RateLimited(
                "Rate limit exceeded. Try again later.".to_string(),
            ))
        } else if status == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            Err(WeatherServiceError::RequestFailed(format!(
                "API request failed: {}",
                text
            )))
        } else {
            Err(WeatherServiceError::RequestFailed(format!(
                "API request failed with status code: {}",
                status
            )))
        }
    }

    /// Sunrise/sunset for `coords` on `date`; `None` on any failure.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_sun_events(&self, coords: &Coordinates, date: NaiveDate) -> Option<SunData> {
        sun::fetch_sun_events(&self.client, &self.sun_url, coords, date).await
    }
}
