//! Sunrise and sunset from the met.no sun-events API.
//! Best-effort: every failure degrades to `None`.

use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::types::{Coordinates, SunData, SunEvent};

#[derive(Debug, Deserialize)]
struct SunResponse {
    properties: Option<SunProperties>,
}

#[derive(Debug, Deserialize)]
struct SunProperties {
    sunrise: Option<SunEvent>,
    sunset: Option<SunEvent>,
}

impl SunResponse {
    /// Both events must be present; polar day/night responses carry nulls.
    fn into_sun_data(self) -> Option<SunData> {
        let props = self.properties?;
        Some(SunData {
            sunrise: props.sunrise?,
            sunset: props.sunset?,
        })
    }
}

/// Fetch sunrise/sunset for `coords` on `date`.
/// Returns `None` on transport failure, non-2xx status or an unusable body.
pub async fn fetch_sun_events(
    client: &Client,
    base_url: &str,
    coords: &Coordinates,
    date: NaiveDate,
) -> Option<SunData> {
    let url = format!(
        "{}?lat={}&lon={}&date={}",
        base_url,
        coords.lat_param(),
        coords.lon_param(),
        date.format("%Y-%m-%d")
    );
    tracing::info!("Fetching sun data from: {}", url);

    let response = match client
        .get(&url)
        .header(ACCEPT, "application/json")
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Sun data request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Failed to get sun data: {}", response.status());
        return None;
    }

    let body: SunResponse = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Sun data parse error: {}", e);
            return None;
        }
    };

    let sun = body.into_sun_data();
    if sun.is_none() {
        tracing::debug!("Sun data response had no sunrise/sunset");
    }
    sun
}
