//! Typed view over a merged forecast payload.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use xmltree::{Element, XMLNode};

use crate::error::WeatherServiceError;
use crate::types::WeatherPayload;

/// Current conditions read from the earliest forecast time-slice.
///
/// Instant values (temperature, wind, ...) come from the first slice; period
/// values (symbol, precipitation, min/max) from the first slice carrying them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSnapshot {
    pub from: Option<String>,
    pub temperature: Option<f64>,
    pub wind_direction: Option<String>,
    pub wind_speed: Option<f64>,
    pub beaufort: Option<u8>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub cloudiness: Option<f64>,
    pub dew_point: Option<f64>,
    pub symbol_code: Option<String>,
    pub precipitation: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
}

impl ForecastSnapshot {
    pub fn from_payload(payload: &WeatherPayload) -> Result<Self, WeatherServiceError> {
        let mut slices = Vec::new();
        collect_forecast_slices(payload.root(), &mut slices);

        let first = slices.first().ok_or_else(|| {
            WeatherServiceError::ParseError("No forecast data found in weather response".into())
        })?;
        let location = first.get_child("location").ok_or_else(|| {
            WeatherServiceError::ParseError("No location data found in weather response".into())
        })?;

        let locations: Vec<&Element> = slices
            .iter()
            .filter_map(|slice| slice.get_child("location"))
            .collect();

        Ok(Self {
            from: first.attributes.get("from").cloned(),
            temperature: number(location, "temperature", "value")?,
            wind_direction: text(location, "windDirection", "name"),
            wind_speed: number(location, "windSpeed", "mps")?,
            beaufort: number(location, "windSpeed", "beaufort")?,
            humidity: number(location, "humidity", "value")?,
            pressure: number(location, "pressure", "value")?,
            cloudiness: number(location, "cloudiness", "percent")?,
            dew_point: number(location, "dewpointTemperature", "value")?,
            symbol_code: locations
                .iter()
                .find_map(|loc| text(loc, "symbol", "code")),
            precipitation: first_number(&locations, "precipitation", "value")?,
            min_temperature: first_number(&locations, "minTemperature", "value")?,
            max_temperature: first_number(&locations, "maxTemperature", "value")?,
            sunrise: payload.sunrise().map(parse_sun_time).transpose()?,
            sunset: payload.sunset().map(parse_sun_time).transpose()?,
        })
    }
}

fn collect_forecast_slices<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &element.children {
        if let XMLNode::Element(e) = child {
            if e.name == "time"
                && e.attributes.get("datatype").map(String::as_str) == Some("forecast")
            {
                out.push(e);
            }
            collect_forecast_slices(e, out);
        }
    }
}

fn text(location: &Element, child: &str, attr: &str) -> Option<String> {
    location
        .get_child(child)
        .and_then(|e| e.attributes.get(attr))
        .cloned()
}

fn number<T: std::str::FromStr>(
    location: &Element,
    child: &str,
    attr: &str,
) -> Result<Option<T>, WeatherServiceError> {
    text(location, child, attr)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| {
                WeatherServiceError::ParseError(format!(
                    "Failed to parse weather data: {}/@{} is not a number: {}",
                    child, attr, raw
                ))
            })
        })
        .transpose()
}

fn first_number(
    locations: &[&Element],
    child: &str,
    attr: &str,
) -> Result<Option<f64>, WeatherServiceError> {
    for location in locations {
        if let Some(value) = number(location, child, attr)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// met.no sun times omit seconds (`2026-10-19T08:01+02:00`).
fn parse_sun_time(raw: &str) -> Result<DateTime<FixedOffset>, WeatherServiceError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z"))
        .map_err(|e| {
            WeatherServiceError::ParseError(format!(
                "Failed to parse weather data: invalid sun time {}: {}",
                raw, e
            ))
        })
}
