use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use xmltree::{Element, XMLNode};

use crate::document::parse_document;
use crate::error::WeatherServiceError;

/// Validated geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate latitude in [-90, 90] and longitude in [-180, 180].
    ///
    /// Out-of-range (and NaN) values are a `RequestFailed`, raised before
    /// any network or disk access.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherServiceError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherServiceError::RequestFailed(format!(
                "Invalid latitude value: {}. Must be between -90 and 90.",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherServiceError::RequestFailed(format!(
                "Invalid longitude value: {}. Must be between -180 and 180.",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude as sent on the wire: six fractional digits, period separator.
    pub fn lat_param(&self) -> String {
        format!("{:.6}", self.latitude)
    }

    pub fn lon_param(&self) -> String {
        format!("{:.6}", self.longitude)
    }

    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.latitude, self.longitude)
    }
}

/// Canonical identity of a location, quantized to six decimal digits.
///
/// Coordinates that round to the same `"{lat:.6},{lon:.6}"` string share one
/// cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(format!("{:.6},{:.6}", latitude, longitude))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe stem shared by the payload and metadata files.
    pub fn file_stem(&self) -> String {
        format!("weather_{}", self.0.replace(',', "_"))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted alongside each cached payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub creation_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub location: LocationKey,
}

impl CacheMetadata {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expiration_time
    }
}

/// The single in-memory cache slot
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: LocationKey,
    pub payload: WeatherPayload,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh_for(&self, key: &LocationKey, now: DateTime<Utc>) -> bool {
        &self.key == key && now < self.expires_at
    }
}

/// A sunrise or sunset as reported by the sun-events API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunEvent {
    /// ISO-8601 timestamp, kept verbatim
    pub time: String,
    #[serde(default)]
    pub azimuth: f64,
}

/// Sun annotation for one day; `Option<SunData>` is "present or absent".
#[derive(Debug, Clone, PartialEq)]
pub struct SunData {
    pub sunrise: SunEvent,
    pub sunset: SunEvent,
}

/// Forecast document rooted at `<weatherdata>`
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPayload {
    root: Element,
}

impl WeatherPayload {
    pub fn parse(xml: &str) -> Result<Self, WeatherServiceError> {
        parse_document(xml)
            .map(|root| Self { root })
            .map_err(|e| {
                WeatherServiceError::ParseError(format!("Failed to parse weather data: {}", e))
            })
    }

    pub fn to_xml_string(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        self.root
            .write(&mut buf)
            .context("Failed to serialize weather payload")?;
        String::from_utf8(buf).context("Weather payload is not valid UTF-8")
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// `time` attribute of the root-level `sunrise` node, if annotated.
    pub fn sunrise(&self) -> Option<&str> {
        self.root_attr("sunrise", "time")
    }

    pub fn sunset(&self) -> Option<&str> {
        self.root_attr("sunset", "time")
    }

    fn root_attr(&self, child: &str, attr: &str) -> Option<&str> {
        self.root
            .children
            .iter()
            .filter_map(|node| match node {
                XMLNode::Element(e) => Some(e),
                _ => None,
            })
            .find(|e| e.name == child)
            .and_then(|e| e.attributes.get(attr))
            .map(String::as_str)
    }
}
