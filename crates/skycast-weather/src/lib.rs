//! Weather retrieval and caching for Skycast
//!
//! Fetches met.no location forecasts (XML), annotates them with sunrise and
//! sunset from the sun-events API (JSON), and serves the merged document
//! through a memory slot backed by an on-disk cache whose lifetime follows
//! the forecast server's freshness headers.

pub mod cache;
mod document;
pub mod error;
pub mod expiry;
pub mod merge;
pub mod provider;
pub mod snapshot;
pub mod store;
pub mod sun;
pub mod types;

pub use cache::{ServiceOptions, WeatherCache};
pub use error::{WeatherErrorKind, WeatherServiceError};
pub use expiry::{ExpiryPolicy, DEFAULT_CACHE_SECS};
pub use provider::{FetchedForecast, ProviderConfig, WeatherProvider};
pub use snapshot::ForecastSnapshot;
pub use store::DiskCache;
pub use types::*;
