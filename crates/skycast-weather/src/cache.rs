//! Two-tier forecast cache: one in-memory slot in front of [`DiskCache`].
//!
//! All calls are serialized through a single async mutex, so a refresh that
//! fires while an initial load is in flight waits for it instead of racing it.

use chrono::{Local, Utc};
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::error::WeatherServiceError;
use crate::expiry::ExpiryPolicy;
use crate::merge::annotate_sun_events;
use crate::provider::{ProviderConfig, WeatherProvider};
use crate::store::{is_missing, DiskCache};
use crate::types::{CacheEntry, CacheMetadata, Coordinates, LocationKey, WeatherPayload};

/// Everything needed to build a [`WeatherCache`].
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub provider: ProviderConfig,
    /// Defaults to [`DiskCache::default_dir`].
    pub cache_dir: Option<PathBuf>,
}

pub struct WeatherCache {
    provider: WeatherProvider,
    store: DiskCache,
    policy: ExpiryPolicy,
    slot: Mutex<Option<CacheEntry>>,
}

impl WeatherCache {
    pub fn new(provider: WeatherProvider, store: DiskCache) -> Self {
        Self {
            provider,
            store,
            policy: ExpiryPolicy::default(),
            slot: Mutex::new(None),
        }
    }

    pub fn from_options(options: ServiceOptions) -> anyhow::Result<Self> {
        let provider = WeatherProvider::new(options.provider)?;
        let dir = options.cache_dir.unwrap_or_else(DiskCache::default_dir);
        let store = DiskCache::new(dir)?;
        Ok(Self::new(provider, store))
    }

    pub fn store(&self) -> &DiskCache {
        &self.store
    }

    /// Forecast for the given coordinates, served from memory, disk or network.
    ///
    /// With `force_refresh` both cache tiers are skipped on read but still
    /// written on success.
    pub async fn get_weather_data(
        &self,
        latitude: f64,
        longitude: f64,
        force_refresh: bool,
    ) -> Result<WeatherPayload, WeatherServiceError> {
        let coords = Coordinates::new(latitude, longitude)?;
        let key = coords.key();

        let mut slot = self.slot.lock().await;

        if !force_refresh {
            if let Some(entry) = slot.as_ref() {
                if entry.is_fresh_for(&key, Utc::now()) {
                    tracing::debug!("Weather memory cache hit for {}", key);
                    return Ok(entry.payload.clone());
                }
            }

            if let Some(entry) = self.load_from_disk(&key).await {
                let payload = entry.payload.clone();
                *slot = Some(entry);
                return Ok(payload);
            }
        }

        let entry = self.fetch_from_network(&coords, key).await?;
        let payload = entry.payload.clone();
        *slot = Some(entry);
        Ok(payload)
    }

    /// Drop the memory slot and delete every cached file pair.
    pub async fn clear_cache(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        self.store.clear().await;
    }

    /// A fresh disk entry, or `None` for a miss, stale pair or unreadable pair.
    async fn load_from_disk(&self, key: &LocationKey) -> Option<CacheEntry> {
        let (payload, metadata) = match self.store.read(key).await {
            Ok(pair) => pair,
            Err(e) if is_missing(&e) => {
                tracing::debug!("No disk cache for {}", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Ignoring unusable disk cache for {}: {:#}", key, e);
                return None;
            }
        };

        if !metadata.is_fresh(Utc::now()) {
            tracing::debug!("Disk cache for {} expired at {}", key, metadata.expiration_time);
            return None;
        }

        tracing::debug!("Weather disk cache hit for {}", key);
        Some(CacheEntry {
            key: key.clone(),
            payload,
            expires_at: metadata.expiration_time,
        })
    }

    async fn fetch_from_network(
        &self,
        coords: &Coordinates,
        key: LocationKey,
    ) -> Result<CacheEntry, WeatherServiceError> {
        let sun = self
            .provider
            .fetch_sun_events(coords, Local::now().date_naive())
            .await;
        let forecast = self.provider.fetch_forecast(coords).await?;
        let payload = annotate_sun_events(forecast.payload, sun.as_ref());

        let now = Utc::now();
        let metadata = CacheMetadata {
            creation_time: now,
            expiration_time: self.policy.expires_at(&forecast.headers, now),
            location: key.clone(),
        };

        match self.store.write(&key, &payload, &metadata).await {
            Ok(()) => tracing::info!(
                "Cached weather for {} until {}",
                key,
                metadata.expiration_time
            ),
            Err(e) => tracing::warn!("Failed to write weather cache for {}: {:#}", key, e),
        }

        Ok(CacheEntry {
            key,
            payload,
            expires_at: metadata.expiration_time,
        })
    }
}
