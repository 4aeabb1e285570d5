//! File-pair persistence for forecast payloads.
//!
//! Each location gets `weather_<lat>_<lon>.cache` (the XML payload) and
//! `weather_<lat>_<lon>.meta` (JSON [`CacheMetadata`]). Both are written to a
//! temporary sibling and renamed into place, payload first, so metadata never
//! points at a payload that was not fully written. A pair with either file
//! missing or unreadable is a miss.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::types::{CacheMetadata, LocationKey, WeatherPayload};

const FILE_PREFIX: &str = "weather_";
const PAYLOAD_EXT: &str = "cache";
const META_EXT: &str = "meta";

/// On-disk half of the two-tier cache.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open the cache rooted at `dir`, creating it if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// `<local data dir>/skycast/cache`
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast")
            .join("cache")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, key: &LocationKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.file_stem(), PAYLOAD_EXT))
    }

    fn meta_path(&self, key: &LocationKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key.file_stem(), META_EXT))
    }

    /// Persist a payload and its metadata.
    pub async fn write(
        &self,
        key: &LocationKey,
        payload: &WeatherPayload,
        metadata: &CacheMetadata,
    ) -> Result<()> {
        let xml = payload.to_xml_string()?;
        let meta_json =
            serde_json::to_vec(metadata).context("Failed to serialize cache metadata")?;

        write_atomic(&self.payload_path(key), xml.as_bytes()).await?;
        write_atomic(&self.meta_path(key), &meta_json).await?;

        tracing::debug!("Wrote weather cache for {}", key);
        Ok(())
    }

    /// Load the pair for `key`, whatever its freshness.
    ///
    /// Errors cover every way the pair can be unusable: a missing file,
    /// unreadable bytes, malformed JSON or XML, or metadata recorded for a
    /// different location.
    pub async fn read(&self, key: &LocationKey) -> Result<(WeatherPayload, CacheMetadata)> {
        let meta_path = self.meta_path(key);
        let payload_path = self.payload_path(key);

        let meta_json = fs::read(&meta_path)
            .await
            .with_context(|| format!("Failed to read {}", meta_path.display()))?;
        let metadata: CacheMetadata = serde_json::from_slice(&meta_json)
            .with_context(|| format!("Malformed cache metadata in {}", meta_path.display()))?;
        if &metadata.location != key {
            anyhow::bail!(
                "Cache metadata is for {}, expected {}",
                metadata.location,
                key
            );
        }

        let xml = fs::read_to_string(&payload_path)
            .await
            .with_context(|| format!("Failed to read {}", payload_path.display()))?;
        let payload = WeatherPayload::parse(&xml)?;

        Ok((payload, metadata))
    }

    /// Best-effort removal of every payload/metadata file and stray temp file.
    ///
    /// Returns the number of files deleted; individual failures are logged.
    pub async fn clear(&self) -> usize {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list cache directory {}: {}", self.dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read cache directory entry: {}", e);
                    break;
                }
            };

            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to delete {}: {}", path.display(), e),
            }
        }

        tracing::info!("Cleared {} weather cache files", removed);
        removed
    }
}

/// True when `err` from [`DiskCache::read`] means one of the files is absent,
/// as opposed to present but unusable.
pub(crate) fn is_missing(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

fn is_cache_file(path: &Path) -> bool {
    let Some(rest) = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix(FILE_PREFIX))
    else {
        return false;
    };
    // `<name>.<pid>.tmp` left behind by an interrupted write
    let target = match rest.strip_suffix(".tmp").and_then(|n| n.rsplit_once('.')) {
        Some((base, pid)) if !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()) => base,
        Some(_) => return false,
        None => rest,
    };
    Path::new(target)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == PAYLOAD_EXT || e == META_EXT)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);
    if let Err(e) = fs::write(&tmp_path, bytes).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e).with_context(|| format!("Failed to write {}", tmp_path.display()));
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e).with_context(|| format!("Failed to move cache file to {}", path.display()));
    }
    Ok(())
}
