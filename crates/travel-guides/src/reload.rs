/// Reload service for the guides content directory.
///
/// Freshness is a SHA-256 fingerprint over the sorted relative paths and
/// bytes of every guide file; a changed fingerprint triggers a re-scan,
/// cache invalidation and itinerary re-caching. Triggered at startup and
/// on demand via the `reload_guides` tool.
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::cache::GuideCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::AppError;
use crate::itinerary;

/// Result of a reload operation.
pub struct ReloadOutcome {
    /// Whether a re-scan actually occurred (false if already up to date).
    pub reloaded: bool,
    /// The current content fingerprint.
    pub fingerprint: String,
    /// Number of guides after the operation.
    pub guide_count: usize,
}

pub struct ReloadService {
    config: Config,
    cache: Arc<GuideCache>,
}

impl ReloadService {
    pub fn new(config: Config, cache: Arc<GuideCache>) -> Self {
        Self { config, cache }
    }

    /// Compute the content fingerprint of the guides directory.
    ///
    /// Hashes the sorted relative path and bytes of every markdown file.
    /// Unreadable files are skipped with a warning, matching the catalog
    /// scan, so fingerprint and catalog always agree on what exists.
    pub fn fingerprint(&self) -> Result<String, AppError> {
        let dir = self.config.guides_dir_path();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| AppError::Config(format!("failed to read {}: {e}", dir.display())))?;

        let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let city_dir = entry.path();
            if !city_dir.is_dir() {
                continue;
            }
            let Some(slug) = city_dir.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };
            let Ok(city_entries) = std::fs::read_dir(&city_dir) else {
                continue;
            };
            for file in city_entries.filter_map(|e| e.ok()) {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                files.push((format!("{slug}/{name}"), path));
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (rel, path) in files {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable guide file left out of fingerprint");
                    continue;
                }
            };
            hasher.update(rel.as_bytes());
            hasher.update([0u8]);
            hasher.update(&bytes);
            hasher.update([0u8]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Check whether the on-disk content differs from the indexed state.
    pub async fn needs_reload(&self) -> Result<bool, AppError> {
        let current = self.fingerprint()?;
        Ok(self.cache.get_fingerprint().await.as_deref() != Some(current.as_str()))
    }

    /// Re-scan the guides directory, invalidate caches and re-cache parsed
    /// itineraries. Returns the fresh catalog and its fingerprint.
    pub async fn full_reindex(&self) -> Result<(Catalog, String), AppError> {
        let fingerprint = self.fingerprint()?;
        info!(fingerprint = %fingerprint, "starting guide re-index");

        let catalog = Catalog::load(&self.config.guides_dir_path())?;
        info!(guide_count = catalog.len(), "guides scanned");

        self.cache.invalidate_all().await;
        for guide in catalog.guides() {
            let days = itinerary::parse_itinerary(&guide.content, guide.meta.days);
            self.cache.set_itinerary(&guide.slug, &days).await;
        }
        self.cache.set_fingerprint(&fingerprint).await;

        info!(
            fingerprint = %fingerprint,
            guide_count = catalog.len(),
            "re-index complete"
        );
        Ok((catalog, fingerprint))
    }

    /// Run a full reload cycle: check freshness, re-index when stale.
    pub async fn reload(&self) -> Result<(ReloadOutcome, Option<Catalog>), AppError> {
        let fingerprint = self.fingerprint()?;

        if !self.needs_reload().await? {
            info!(fingerprint = %fingerprint, "guides up to date, skipping re-index");
            return Ok((
                ReloadOutcome {
                    reloaded: false,
                    fingerprint,
                    guide_count: 0, // caller should use the existing count
                },
                None,
            ));
        }

        let (catalog, fingerprint) = self.full_reindex().await?;
        let guide_count = catalog.len();
        Ok((
            ReloadOutcome {
                reloaded: true,
                fingerprint,
                guide_count,
            },
            Some(catalog),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_common::redis::RedisCache;

    fn service_for(dir: &std::path::Path) -> ReloadService {
        let config = Config {
            guides_dir: dir.to_string_lossy().to_string(),
            locations_file: None,
            redis_url: None,
        };
        ReloadService::new(config, Arc::new(GuideCache::new(RedisCache::new(None))))
    }

    #[test]
    fn fingerprint_tracks_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let city = dir.path().join("hangzhou");
        std::fs::create_dir(&city).unwrap();
        std::fs::write(city.join("guide.md"), "# 杭州3天游\n").unwrap();

        let service = service_for(dir.path());
        let first = service.fingerprint().unwrap();
        assert_eq!(first, service.fingerprint().unwrap());

        std::fs::write(city.join("guide.md"), "# 杭州4天游\n").unwrap();
        assert_ne!(first, service.fingerprint().unwrap());
    }

    #[test]
    fn fingerprint_ignores_non_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let city = dir.path().join("wuzhen");
        std::fs::create_dir(&city).unwrap();
        std::fs::write(city.join("guide.md"), "# 乌镇2天游\n").unwrap();

        let service = service_for(dir.path());
        let before = service.fingerprint().unwrap();
        std::fs::write(city.join("cover.png"), b"\x89PNG").unwrap();
        assert_eq!(before, service.fingerprint().unwrap());
    }

    #[tokio::test]
    async fn reload_without_cached_fingerprint_reindexes() {
        let dir = tempfile::tempdir().unwrap();
        let city = dir.path().join("suzhou");
        std::fs::create_dir(&city).unwrap();
        std::fs::write(
            city.join("guide.md"),
            "# 苏州2天游\n\n### Day 1\n| 09:00 | 拙政园 |\n",
        )
        .unwrap();

        let service = service_for(dir.path());
        // no Redis: the cached fingerprint is always absent, so a reload runs
        let (outcome, catalog) = service.reload().await.unwrap();
        assert!(outcome.reloaded);
        assert_eq!(outcome.guide_count, 1);
        assert!(!outcome.fingerprint.is_empty());
        assert_eq!(catalog.unwrap().len(), 1);
    }
}
