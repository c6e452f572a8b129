/// Redis caching layer for the travel guides server.
///
/// Every read returns `Option<T>`; on a miss or any Redis failure the
/// caller recomputes from source. The server is fully functional without
/// Redis.
///
/// Key schema (namespaced to avoid collisions):
/// - `trv:v1:itinerary:{slug}` — JSON `Vec<DayPlan>` (no TTL, invalidated on reload)
/// - `trv:v1:cover:{city}` — resolved cover URL (TTL: 24h)
/// - `trv:v1:search:{sha256(query)}` — JSON `Vec<GuideSummary>` (TTL: 1h)
/// - `trv:v1:fingerprint` — content digest of the guides directory (no TTL)
use sha2::{Digest, Sha256};

use crate::model::DayPlan;
use travel_common::api::GuideSummary;
use travel_common::redis::RedisCache;

const KEY_PREFIX: &str = "trv:v1:";
const SEARCH_TTL_SECS: u64 = 3600;
const COVER_TTL_SECS: u64 = 24 * 3600;

pub struct GuideCache {
    redis: RedisCache,
}

impl GuideCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    // --- Parsed itineraries ---

    pub async fn get_itinerary(&self, slug: &str) -> Option<Vec<DayPlan>> {
        self.redis
            .get_json(&format!("{KEY_PREFIX}itinerary:{slug}"))
            .await
    }

    pub async fn set_itinerary(&self, slug: &str, days: &[DayPlan]) {
        self.redis
            .set_json(&format!("{KEY_PREFIX}itinerary:{slug}"), &days, None)
            .await;
    }

    // --- Cover images ---

    pub async fn get_cover(&self, city: &str) -> Option<String> {
        self.redis.get(&format!("{KEY_PREFIX}cover:{city}")).await
    }

    pub async fn set_cover(&self, city: &str, url: &str) {
        self.redis
            .set_with_ttl(&format!("{KEY_PREFIX}cover:{city}"), url, COVER_TTL_SECS)
            .await;
    }

    // --- Search results ---

    pub async fn get_search_results(&self, query: &str) -> Option<Vec<GuideSummary>> {
        self.redis.get_json(&search_key(query)).await
    }

    pub async fn set_search_results(&self, query: &str, results: &[GuideSummary]) {
        self.redis
            .set_json(&search_key(query), &results, Some(SEARCH_TTL_SECS))
            .await;
    }

    // --- Content fingerprint ---

    pub async fn get_fingerprint(&self) -> Option<String> {
        self.redis.get(&format!("{KEY_PREFIX}fingerprint")).await
    }

    pub async fn set_fingerprint(&self, fingerprint: &str) {
        self.redis
            .set(&format!("{KEY_PREFIX}fingerprint"), fingerprint)
            .await;
    }

    // --- Invalidation ---

    /// Delete all cached data. Used when re-indexing after a content change.
    pub async fn invalidate_all(&self) {
        self.redis.delete_by_prefix(KEY_PREFIX).await;
    }
}

/// Deterministic cache key for a search query using SHA-256.
fn search_key(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}search:{hash:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_keys_are_stable_and_distinct() {
        assert_eq!(search_key("西湖"), search_key("西湖"));
        assert_ne!(search_key("西湖"), search_key("古镇"));
        assert!(search_key("西湖").starts_with("trv:v1:search:"));
    }
}
