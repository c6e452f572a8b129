/// Cover-photo resolution with explicit caching and layered fallback.
///
/// Resolution order: Redis cache (24h TTL) → provider search over a fixed
/// list of query strategies → site-local image path. A deterministic
/// gradient class rides along with every answer so the renderer has a final
/// fallback when the local image is missing too.
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::cache::GuideCache;
use travel_common::unsplash::{UnsplashClient, UnsplashClientError};

/// Provider free tier is rate-limited; prefetch in small bursts.
const PREFETCH_BATCH_SIZE: usize = 5;
const PREFETCH_PAUSE: Duration = Duration::from_secs(1);

/// Chinese city name → English search term. Cities missing here are
/// searched under their Chinese name, which the provider handles worse.
const CITY_ENGLISH_NAMES: &[(&str, &str)] = &[
    ("北京", "Beijing"),
    ("上海", "Shanghai"),
    ("杭州", "Hangzhou"),
    ("苏州", "Suzhou"),
    ("成都", "Chengdu"),
    ("西安", "Xian"),
    ("重庆", "Chongqing"),
    ("厦门", "Xiamen"),
    ("青岛", "Qingdao"),
    ("南京", "Nanjing"),
    ("三亚", "Sanya"),
    ("桂林", "Guilin"),
    ("张家界", "Zhangjiajie"),
    ("黄山", "Huangshan"),
    ("乌镇", "Wuzhen"),
    ("周庄", "Zhouzhuang"),
    ("西塘", "Xitang"),
    ("云南", "Yunnan"),
    ("无锡", "Wuxi"),
    ("扬州", "Yangzhou"),
    ("同里", "Tongli"),
    ("南浔", "Nanxun"),
    ("锦溪", "Jinxi"),
    ("安昌", "Anchang"),
    ("朱家角", "Zhujiajiao"),
    ("莫干山", "Moganshan"),
    ("千岛湖", "Qiandao Lake"),
    ("安吉", "Anji"),
];

const GRADIENTS: &[&str] = &[
    "from-blue-400 to-purple-500",
    "from-green-400 to-blue-500",
    "from-purple-400 to-pink-500",
    "from-yellow-400 to-orange-500",
    "from-red-400 to-pink-500",
    "from-indigo-400 to-purple-500",
    "from-teal-400 to-green-500",
    "from-orange-400 to-red-500",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSource {
    Cache,
    Provider,
    Local,
}

impl CoverSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverSource::Cache => "cache",
            CoverSource::Provider => "unsplash",
            CoverSource::Local => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedCover {
    pub url: String,
    pub source: CoverSource,
    pub gradient: String,
}

pub struct PhotoService {
    client: UnsplashClient,
    cache: Arc<GuideCache>,
}

impl PhotoService {
    pub fn new(client: UnsplashClient, cache: Arc<GuideCache>) -> Self {
        Self { client, cache }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Resolve a cover image for one destination. Never fails: provider
    /// errors degrade to the local image path.
    pub async fn resolve_cover(&self, city: &str, slug: &str) -> ResolvedCover {
        let gradient = gradient_class(slug).to_string();

        if let Some(url) = self.cache.get_cover(city).await {
            return ResolvedCover {
                url,
                source: CoverSource::Cache,
                gradient,
            };
        }

        if self.client.is_configured() {
            for query in search_queries(city) {
                match self.client.search_photo(&query).await {
                    Ok(Some(hit)) => {
                        info!(city, query, "cover image found");
                        self.cache.set_cover(city, &hit.urls.regular).await;
                        return ResolvedCover {
                            url: hit.urls.regular,
                            source: CoverSource::Provider,
                            gradient,
                        };
                    }
                    Ok(None) => continue,
                    Err(UnsplashClientError::RateLimited) => {
                        warn!(city, "photo provider rate limit reached, stopping search");
                        break;
                    }
                    Err(e) => {
                        warn!(city, query, error = %e, "photo query failed, trying next strategy");
                        continue;
                    }
                }
            }
            warn!(city, "no provider image found, using local fallback");
        }

        ResolvedCover {
            url: format!("/images/{slug}-guide.png"),
            source: CoverSource::Local,
            gradient,
        }
    }

    /// Warm the cover cache for many destinations, in small bursts with a
    /// pause between them to stay under the provider rate limit.
    pub async fn prefetch_covers(&self, cities: &[(String, String)]) {
        for (i, chunk) in cities.chunks(PREFETCH_BATCH_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(PREFETCH_PAUSE).await;
            }
            let lookups = chunk
                .iter()
                .map(|(city, slug)| self.resolve_cover(city, slug));
            join_all(lookups).await;
        }
    }
}

/// Query strategies tried in order; first hit wins.
fn search_queries(city: &str) -> Vec<String> {
    let english = english_name(city).unwrap_or(city);
    vec![
        format!("{english} China landmark"),
        format!("{english} China travel"),
        format!("{city} China scenic"),
        format!("{english} cityscape"),
        format!("{english} architecture"),
        format!("China {english}"),
    ]
}

fn english_name(city: &str) -> Option<&'static str> {
    CITY_ENGLISH_NAMES
        .iter()
        .find(|(zh, _)| *zh == city)
        .map(|(_, en)| *en)
}

/// Deterministic gradient for a slug, so a destination keeps the same
/// fallback look across pages and reloads.
pub fn gradient_class(slug: &str) -> &'static str {
    let hash: u32 = slug.chars().map(|c| c as u32).fold(0, u32::wrapping_add);
    GRADIENTS[(hash as usize) % GRADIENTS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_is_deterministic_per_slug() {
        assert_eq!(gradient_class("hangzhou"), gradient_class("hangzhou"));
        let all_known = ["hangzhou", "beijing", "wuzhen", "suzhou"]
            .iter()
            .map(|s| gradient_class(s))
            .all(|g| GRADIENTS.contains(&g));
        assert!(all_known);
    }

    #[test]
    fn query_strategies_use_english_name_when_known() {
        let queries = search_queries("杭州");
        assert_eq!(queries.len(), 6);
        assert_eq!(queries[0], "Hangzhou China landmark");
        // the scenic strategy keeps the Chinese name
        assert_eq!(queries[2], "杭州 China scenic");
    }

    #[test]
    fn unknown_city_falls_back_to_its_own_name() {
        let queries = search_queries("拉萨");
        assert_eq!(queries[0], "拉萨 China landmark");
        assert_eq!(queries[5], "China 拉萨");
    }
}
