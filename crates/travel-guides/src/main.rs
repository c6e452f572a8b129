mod cache;
mod catalog;
mod config;
mod error;
mod frontmatter;
mod geo;
mod itinerary;
mod model;
mod photos;
mod reload;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cache::GuideCache;
use catalog::Catalog;
use config::Config;
use geo::LocationIndex;
use photos::PhotoService;
use reload::ReloadService;
use server::TravelGuidesServer;
use travel_common::unsplash::{UnsplashClient, UnsplashClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr (stdout is reserved for MCP JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting travel-guides MCP server");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        guides_dir = %config.guides_dir,
        locations = config.locations_file.is_some(),
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    // 2. Connect to Redis (optional — graceful degradation if unavailable)
    let redis_cache = travel_common::redis::RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else {
        info!("redis unavailable, running without cache");
    }
    let cache = Arc::new(GuideCache::new(redis_cache));

    // 3. Photo provider client (optional — local fallback without a key)
    let unsplash_config = UnsplashClientConfig::from_env();
    let unsplash = UnsplashClient::new(unsplash_config)
        .map_err(|e| error::AppError::Common(e.into()))?;
    if unsplash.is_configured() {
        info!("photo search configured");
    } else {
        info!("photo search not configured, covers fall back to local images");
    }
    let photos = Arc::new(PhotoService::new(unsplash, Arc::clone(&cache)));

    // 4. Index the guides directory, re-using cached state when fresh
    let reload_service = ReloadService::new(config.clone(), Arc::clone(&cache));
    let catalog = if reload_service.needs_reload().await? {
        info!("indexing guides (first run or content changed)");
        let (catalog, fingerprint) = reload_service.full_reindex().await?;
        info!(
            fingerprint = %fingerprint,
            guide_count = catalog.len(),
            "indexing complete"
        );
        catalog
    } else {
        info!("guides up to date, loading from source");
        let catalog = Catalog::load(&config.guides_dir_path())?;
        info!(guide_count = catalog.len(), "loaded guides from source");
        catalog
    };
    if catalog.is_empty() {
        tracing::warn!(guides_dir = %config.guides_dir, "no guides found, catalog is empty");
    }

    // 5. Load the location catalog for the map collaborator
    let locations = match &config.locations_file {
        Some(path) => {
            let index = LocationIndex::load(std::path::Path::new(path))?;
            info!(city_count = index.city_count(), "locations loaded");
            index
        }
        None => {
            info!("no locations file configured, map data disabled");
            LocationIndex::empty()
        }
    };

    // 6. Warm the cover cache in the background
    if photos.is_configured() {
        let targets: Vec<(String, String)> = catalog
            .guides()
            .iter()
            .map(|g| (g.meta.city.clone(), g.slug.clone()))
            .collect();
        let warm = Arc::clone(&photos);
        tokio::spawn(async move {
            warm.prefetch_covers(&targets).await;
            info!(count = targets.len(), "cover cache warmed");
        });
    }

    // 7. Build MCP server and serve on stdio
    let server = TravelGuidesServer::new(catalog, locations, photos, cache, config);

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
