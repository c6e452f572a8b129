/// MCP server implementation for the travel guide catalog.
///
/// Exposes seven tools:
/// - `list_guides`: Filtered catalog listing (region / days / theme)
/// - `search_guides`: Free-text search over the catalog
/// - `get_guide`: Full guide document by destination slug
/// - `get_itinerary`: Parsed day-by-day timeline for a destination
/// - `get_city_locations`: Map markers and center for a destination
/// - `get_cover_image`: Resolved cover image with gradient fallback
/// - `reload_guides`: Re-scan the content directory when it changed
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::GuideCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::AppError;
use crate::geo::LocationIndex;
use crate::itinerary;
use crate::model::{DayBucket, DayPlan, Guide, GuideFilter};
use crate::photos::PhotoService;
use crate::reload::ReloadService;
use travel_common::api::{
    CityLocationsResponse, Coordinate, CoverImageResponse, GetCityLocationsParams,
    GetCoverImageParams, GetGuideParams, GetItineraryParams, GuideDetailResponse,
    GuideListResponse, GuideSummary, ItineraryResponse, ListGuidesParams, PlaceMarker,
    ReloadGuidesResponse, SearchGuidesParams, TimelineDay, TimelineEntry,
};

// --- MCP Server ---

/// Shared application state, protected by RwLock for safe concurrent reads
/// and exclusive writes during re-indexing.
pub struct AppState {
    pub catalog: Catalog,
    pub locations: LocationIndex,
}

#[derive(Clone)]
pub struct TravelGuidesServer {
    state: Arc<RwLock<AppState>>,
    photos: Arc<PhotoService>,
    reload_service: Arc<ReloadService>,
    cache: Arc<GuideCache>,
    tool_router: ToolRouter<TravelGuidesServer>,
}

impl TravelGuidesServer {
    pub fn new(
        catalog: Catalog,
        locations: LocationIndex,
        photos: Arc<PhotoService>,
        cache: Arc<GuideCache>,
        config: Config,
    ) -> Self {
        let reload_service = Arc::new(ReloadService::new(config, Arc::clone(&cache)));
        let state = Arc::new(RwLock::new(AppState { catalog, locations }));

        Self {
            state,
            photos,
            reload_service,
            cache,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TravelGuidesServer {
    #[tool(description = "List travel guides, optionally filtered by region (e.g. '华东'), day-count bucket ('1-2', '3', '4-5', '5+') and theme keyword (e.g. '古镇'). Sorted by rating, best first.")]
    async fn list_guides(
        &self,
        Parameters(params): Parameters<ListGuidesParams>,
    ) -> Result<Json<GuideListResponse>, String> {
        let filter = GuideFilter {
            search: None,
            region: params.region.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            // an unrecognized bucket value constrains nothing
            days: params.days.as_deref().and_then(|d| DayBucket::parse(d.trim())),
            theme: params.theme.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        };

        let state = self.state.read().await;
        let guides: Vec<GuideSummary> = state
            .catalog
            .filter(&filter)
            .into_iter()
            .map(to_summary)
            .collect();

        Ok(Json(GuideListResponse {
            total: guides.len(),
            guides,
        }))
    }

    #[tool(description = "Search travel guides by free text matched against title, city, theme and tags. Returns ranked summaries, best rating first.")]
    async fn search_guides(
        &self,
        Parameters(params): Parameters<SearchGuidesParams>,
    ) -> Result<Json<GuideListResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        if let Some(cached) = self.cache.get_search_results(&query).await {
            info!(query, "search cache hit");
            return Ok(Json(GuideListResponse {
                total: cached.len(),
                guides: cached,
            }));
        }

        let state = self.state.read().await;
        let guides: Vec<GuideSummary> = state.catalog.search(&query).into_iter().map(to_summary).collect();
        drop(state);

        self.cache.set_search_results(&query, &guides).await;

        Ok(Json(GuideListResponse {
            total: guides.len(),
            guides,
        }))
    }

    #[tool(description = "Get the full guide document for a destination slug (e.g. 'hangzhou'): resolved metadata plus the markdown body.")]
    async fn get_guide(
        &self,
        Parameters(params): Parameters<GetGuideParams>,
    ) -> Result<Json<GuideDetailResponse>, String> {
        let slug = params.slug.trim().to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let state = self.state.read().await;
        let guide = state
            .catalog
            .find(&slug)
            .ok_or_else(|| AppError::NotFound(slug.clone()).to_string())?;

        Ok(Json(to_detail(guide)))
    }

    #[tool(description = "Get the parsed day-by-day itinerary timeline for a destination slug. Always returns at least placeholder days for a known destination.")]
    async fn get_itinerary(
        &self,
        Parameters(params): Parameters<GetItineraryParams>,
    ) -> Result<Json<ItineraryResponse>, String> {
        let slug = params.slug.trim().to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        // Check cache first
        if let Some(cached) = self.cache.get_itinerary(&slug).await {
            return Ok(Json(to_itinerary_response(slug, &cached)));
        }

        let state = self.state.read().await;
        let guide = state
            .catalog
            .find(&slug)
            .ok_or_else(|| AppError::NotFound(slug.clone()).to_string())?;

        let days = itinerary::parse_itinerary(&guide.content, guide.meta.days);
        let canonical_slug = guide.slug.clone();
        drop(state);

        self.cache.set_itinerary(&canonical_slug, &days).await;

        Ok(Json(to_itinerary_response(canonical_slug, &days)))
    }

    #[tool(description = "Get map markers ({name, lat, lng, type}) and the mean center coordinate for a destination slug. Unknown destinations return an empty marker list.")]
    async fn get_city_locations(
        &self,
        Parameters(params): Parameters<GetCityLocationsParams>,
    ) -> Result<Json<CityLocationsResponse>, String> {
        let slug = params.slug.trim().to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let state = self.state.read().await;
        let places: Vec<PlaceMarker> = state
            .locations
            .city_places(&slug)
            .into_iter()
            .map(|p| PlaceMarker {
                name: p.name,
                lat: p.lat,
                lng: p.lng,
                kind: p.kind.as_str().to_string(),
            })
            .collect();
        let center = state
            .locations
            .city_center(&slug)
            .map(|(lat, lng)| Coordinate { lat, lng });
        let route_km = state.locations.route_length_km(&slug);

        Ok(Json(CityLocationsResponse {
            slug,
            center,
            route_km,
            places,
        }))
    }

    #[tool(description = "Resolve a cover image for a destination slug: cached or provider-searched URL, else a site-local path, plus a deterministic gradient class for final fallback.")]
    async fn get_cover_image(
        &self,
        Parameters(params): Parameters<GetCoverImageParams>,
    ) -> Result<Json<CoverImageResponse>, String> {
        let slug = params.slug.trim().to_string();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let state = self.state.read().await;
        let guide = state
            .catalog
            .find(&slug)
            .ok_or_else(|| AppError::NotFound(slug.clone()).to_string())?;
        let city = guide.meta.city.clone();
        let canonical_slug = guide.slug.clone();
        drop(state);

        let resolved = self.photos.resolve_cover(&city, &canonical_slug).await;

        Ok(Json(CoverImageResponse {
            url: resolved.url,
            source: resolved.source.as_str().to_string(),
            gradient: resolved.gradient,
        }))
    }

    #[tool(description = "Re-scan the guides content directory. Re-indexes and invalidates caches only when the content fingerprint changed.")]
    async fn reload_guides(&self) -> Result<Json<ReloadGuidesResponse>, String> {
        info!("reload_guides tool invoked");

        let (outcome, new_catalog) = self
            .reload_service
            .reload()
            .await
            .map_err(|e| format!("reload failed: {e}"))?;

        if let Some(catalog) = new_catalog {
            let guide_count = catalog.len();
            let mut state = self.state.write().await;
            state.catalog = catalog;
            info!(guide_count, "in-memory catalog updated");
        }

        let guide_count = if outcome.reloaded {
            outcome.guide_count
        } else {
            let state = self.state.read().await;
            state.catalog.len()
        };

        Ok(Json(ReloadGuidesResponse {
            reloaded: outcome.reloaded,
            fingerprint: outcome.fingerprint,
            guide_count,
        }))
    }
}

fn to_summary(guide: &Guide) -> GuideSummary {
    GuideSummary {
        slug: guide.slug.clone(),
        city: guide.meta.city.clone(),
        title: guide.meta.title.clone(),
        days: guide.meta.days,
        nights: guide.meta.nights,
        theme: guide.meta.theme.clone(),
        region: guide.meta.region.clone(),
        tags: guide.meta.tags.clone(),
        rating: guide.meta.rating,
        cover: guide.meta.cover.clone(),
    }
}

fn to_detail(guide: &Guide) -> GuideDetailResponse {
    GuideDetailResponse {
        slug: guide.slug.clone(),
        city: guide.meta.city.clone(),
        title: guide.meta.title.clone(),
        days: guide.meta.days,
        nights: guide.meta.nights,
        theme: guide.meta.theme.clone(),
        region: guide.meta.region.clone(),
        tags: guide.meta.tags.clone(),
        budget: guide.meta.budget,
        season: guide.meta.season.clone(),
        cover: guide.meta.cover.clone(),
        rating: guide.meta.rating,
        content: guide.content.clone(),
    }
}

fn to_itinerary_response(slug: String, days: &[DayPlan]) -> ItineraryResponse {
    ItineraryResponse {
        slug,
        days: days
            .iter()
            .map(|day| TimelineDay {
                day: day.day,
                date: day.date.clone(),
                theme: day.theme.clone(),
                items: day
                    .items
                    .iter()
                    .map(|item| TimelineEntry {
                        time: item.time.clone(),
                        kind: item.kind.as_str().to_string(),
                        title: item.title.clone(),
                        description: item.description.clone(),
                        location: item.location.clone(),
                        tips: item.tips.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[tool_handler]
impl ServerHandler for TravelGuidesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "travel-guides".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Travel guide catalog MCP server. Use list_guides/search_guides to \
                 browse destinations, get_guide for a full document, get_itinerary \
                 for the parsed day-by-day timeline, get_city_locations for map \
                 markers, get_cover_image for a cover photo with fallback, and \
                 reload_guides to pick up content changes."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TravelGuidesServer;

    #[test]
    fn tools_publish_output_schemas() {
        let tools = TravelGuidesServer::tool_router().list_all();
        for name in [
            "list_guides",
            "search_guides",
            "get_guide",
            "get_itinerary",
            "get_city_locations",
            "get_cover_image",
            "reload_guides",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }
}
