use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListGuidesParams {
    /// Region filter, e.g. "华东". Omit for all regions.
    pub region: Option<String>,
    /// Day-count bucket: "1-2", "3", "4-5" or "5+". Omit for all lengths.
    pub days: Option<String>,
    /// Theme keyword matched against the guide theme and tags, e.g. "古镇".
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchGuidesParams {
    /// Free-text query matched against title, city, theme and tags.
    pub query: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetGuideParams {
    /// Destination slug such as "hangzhou" or "wuzhen".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetItineraryParams {
    /// Destination slug such as "hangzhou" or "wuzhen".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCityLocationsParams {
    /// Destination slug such as "hangzhou" or "wuzhen".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCoverImageParams {
    /// Destination slug such as "hangzhou" or "wuzhen".
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GuideSummary {
    pub slug: String,
    pub city: String,
    pub title: String,
    pub days: u32,
    pub nights: u32,
    pub theme: String,
    pub region: String,
    pub tags: Vec<String>,
    pub rating: f32,
    pub cover: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GuideListResponse {
    pub total: usize,
    pub guides: Vec<GuideSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GuideDetailResponse {
    pub slug: String,
    pub city: String,
    pub title: String,
    pub days: u32,
    pub nights: u32,
    pub theme: String,
    pub region: String,
    pub tags: Vec<String>,
    pub budget: Option<u32>,
    pub season: Option<String>,
    pub cover: String,
    pub rating: f32,
    /// Markdown body with the front-matter stripped.
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    pub time: String,
    /// One of "attraction", "meal", "transport", "hotel".
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    /// Never populated by the parser; reserved for a future map linkage.
    pub location: Option<String>,
    pub tips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimelineDay {
    pub day: u32,
    pub date: Option<String>,
    pub theme: String,
    pub items: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryResponse {
    pub slug: String,
    pub days: Vec<TimelineDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaceMarker {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// One of "attraction", "restaurant", "hotel", "transport".
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CityLocationsResponse {
    pub slug: String,
    /// Mean coordinate of all markers; absent when the city has none.
    pub center: Option<Coordinate>,
    /// Total length of the marker-to-marker route, absent under two markers.
    pub route_km: Option<f64>,
    pub places: Vec<PlaceMarker>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CoverImageResponse {
    /// Resolved image URL or site-local path.
    pub url: String,
    /// Where the URL came from: "cache", "unsplash" or "local".
    pub source: String,
    /// Deterministic gradient class for rendering when the URL 404s.
    pub gradient: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadGuidesResponse {
    pub reloaded: bool,
    pub fingerprint: String,
    pub guide_count: usize,
}
