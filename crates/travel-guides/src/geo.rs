/// Location catalog for the map collaborator.
///
/// Backed by one JSON file mapping city slugs to named places:
/// `{ "hangzhou": { "西湖": { "lat": 30.24, "lng": 120.15, "type": "attraction" } } }`
/// The map consumes `{name, lat, lng, type}` tuples keyed by exact place
/// name; an unknown city yields an empty list, never an error.
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::model::{Place, PlaceKind};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Deserialize)]
struct PlaceRecord {
    lat: f64,
    lng: f64,
    #[serde(rename = "type")]
    kind: PlaceKind,
}

pub struct LocationIndex {
    cities: HashMap<String, BTreeMap<String, PlaceRecord>>,
}

impl LocationIndex {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read {}: {e}", path.display())))?;
        let cities = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("invalid locations file {}: {e}", path.display()))
        })?;
        Ok(Self { cities })
    }

    /// An index with no cities; every lookup returns empty.
    pub fn empty() -> Self {
        Self {
            cities: HashMap::new(),
        }
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// All places of a city, name-ordered for stable output.
    pub fn city_places(&self, slug: &str) -> Vec<Place> {
        let Some(places) = self.cities.get(slug) else {
            return Vec::new();
        };
        places
            .iter()
            .map(|(name, record)| Place {
                name: name.clone(),
                lat: record.lat,
                lng: record.lng,
                kind: record.kind,
            })
            .collect()
    }

    /// City center as the coordinate mean of its places.
    pub fn city_center(&self, slug: &str) -> Option<(f64, f64)> {
        let places = self.cities.get(slug)?;
        if places.is_empty() {
            return None;
        }
        let n = places.len() as f64;
        let (lat_sum, lng_sum) = places
            .values()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        Some((lat_sum / n, lng_sum / n))
    }

    /// Total length of the marker-to-marker polyline the map draws, in
    /// kilometers. `None` with fewer than two places.
    pub fn route_length_km(&self, slug: &str) -> Option<f64> {
        let places = self.city_places(slug);
        if places.len() < 2 {
            return None;
        }
        let total: f64 = places
            .windows(2)
            .map(|pair| haversine_km(pair[0].lat, pair[0].lng, pair[1].lat, pair[1].lng))
            .sum();
        Some((total * 10.0).round() / 10.0)
    }
}

/// Haversine great-circle distance in kilometers, rounded to one decimal.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "hangzhou": {
            "西湖": { "lat": 30.2420, "lng": 120.1536, "type": "attraction" },
            "楼外楼": { "lat": 30.2531, "lng": 120.1430, "type": "restaurant" },
            "杭州东站": { "lat": 30.2906, "lng": 120.2130, "type": "transport" }
        },
        "wuzhen": {}
    }"#;

    fn index() -> LocationIndex {
        LocationIndex {
            cities: serde_json::from_str(SAMPLE).unwrap(),
        }
    }

    #[test]
    fn city_places_are_name_ordered() {
        let idx = index();
        let places = idx.city_places("hangzhou");
        assert_eq!(places.len(), 3);
        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn unknown_city_is_empty_not_an_error() {
        let idx = index();
        assert!(idx.city_places("lhasa").is_empty());
        assert_eq!(idx.city_center("lhasa"), None);
    }

    #[test]
    fn route_needs_at_least_two_places() {
        let idx = index();
        assert!(idx.route_length_km("hangzhou").unwrap() > 0.0);
        assert_eq!(idx.route_length_km("wuzhen"), None);
        assert_eq!(idx.route_length_km("lhasa"), None);
    }

    #[test]
    fn center_is_coordinate_mean() {
        let idx = index();
        let (lat, lng) = idx.city_center("hangzhou").unwrap();
        assert!((lat - (30.2420 + 30.2531 + 30.2906) / 3.0).abs() < 1e-9);
        assert!((lng - (120.1536 + 120.1430 + 120.2130) / 3.0).abs() < 1e-9);
        // a city present with zero places has no center
        assert_eq!(idx.city_center("wuzhen"), None);
    }

    #[test]
    fn haversine_known_distance() {
        // Hangzhou East Station to West Lake is roughly 7.9 km
        let d = haversine_km(30.2906, 120.2130, 30.2420, 120.1536);
        assert!(d > 7.0 && d < 9.0, "got {d}");
        // one-decimal rounding
        assert_eq!((d * 10.0).round() / 10.0, d);
        assert_eq!(haversine_km(30.0, 120.0, 30.0, 120.0), 0.0);
    }
}
