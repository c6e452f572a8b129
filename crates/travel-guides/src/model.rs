use serde::{Deserialize, Serialize};

/// Catalog metadata for one destination guide, resolved from front-matter
/// with per-field fallbacks (see `frontmatter`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideMeta {
    /// Display name of the destination, e.g. "杭州"
    pub city: String,
    /// Guide title, e.g. "杭州三日游攻略"
    pub title: String,
    /// Trip length in days
    pub days: u32,
    /// Nights spent, usually `days - 1`
    pub nights: u32,
    /// Headline theme, e.g. "古镇水乡"
    pub theme: String,
    /// Coarse region label, e.g. "华东"
    pub region: String,
    /// Free-form tags used by filtering and search
    pub tags: Vec<String>,
    /// Estimated budget in yuan, when the author provided one
    pub budget: Option<u32>,
    /// Recommended season, when the author provided one
    pub season: Option<String>,
    /// Cover image path or URL
    pub cover: String,
    /// Editorial rating, defaults to 4.5
    pub rating: f32,
}

/// One destination guide: slug, resolved metadata and the markdown body
/// (front-matter stripped). Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub slug: String,
    pub meta: GuideMeta,
    pub content: String,
}

/// Activity classification for a timeline entry. Derived from row text by
/// the itinerary parser, never authored directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Attraction,
    Meal,
    Transport,
    Hotel,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Attraction => "attraction",
            ActivityKind::Meal => "meal",
            ActivityKind::Transport => "transport",
            ActivityKind::Hotel => "hotel",
        }
    }
}

/// One time-stamped entry in a day's timeline. Created once per parsed
/// table row, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    /// Free-form time label, e.g. "09:00" or "下午"
    pub time: String,
    pub kind: ActivityKind,
    pub title: String,
    /// Mirrors the tip column when present
    pub description: Option<String>,
    /// The parser never populates this; markers come from the location
    /// catalog keyed by exact place name, with no automatic linkage.
    pub location: Option<String>,
    pub tips: Option<Vec<String>>,
}

/// One recognized "Day N" section, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub date: Option<String>,
    pub theme: String,
    /// Always non-empty; a day with no parsed rows is dropped entirely.
    pub items: Vec<ItineraryItem>,
}

/// Marker classification used by the map collaborator. Distinct from
/// `ActivityKind`: the map speaks "restaurant", the timeline "meal".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    Attraction,
    Restaurant,
    Hotel,
    Transport,
}

impl PlaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceKind::Attraction => "attraction",
            PlaceKind::Restaurant => "restaurant",
            PlaceKind::Hotel => "hotel",
            PlaceKind::Transport => "transport",
        }
    }
}

/// A named coordinate fed to the map collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub kind: PlaceKind,
}

/// Day-count buckets offered by the catalog filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    OneToTwo,
    Three,
    FourToFive,
    FivePlus,
}

impl DayBucket {
    /// Parse the filter-bar value. Unknown values mean "no constraint",
    /// so this returns `None` rather than an error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1-2" => Some(DayBucket::OneToTwo),
            "3" => Some(DayBucket::Three),
            "4-5" => Some(DayBucket::FourToFive),
            "5+" => Some(DayBucket::FivePlus),
            _ => None,
        }
    }

    pub fn contains(self, days: u32) -> bool {
        match self {
            DayBucket::OneToTwo => (1..=2).contains(&days),
            DayBucket::Three => days == 3,
            DayBucket::FourToFive => (4..=5).contains(&days),
            DayBucket::FivePlus => days >= 5,
        }
    }
}

/// Catalog filter options. All fields optional; an empty filter matches
/// every guide.
#[derive(Debug, Clone, Default)]
pub struct GuideFilter {
    pub search: Option<String>,
    pub region: Option<String>,
    pub days: Option<DayBucket>,
    pub theme: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_buckets() {
        assert!(DayBucket::OneToTwo.contains(1));
        assert!(DayBucket::OneToTwo.contains(2));
        assert!(!DayBucket::OneToTwo.contains(3));
        assert!(DayBucket::Three.contains(3));
        assert!(!DayBucket::Three.contains(4));
        assert!(DayBucket::FourToFive.contains(4));
        assert!(DayBucket::FourToFive.contains(5));
        assert!(!DayBucket::FourToFive.contains(6));
        // the buckets deliberately overlap at 5, matching the filter bar
        assert!(DayBucket::FivePlus.contains(5));
        assert!(DayBucket::FivePlus.contains(9));
    }

    #[test]
    fn unknown_bucket_is_no_constraint() {
        assert_eq!(DayBucket::parse("7"), None);
        assert_eq!(DayBucket::parse(""), None);
        assert_eq!(DayBucket::parse("4-5"), Some(DayBucket::FourToFive));
    }

    #[test]
    fn kind_serialization_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActivityKind::Meal).unwrap(),
            "\"meal\""
        );
        assert_eq!(
            serde_json::to_string(&PlaceKind::Restaurant).unwrap(),
            "\"restaurant\""
        );
    }
}
