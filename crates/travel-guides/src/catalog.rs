/// In-memory catalog of destination guides.
///
/// Layout on disk: one subdirectory per destination slug, each holding at
/// least one markdown guide file; the first `.md` file (lexicographic) is
/// the guide document. Unreadable entries are skipped with a warning so a
/// single bad file never takes the catalog down.
use std::cmp::Ordering;
use std::path::Path;

use tracing::warn;

use crate::error::AppError;
use crate::frontmatter;
use crate::model::{Guide, GuideFilter};

pub struct Catalog {
    guides: Vec<Guide>,
}

impl Catalog {
    /// Scan the guides directory and build the catalog.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| AppError::Config(format!("failed to read {}: {e}", dir.display())))?;

        let mut slugs: Vec<String> = entries
            .filter_map(|entry| {
                let entry = entry
                    .inspect_err(|e| warn!(error = %e, "unreadable directory entry, skipping"))
                    .ok()?;
                let path = entry.path();
                if !path.is_dir() {
                    return None;
                }
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .collect();
        slugs.sort();

        let mut guides = Vec::new();
        for slug in slugs {
            match load_city_guide(dir, &slug) {
                Some(guide) => guides.push(guide),
                None => warn!(slug, "no readable guide file, skipping destination"),
            }
        }

        Ok(Self::from_guides(guides))
    }

    /// Build a catalog from already-parsed guides, sorted by rating descending.
    pub fn from_guides(mut guides: Vec<Guide>) -> Self {
        guides.sort_by(|a, b| {
            b.meta
                .rating
                .partial_cmp(&a.meta.rating)
                .unwrap_or(Ordering::Equal)
        });
        Self { guides }
    }

    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }

    /// Look up a guide by slug, case-insensitively.
    pub fn find(&self, slug: &str) -> Option<&Guide> {
        self.guides
            .iter()
            .find(|g| g.slug.eq_ignore_ascii_case(slug))
    }

    /// Apply catalog filters, preserving the rating-descending order.
    pub fn filter(&self, filter: &GuideFilter) -> Vec<&Guide> {
        self.guides
            .iter()
            .filter(|g| matches_filter(g, filter))
            .collect()
    }

    /// Free-text search over title, city, theme and tags.
    pub fn search(&self, query: &str) -> Vec<&Guide> {
        let filter = GuideFilter {
            search: Some(query.to_string()),
            ..GuideFilter::default()
        };
        self.filter(&filter)
    }
}

fn load_city_guide(dir: &Path, slug: &str) -> Option<Guide> {
    let city_dir = dir.join(slug);
    let entries = std::fs::read_dir(&city_dir)
        .inspect_err(|e| warn!(slug, error = %e, "failed to read destination directory"))
        .ok()?;

    let mut md_files: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("md"))
        .collect();
    md_files.sort();

    let path = md_files.into_iter().next()?;
    let raw = std::fs::read_to_string(&path)
        .inspect_err(|e| warn!(slug, error = %e, path = %path.display(), "failed to read guide file"))
        .ok()?;

    Some(frontmatter::parse_document(slug, &raw))
}

fn matches_filter(guide: &Guide, filter: &GuideFilter) -> bool {
    let meta = &guide.meta;

    if let Some(query) = filter.search.as_deref() {
        let q = query.to_lowercase();
        let hit = meta.title.to_lowercase().contains(&q)
            || meta.city.to_lowercase().contains(&q)
            || meta.theme.to_lowercase().contains(&q)
            || meta.tags.iter().any(|t| t.to_lowercase().contains(&q));
        if !hit {
            return false;
        }
    }

    if let Some(region) = filter.region.as_deref() {
        if meta.region != region {
            return false;
        }
    }

    if let Some(bucket) = filter.days {
        if !bucket.contains(meta.days) {
            return false;
        }
    }

    if let Some(theme) = filter.theme.as_deref() {
        let hit = meta.theme.contains(theme) || meta.tags.iter().any(|t| t.contains(theme));
        if !hit {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DayBucket;

    fn guide(slug: &str, rating: f32, days: u32, region: &str, tags: &[&str]) -> Guide {
        let raw = format!(
            "---\ncity: {slug}\ntitle: {slug}之旅\ndays: {days}\nregion: {region}\ntags: [{}]\nrating: {rating}\n---\n正文\n",
            tags.join(", ")
        );
        frontmatter::parse_document(slug, &raw)
    }

    fn sample_catalog() -> Catalog {
        Catalog::from_guides(vec![
            guide("hangzhou", 4.6, 3, "华东", &["西湖", "美食"]),
            guide("beijing", 4.9, 5, "华北", &["历史"]),
            guide("wuzhen", 4.2, 2, "华东", &["古镇"]),
        ])
    }

    #[test]
    fn sorted_by_rating_descending() {
        let catalog = sample_catalog();
        let slugs: Vec<&str> = catalog.guides().iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["beijing", "hangzhou", "wuzhen"]);
    }

    #[test]
    fn slug_lookup_is_case_insensitive() {
        let catalog = sample_catalog();
        assert!(catalog.find("Hangzhou").is_some());
        assert!(catalog.find("HANGZHOU").is_some());
        assert!(catalog.find("lhasa").is_none());
    }

    #[test]
    fn region_and_days_filters() {
        let catalog = sample_catalog();

        let east = catalog.filter(&GuideFilter {
            region: Some("华东".to_string()),
            ..GuideFilter::default()
        });
        assert_eq!(east.len(), 2);

        let short = catalog.filter(&GuideFilter {
            days: Some(DayBucket::OneToTwo),
            ..GuideFilter::default()
        });
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].slug, "wuzhen");
    }

    #[test]
    fn theme_filter_matches_theme_or_tags() {
        let catalog = sample_catalog();
        let hits = catalog.filter(&GuideFilter {
            theme: Some("古镇".to_string()),
            ..GuideFilter::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "wuzhen");
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let catalog = sample_catalog();
        assert_eq!(catalog.search("西湖").len(), 1);
        assert_eq!(catalog.search("之旅").len(), 3);
        assert!(catalog.search("不存在的地方").is_empty());
    }

    #[test]
    fn combined_filters_intersect() {
        let catalog = sample_catalog();
        let hits = catalog.filter(&GuideFilter {
            search: Some("之旅".to_string()),
            region: Some("华北".to_string()),
            ..GuideFilter::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "beijing");
    }

    #[test]
    fn loads_first_markdown_file_per_destination() {
        let dir = tempfile::tempdir().unwrap();
        let city = dir.path().join("suzhou");
        std::fs::create_dir(&city).unwrap();
        std::fs::write(city.join("b-notes.md"), "# 备用攻略\n").unwrap();
        std::fs::write(city.join("a-guide.md"), "# 苏州园林2天游\n").unwrap();
        std::fs::write(city.join("cover.png"), b"\x89PNG").unwrap();
        // a destination directory with no markdown is skipped
        std::fs::create_dir(dir.path().join("empty-city")).unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        let guide = catalog.find("suzhou").unwrap();
        assert_eq!(guide.meta.title, "苏州园林2天游");
        assert_eq!(guide.meta.days, 2);
    }
}
