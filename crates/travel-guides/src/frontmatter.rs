/// Guide document loading: YAML front-matter plus fallback extraction.
///
/// Authors are inconsistent about front-matter, so every metadata field has
/// a fallback: missing keys are recovered from the body text or filled with
/// a default. A malformed front-matter block degrades to an empty map and a
/// warning, never an error.
use regex::Regex;
use tracing::warn;

use crate::model::{Guide, GuideMeta};

const DEFAULT_TITLE: &str = "旅游攻略";
const DEFAULT_THEME: &str = "旅游攻略";
const DEFAULT_REGION: &str = "其他";
const DEFAULT_DAYS: u32 = 3;
const DEFAULT_RATING: f32 = 4.5;

/// Known slug → region assignments for guides whose front-matter omits one.
const REGION_TABLE: &[(&str, &str)] = &[
    ("beijing", "华北"),
    ("shanghai", "华东"),
    ("chengdu", "西南"),
    ("xian", "西北"),
    ("xiamen", "华南"),
    ("chongqing", "西南"),
    ("hangzhou", "华东"),
    ("sanya", "华南"),
    ("yunnan", "西南"),
    ("qingdao", "华东"),
    ("guilin", "华南"),
    ("zhangjiajie", "华中"),
    ("suzhou", "华东"),
    ("nanjing", "华东"),
    ("yangzhou", "华东"),
    ("wuxi", "华东"),
    ("huangshan", "华东"),
    ("wuzhen", "华东"),
    ("zhouzhuang", "华东"),
    ("xitang", "华东"),
    ("nanxun", "华东"),
    ("tongli", "华东"),
    ("jinxi", "华东"),
    ("anchang", "华东"),
    ("zhujiajiao", "华东"),
];

/// Parse one raw guide file into a `Guide` with fully resolved metadata.
pub fn parse_document(slug: &str, raw: &str) -> Guide {
    let (front, body) = split_front_matter(slug, raw);

    let fm_days = get_u32(&front, "days");
    let days = fm_days
        .or_else(|| extract_days(&body))
        .unwrap_or(DEFAULT_DAYS);
    // nights only derives from days when the author declared days explicitly
    let nights = get_u32(&front, "nights")
        .or(fm_days.map(|d| d.saturating_sub(1)))
        .unwrap_or(0);

    let meta = GuideMeta {
        city: get_string(&front, "city").unwrap_or_else(|| slug.to_string()),
        title: get_string(&front, "title")
            .or_else(|| extract_title(&body))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        days,
        nights,
        theme: get_string(&front, "theme").unwrap_or_else(|| DEFAULT_THEME.to_string()),
        region: get_string(&front, "region")
            .or_else(|| region_for_slug(slug).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        tags: get_string_list(&front, "tags"),
        budget: get_u32(&front, "budget"),
        season: get_string(&front, "season"),
        cover: get_string(&front, "cover").unwrap_or_else(|| format!("/images/{slug}-guide.png")),
        rating: get_f32(&front, "rating").unwrap_or(DEFAULT_RATING),
    };

    Guide {
        slug: slug.to_string(),
        meta,
        content: body,
    }
}

/// Split a leading `---`-delimited YAML block off the document. Anything
/// short of a well-formed block (no opener, no closer, invalid YAML) leaves
/// the full input as the body.
fn split_front_matter(slug: &str, raw: &str) -> (serde_yaml::Value, String) {
    let empty = serde_yaml::Value::Null;

    let mut lines = raw.lines();
    if lines.next().map(str::trim_end) != Some("---") {
        return (empty, raw.to_string());
    }

    let rest: Vec<&str> = lines.collect();
    let Some(close) = rest.iter().position(|l| l.trim_end() == "---") else {
        return (empty, raw.to_string());
    };

    let yaml_text = rest[..close].join("\n");
    let body = rest[close + 1..].join("\n");

    match serde_yaml::from_str::<serde_yaml::Value>(&yaml_text) {
        Ok(value) => (value, body),
        Err(e) => {
            warn!(slug, error = %e, "malformed front-matter, falling back to body extraction");
            (empty, body)
        }
    }
}

fn get_string(front: &serde_yaml::Value, key: &str) -> Option<String> {
    front
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn get_u32(front: &serde_yaml::Value, key: &str) -> Option<u32> {
    front.get(key)?.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn get_f32(front: &serde_yaml::Value, key: &str) -> Option<f32> {
    front.get(key)?.as_f64().map(|n| n as f32)
}

fn get_string_list(front: &serde_yaml::Value, key: &str) -> Vec<String> {
    let Some(seq) = front.get(key).and_then(|v| v.as_sequence()) else {
        return Vec::new();
    };
    seq.iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect()
}

/// First `# ` heading in the body, when the front-matter has no title.
fn extract_title(body: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^#\s+(.+)$").expect("valid regex");
    re.captures(body).map(|caps| caps[1].trim().to_string())
}

/// First `{N}天` occurrence in the body, when no day count was declared.
fn extract_days(body: &str) -> Option<u32> {
    let re = Regex::new(r"(\d+)天").expect("valid regex");
    re.captures(body).and_then(|caps| caps[1].parse().ok())
}

fn region_for_slug(slug: &str) -> Option<&'static str> {
    REGION_TABLE
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, region)| *region)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_FRONT_MATTER: &str = r#"---
city: 杭州
title: 杭州三日游攻略
days: 3
theme: 山水风光
tags:
  - 西湖
  - 美食
budget: 1500
rating: 4.8
---
# 杭州三日游

正文内容。
"#;

    #[test]
    fn resolves_declared_fields() {
        let guide = parse_document("hangzhou", WITH_FRONT_MATTER);
        assert_eq!(guide.meta.city, "杭州");
        assert_eq!(guide.meta.title, "杭州三日游攻略");
        assert_eq!(guide.meta.days, 3);
        assert_eq!(guide.meta.nights, 2);
        assert_eq!(guide.meta.theme, "山水风光");
        assert_eq!(guide.meta.tags, vec!["西湖", "美食"]);
        assert_eq!(guide.meta.budget, Some(1500));
        assert_eq!(guide.meta.season, None);
        assert!((guide.meta.rating - 4.8).abs() < 1e-6);
        // region fell back to the slug table
        assert_eq!(guide.meta.region, "华东");
        assert!(guide.content.starts_with("# 杭州三日游"));
    }

    #[test]
    fn no_front_matter_falls_back_to_body() {
        let raw = "# 青岛4天海滨游\n\n行程为期4天。\n";
        let guide = parse_document("qingdao", raw);
        assert_eq!(guide.meta.title, "青岛4天海滨游");
        assert_eq!(guide.meta.days, 4);
        // days came from the body, so nights does not derive from it
        assert_eq!(guide.meta.nights, 0);
        assert_eq!(guide.meta.city, "qingdao");
        assert_eq!(guide.meta.region, "华东");
        assert_eq!(guide.meta.cover, "/images/qingdao-guide.png");
        assert!((guide.meta.rating - 4.5).abs() < 1e-6);
        assert_eq!(guide.content, raw);
    }

    #[test]
    fn unknown_slug_and_empty_body_get_defaults() {
        let guide = parse_document("atlantis", "");
        assert_eq!(guide.meta.title, "旅游攻略");
        assert_eq!(guide.meta.theme, "旅游攻略");
        assert_eq!(guide.meta.region, "其他");
        assert_eq!(guide.meta.days, 3);
        assert_eq!(guide.meta.nights, 0);
        assert!(guide.meta.tags.is_empty());
    }

    #[test]
    fn unclosed_front_matter_is_body_text() {
        let raw = "---\ncity: 上海\n\n# 上海一日游\n";
        let guide = parse_document("shanghai", raw);
        assert_eq!(guide.meta.city, "shanghai");
        assert_eq!(guide.meta.title, "上海一日游");
        assert_eq!(guide.content, raw);
    }

    #[test]
    fn malformed_yaml_degrades_to_empty_map() {
        let raw = "---\n: [unbalanced\n---\n# 正文标题\n";
        let guide = parse_document("wuzhen", raw);
        assert_eq!(guide.meta.title, "正文标题");
        assert_eq!(guide.meta.city, "wuzhen");
    }
}
