/// Itinerary parser for guide markdown bodies.
///
/// Guide content is scraped and AI-assembled, so the table format drifts
/// from file to file. The parser is deliberately lenient: a malformed
/// heading or row is skipped, a day with no usable rows is dropped, and a
/// document with no recognizable days degrades to placeholder entries. It
/// never returns an error and is a pure function of its inputs.
///
/// Two passes:
/// - pass 1: line-by-line scan for `### Day N` headings; a section runs to
///   the next day heading, the next level-2 heading, or end of input
/// - pass 2: per section, pipe-split table rows into timeline items,
///   classified by an ordered keyword rule table
use regex::Regex;

use crate::model::{ActivityKind, DayPlan, ItineraryItem};

/// Placeholder days are capped regardless of the declared trip length.
const MAX_PLACEHOLDER_DAYS: u32 = 5;

const PLACEHOLDER_TIME: &str = "09:00";
const PLACEHOLDER_TITLE: &str = "暂无详细行程数据";
const PLACEHOLDER_NOTE: &str = "请查看攻略详情页了解完整行程安排";

/// Table header literals; rows carrying them are layout, not data.
const HEADER_TIME: &str = "时间";
const HEADER_ACTIVITY: &str = "行程";

/// Ordered classification rules: first match wins. A row mentioning both a
/// meal and a hotel classifies as a meal because rule 1 runs first.
const CLASSIFY_RULES: &[(&[&str], ActivityKind)] = &[
    (&["早餐", "午餐", "晚餐", "餐厅"], ActivityKind::Meal),
    (&["前往", "返回", "出发", "回酒店"], ActivityKind::Transport),
    (&["酒店", "入住", "休息"], ActivityKind::Hotel),
];

/// Parse a guide body into its day-by-day timeline.
///
/// `total_days` is only consulted on the fallback path: when no day section
/// yields any items, the result is `min(total_days, 5)` placeholder days so
/// the timeline view always has something to render.
pub fn parse_itinerary(body: &str, total_days: u32) -> Vec<DayPlan> {
    let mut days: Vec<DayPlan> = Vec::new();

    for section in split_day_sections(body) {
        let items = parse_section_rows(&section.body);
        if items.is_empty() {
            // heading without a usable table: drop the whole day
            continue;
        }
        days.push(DayPlan {
            day: section.day,
            date: extract_date(&section.body),
            theme: extract_theme(&section.body, section.day),
            items,
        });
    }

    if days.is_empty() {
        for day in 1..=total_days.min(MAX_PLACEHOLDER_DAYS) {
            days.push(placeholder_day(day));
        }
    }

    days
}

struct DaySection {
    day: u32,
    body: String,
}

/// Pass 1: split the body into day sections in document order.
///
/// A section opens at a level-3 heading whose text starts with `Day`
/// (case-insensitive), tolerating spaces or punctuation before the day
/// number. It closes at the next day heading, at a level-2 heading, or at
/// end of input. Level-1 headings and other level-3 headings stay inside
/// the section. Day numbers are reported as written, not re-sorted.
fn split_day_sections(body: &str) -> Vec<DaySection> {
    let day_heading_re =
        Regex::new(r"(?i)^\s*###\s*day[\s\p{P}]*?(\d+)").expect("valid regex");

    let mut sections: Vec<DaySection> = Vec::new();
    let mut current: Option<(u32, Vec<&str>)> = None;

    for line in body.lines() {
        if let Some(caps) = day_heading_re.captures(line) {
            // digits that overflow u32 mean this is not a day heading
            if let Ok(day) = caps[1].parse::<u32>() {
                if let Some((prev_day, lines)) = current.take() {
                    sections.push(DaySection {
                        day: prev_day,
                        body: lines.join("\n"),
                    });
                }
                current = Some((day, Vec::new()));
                continue;
            }
        }

        if is_level2_heading(line) {
            if let Some((day, lines)) = current.take() {
                sections.push(DaySection {
                    day,
                    body: lines.join("\n"),
                });
            }
            continue;
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((day, lines)) = current.take() {
        sections.push(DaySection {
            day,
            body: lines.join("\n"),
        });
    }

    sections
}

/// Exactly two hashes followed by whitespace. `###` does not match, so a
/// non-day level-3 heading never terminates a section.
fn is_level2_heading(line: &str) -> bool {
    line.trim_start()
        .strip_prefix("##")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_whitespace()))
}

/// Theme for one day section. First match wins:
/// a bold `**主题：**` marker, then a line opening with a colon, then the
/// default `第{day}天` label.
fn extract_theme(section: &str, day: u32) -> String {
    let bold_re = Regex::new(r"\*\*主题[：:]\s*(.+?)\*\*").expect("valid regex");
    if let Some(caps) = bold_re.captures(section) {
        return caps[1].trim().to_string();
    }

    let colon_line_re = Regex::new(r"(?m)^[：:](.+)$").expect("valid regex");
    if let Some(caps) = colon_line_re.captures(section) {
        return caps[1].trim().to_string();
    }

    format!("第{day}天")
}

/// Optional date: a full-width parenthesized fragment with a weekday
/// marker, e.g. `（10月1日 星期三）`. Absence is not an error.
fn extract_date(section: &str) -> Option<String> {
    let date_re = Regex::new(r"（(.+?)\s+星期.）").expect("valid regex");
    date_re
        .captures(section)
        .map(|caps| caps[1].trim().to_string())
}

/// Pass 2: pipe-split every line of the section into candidate rows and
/// keep the ones carrying data.
fn parse_section_rows(section: &str) -> Vec<ItineraryItem> {
    let mut items = Vec::new();

    for line in section.lines() {
        let Some((time, title, tip)) = split_row(line) else {
            continue;
        };

        // header and separator rows are layout, empty cells carry nothing
        if time.is_empty() || title.is_empty() {
            continue;
        }
        if time == HEADER_TIME || title == HEADER_ACTIVITY {
            continue;
        }
        if is_separator_cell(&time) || is_separator_cell(&title) {
            continue;
        }

        let combined = format!("{title}{}", tip.as_deref().unwrap_or(""));
        let kind = classify(&combined);

        items.push(ItineraryItem {
            time,
            kind,
            title,
            description: tip.clone(),
            location: None,
            tips: tip.map(|t| vec![t]),
        });
    }

    items
}

/// Tokenize one table row: `| time | activity |` with an optional third
/// `| tip |` cell. The third cell only counts when its closing pipe is
/// present. Text before the first pipe and after the last is ignored.
fn split_row(line: &str) -> Option<(String, String, Option<String>)> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 4 {
        return None;
    }

    let time = parts[1].trim().to_string();
    let title = parts[2].trim().to_string();
    let tip = if parts.len() >= 5 {
        let t = parts[3].trim();
        (!t.is_empty()).then(|| t.to_string())
    } else {
        None
    };

    Some((time, title, tip))
}

fn is_separator_cell(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(|c| c == '-')
}

/// First matching rule wins; anything unmatched is an attraction.
fn classify(text: &str) -> ActivityKind {
    for (keywords, kind) in CLASSIFY_RULES {
        if keywords.iter().any(|k| text.contains(k)) {
            return *kind;
        }
    }
    ActivityKind::Attraction
}

fn placeholder_day(day: u32) -> DayPlan {
    DayPlan {
        day,
        date: None,
        theme: format!("第{day}天"),
        items: vec![ItineraryItem {
            time: PLACEHOLDER_TIME.to_string(),
            kind: ActivityKind::Attraction,
            title: PLACEHOLDER_TITLE.to_string(),
            description: Some(PLACEHOLDER_NOTE.to_string()),
            location: None,
            tips: None,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# 杭州三日游

## 行程安排

### Day 1 - 西湖环线
**主题：经典西湖**（10月1日 星期三）

| 时间 | 行程 | 贴士 |
|------|------|------|
| 09:00 | 游览断桥残雪 | 建议早起避开人流 |
| 12:00 | 午餐：楼外楼 | 人均150元 |
| 14:00 | 前往灵隐寺 |
| 18:00 | 回酒店休息 | 楼下有夜市 |

### Day 2
：古镇漫步

| 时间 | 行程 |
| --- | --- |
| 10:00 | 乌镇西栅 |
"#;

    #[test]
    fn parses_days_in_document_order() {
        let days = parse_itinerary(SAMPLE, 3);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[1].day, 2);
    }

    #[test]
    fn day_one_rows_and_classification() {
        let days = parse_itinerary(SAMPLE, 3);
        let items = &days[0].items;
        assert_eq!(items.len(), 4);

        assert_eq!(items[0].time, "09:00");
        assert_eq!(items[0].title, "游览断桥残雪");
        assert_eq!(items[0].kind, ActivityKind::Attraction);
        assert_eq!(items[0].tips.as_deref(), Some(&["建议早起避开人流".to_string()][..]));
        assert_eq!(items[0].description.as_deref(), Some("建议早起避开人流"));

        assert_eq!(items[1].kind, ActivityKind::Meal);
        assert_eq!(items[2].kind, ActivityKind::Transport);
        // "回酒店休息" hits the transport rule before the hotel rule
        assert_eq!(items[3].kind, ActivityKind::Transport);
    }

    #[test]
    fn theme_and_date_extraction() {
        let days = parse_itinerary(SAMPLE, 3);
        assert_eq!(days[0].theme, "经典西湖");
        assert_eq!(days[0].date.as_deref(), Some("10月1日"));
        // day 2 has no bold marker; the leading-colon line wins
        assert_eq!(days[1].theme, "古镇漫步");
        assert_eq!(days[1].date, None);
    }

    #[test]
    fn two_column_row_without_tip() {
        let days = parse_itinerary(SAMPLE, 3);
        let item = &days[1].items[0];
        assert_eq!(item.title, "乌镇西栅");
        assert_eq!(item.description, None);
        assert_eq!(item.tips, None);
    }

    #[test]
    fn tip_cell_requires_closing_pipe() {
        // "| 14:00 | 前往灵隐寺 |" has no fourth pipe: two cells only
        let days = parse_itinerary(SAMPLE, 3);
        let item = &days[0].items[2];
        assert_eq!(item.description, None);
        assert_eq!(item.tips, None);
    }

    #[test]
    fn source_order_is_preserved_not_sorted() {
        let body = "### Day 2\n| 09:00 | 外滩 |\n\n### Day 1\n| 09:00 | 豫园 |\n";
        let days = parse_itinerary(body, 2);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 2);
        assert_eq!(days[1].day, 1);
    }

    #[test]
    fn header_and_separator_only_drops_the_day() {
        let body = "### Day 1\n| 时间 | 行程 |\n|------|------|\n";
        assert!(parse_itinerary(body, 0).is_empty());
    }

    #[test]
    fn classification_priority_meal_before_hotel() {
        let body = "### Day 1\n| 18:00 | 晚餐后回酒店 |\n";
        let days = parse_itinerary(body, 1);
        assert_eq!(days[0].items[0].kind, ActivityKind::Meal);
    }

    #[test]
    fn hotel_rule_applies_without_earlier_matches() {
        let body = "### Day 1\n| 15:00 | 办理入住 |\n";
        let days = parse_itinerary(body, 1);
        assert_eq!(days[0].items[0].kind, ActivityKind::Hotel);
    }

    #[test]
    fn fallback_caps_at_five_days() {
        let days = parse_itinerary("", 8);
        assert_eq!(days.len(), 5);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.day, i as u32 + 1);
            assert_eq!(day.theme, format!("第{}天", i + 1));
            assert_eq!(day.items.len(), 1);
            let item = &day.items[0];
            assert_eq!(item.time, "09:00");
            assert_eq!(item.kind, ActivityKind::Attraction);
            assert_eq!(item.title, "暂无详细行程数据");
            assert_eq!(item.location, None);
            assert_eq!(item.tips, None);
        }
    }

    #[test]
    fn fallback_with_zero_days_hint_is_empty() {
        assert!(parse_itinerary("", 0).is_empty());
    }

    #[test]
    fn fallback_under_the_cap() {
        assert_eq!(parse_itinerary("no headings here", 2).len(), 2);
    }

    #[test]
    fn theme_defaults_to_day_label() {
        let body = "### Day 3\n| 09:00 | 看海 |\n";
        let days = parse_itinerary(body, 3);
        assert_eq!(days[0].theme, "第3天");
    }

    #[test]
    fn heading_match_is_lenient() {
        let body = "### day  4 - 古镇漫步\n| 09:00 | 南浔古镇 |\n";
        let days = parse_itinerary(body, 4);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, 4);
    }

    #[test]
    fn level2_heading_terminates_a_section() {
        let body = "### Day 1\n| 09:00 | 西湖 |\n## 美食推荐\n| 12:00 | 片儿川 |\n";
        let days = parse_itinerary(body, 1);
        assert_eq!(days.len(), 1);
        // the row under the level-2 heading belongs to no day
        assert_eq!(days[0].items.len(), 1);
        assert_eq!(days[0].items[0].title, "西湖");
    }

    #[test]
    fn other_level3_headings_stay_inside_the_section() {
        let body = "### Day 1\n| 09:00 | 西湖 |\n### 小贴士\n| 20:00 | 夜游运河 |\n";
        let days = parse_itinerary(body, 1);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].items.len(), 2);
    }

    #[test]
    fn rows_with_empty_required_cells_are_dropped() {
        let body = "### Day 1\n|  | 西湖 |\n| 09:00 |  |\n| 09:00 | 西湖 |\n";
        let days = parse_itinerary(body, 1);
        assert_eq!(days[0].items.len(), 1);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let a = parse_itinerary(SAMPLE, 3);
        let b = parse_itinerary(SAMPLE, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn location_is_never_populated() {
        let days = parse_itinerary(SAMPLE, 3);
        assert!(days
            .iter()
            .flat_map(|d| d.items.iter())
            .all(|item| item.location.is_none()));
    }
}
