use maud::html;
use serde::Deserialize;
use serde_json::Value;

use crate::stats::StatsRecord;
use crate::text::UiText;

pub const SUBUNIT_ITEM_CLASS: &str = "ayyl-item";
pub const SUBUNIT_INDEX_ATTR: &str = "data-index";
const SUBUNIT_ITEM_CLASSES: &str = "ayyl-item cursor-pointer hover:bg-blue-800 p-2";

/// A finer unit listed under a selected district.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub struct SubUnit {
    pub name: String,
    pub stats: StatsRecord,
}

/// Heading plus one hoverable `<li>` per sub-unit. Items carry their position
/// in `data-index`; the stats themselves stay with the caller.
pub fn render_subunit_list(units: &[SubUnit], text: &UiText) -> String {
    html! {
        h3 class="font-bold mb-2" { (text.subunits_heading) }
        ul {
            @for (idx, unit) in units.iter().enumerate() {
                li class=(SUBUNIT_ITEM_CLASSES) data-index=(idx) { (unit.name_or(&text.untitled)) }
            }
        }
    }
    .into_string()
}

impl SubUnit {
    /// Read one list entry. A name that is missing or not a string is left
    /// empty, and anything that is not an object yields an unnamed entry
    /// without stats.
    pub fn from_value(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            stats: value
                .get("stats")
                .map(StatsRecord::from_value)
                .unwrap_or_default(),
        }
    }

    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.name.trim().is_empty() {
            fallback
        } else {
            &self.name
        }
    }
}

impl From<Value> for SubUnit {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_with_missing_stats() {
        let units: Vec<SubUnit> = serde_json::from_str(
            r#"[
                {"name": "Ат-Башы", "stats": {"Туризм": {"new_jobs": 4}}},
                {"name": "Кара-Суу"},
                {"name": "Ак-Муз", "stats": null}
            ]"#,
        )
        .expect("deserialize");
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].stats.len(), 1);
        assert!(units[1].stats.is_empty());
        assert!(units[2].stats.is_empty());
    }

    #[test]
    fn bad_entries_do_not_drop_the_list() {
        let units: Vec<SubUnit> = serde_json::from_str(
            r#"[
                {"name": "Ат-Башы", "stats": {}},
                {"name": null, "stats": {}},
                {"name": "Кара-Суу", "stats": {}},
                {"name": 7},
                "Ак-Муз",
                null
            ]"#,
        )
        .expect("deserialize");
        let names: Vec<&str> = units.iter().map(|u| u.name_or("Без названия")).collect();
        assert_eq!(
            names,
            vec![
                "Ат-Башы",
                "Без названия",
                "Кара-Суу",
                "Без названия",
                "Без названия",
                "Без названия",
            ]
        );
        assert!(units.iter().all(|u| u.stats.is_empty()));

        let html = render_subunit_list(&units, &UiText::default());
        assert_eq!(html.matches("<li ").count(), 6);
        assert!(html.contains("data-index=\"1\">Без названия</li>"));
    }

    #[test]
    fn renders_one_item_per_unit() {
        let units = vec![
            SubUnit {
                name: "Ат-Башы".into(),
                stats: StatsRecord::default(),
            },
            SubUnit {
                name: "A & B".into(),
                stats: StatsRecord::default(),
            },
            SubUnit {
                name: String::new(),
                stats: StatsRecord::default(),
            },
        ];
        let html = render_subunit_list(&units, &UiText::default());
        assert!(html.starts_with("<h3 class=\"font-bold mb-2\">Айылные аймаки:</h3><ul>"));
        assert!(html.ends_with("</ul>"));
        assert_eq!(html.matches("<li ").count(), 3);
        assert!(html.contains(
            "<li class=\"ayyl-item cursor-pointer hover:bg-blue-800 p-2\" data-index=\"1\">A &amp; B</li>"
        ));
        assert!(html.contains("data-index=\"2\">Без названия</li>"));
    }

    #[test]
    fn empty_list_still_has_heading() {
        let html = render_subunit_list(&[], &UiText::default());
        assert_eq!(html, "<h3 class=\"font-bold mb-2\">Айылные аймаки:</h3><ul></ul>");
    }
}
