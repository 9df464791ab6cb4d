use maud::html;
use serde::Deserialize;
use serde_json::Value;

use crate::text::{UiText, fill_template};

/// Figures reported for one industry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndustryStats {
    pub leasing_amount: f64,
    pub equipment_quantity: f64,
    pub new_jobs: f64,
}

impl IndustryStats {
    /// Read each field independently; anything absent, `null` or
    /// non-numeric becomes 0.
    pub fn from_value(value: &Value) -> Self {
        Self {
            leasing_amount: number_field(value, "leasing_amount"),
            equipment_quantity: number_field(value, "equipment_quantity"),
            new_jobs: number_field(value, "new_jobs"),
        }
    }
}

fn number_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        // PHP endpoints tend to send decimals as strings.
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Industry → figures, in the order the server listed them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub struct StatsRecord {
    entries: Vec<(String, IndustryStats)>,
}

impl StatsRecord {
    /// Non-object input yields an empty record.
    pub fn from_value(value: &Value) -> Self {
        let entries = value
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(industry, entry)| (industry.clone(), IndustryStats::from_value(entry)))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndustryStats)> {
        self.entries
            .iter()
            .map(|(industry, stats)| (industry.as_str(), stats))
    }

    /// One heading and three lines per industry, or the no-data placeholder.
    pub fn to_markup(&self, text: &UiText) -> String {
        if self.entries.is_empty() {
            return no_data_markup(text);
        }

        html! {
            @for (industry, stats) in &self.entries {
                h4.font-semibold { (industry) }
                p { (fill_template(&text.leasing_amount, &display_number(stats.leasing_amount))) }
                p { (fill_template(&text.equipment_quantity, &display_number(stats.equipment_quantity))) }
                p { (fill_template(&text.new_jobs, &display_number(stats.new_jobs))) }
            }
        }
        .into_string()
    }
}

impl From<Value> for StatsRecord {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

pub fn no_data_markup(text: &UiText) -> String {
    html! { p { (text.no_data) } }.into_string()
}

/// Render any response body as panel markup. Never fails and never returns
/// an empty string.
pub fn format_stats(value: &Value, text: &UiText) -> String {
    StatsRecord::from_value(value).to_markup(text)
}

fn display_number(value: f64) -> String {
    // Keep "-0" out of the panel.
    let value = if value == 0.0 { 0.0 } else { value };
    value.to_string()
}
