use serde::{Deserialize, Serialize};

/// User-facing strings of the stats panel. `{}` marks where the value goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiText {
    pub leasing_amount: String,
    pub equipment_quantity: String,
    pub new_jobs: String,
    pub no_data: String,
    pub subunits_heading: String,
    /// Name sent for shapes without a `display_name`.
    pub untitled: String,
}

impl Default for UiText {
    fn default() -> Self {
        Self {
            leasing_amount: "Сумма лизинга: {} млн сом".into(),
            equipment_quantity: "Количество техники: {}".into(),
            new_jobs: "Новые рабочие места: {}".into(),
            no_data: "Нет данных".into(),
            subunits_heading: "Айылные аймаки:".into(),
            untitled: "Без названия".into(),
        }
    }
}

pub(crate) fn fill_template(template: &str, value: &str) -> String {
    if template.contains("{}") {
        template.replacen("{}", value, 1)
    } else {
        format!("{template}{value}")
    }
}
