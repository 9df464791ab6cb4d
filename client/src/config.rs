use js_sys::Reflect;
use serde::Deserialize;
use wasm_bindgen::JsValue;

use kmap_shared::UiText;

/// Page global the hosting CMS writes the runtime settings into.
pub const CONFIG_GLOBAL: &str = "kmapData";

pub const DEFAULT_AJAX_URL: &str = "/wp-admin/admin-ajax.php";
pub const STATS_ACTION: &str = "kmap_get_stats";
pub const SUBUNITS_ACTION: &str = "kmap_get_ayyl_aymaks";
pub const DEFAULT_LOG_FILTER: &str = "info";

// DOM
pub const MAP_CONTAINER_ID: &str = "map";
pub const STATS_TITLE_ID: &str = "stats-title";
pub const STATS_CONTENT_ID: &str = "stats-content";
pub const SUBUNIT_LIST_ID: &str = "ayyl-list";
pub const SVG_CLASS: &str = "kmap-svg";
pub const LABEL_CLASS: &str = "kmap-label";
pub const TITLE_CLASS: &str = "kmap-title";

// Map host
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 2.0;
pub const INITIAL_ZOOM: f64 = 0.0;
pub const DEFAULT_FIT_PADDING_PX: f64 = 20.0;

/// Runtime settings read from `window.kmapData`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub map_url: String,
    #[serde(rename = "ajaxurl")]
    pub ajax_url: String,
    pub stats_action: String,
    pub subunits_action: String,
    pub container_id: String,
    pub fit_padding: f64,
    pub log_filter: String,
    pub labels: UiText,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_url: String::new(),
            ajax_url: DEFAULT_AJAX_URL.into(),
            stats_action: STATS_ACTION.into(),
            subunits_action: SUBUNITS_ACTION.into(),
            container_id: MAP_CONTAINER_ID.into(),
            fit_padding: DEFAULT_FIT_PADDING_PX,
            log_filter: DEFAULT_LOG_FILTER.into(),
            labels: UiText::default(),
        }
    }
}

impl MapConfig {
    /// Read the page global. A missing global yields the defaults.
    pub fn from_window() -> Result<Self, String> {
        let window = web_sys::window().ok_or("no window")?;
        let raw = Reflect::get(window.as_ref(), &JsValue::from_str(CONFIG_GLOBAL))
            .map_err(|_| format!("cannot read window.{CONFIG_GLOBAL}"))?;
        if raw.is_undefined() || raw.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value::<Self>(raw)
            .map(Self::sanitized)
            .map_err(|e| format!("invalid {CONFIG_GLOBAL}: {e}"))
    }

    /// Replace blank or out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.ajax_url.trim().is_empty() {
            self.ajax_url = defaults.ajax_url;
        }
        if self.stats_action.trim().is_empty() {
            self.stats_action = defaults.stats_action;
        }
        if self.subunits_action.trim().is_empty() {
            self.subunits_action = defaults.subunits_action;
        }
        if self.container_id.trim().is_empty() {
            self.container_id = defaults.container_id;
        }
        if !self.fit_padding.is_finite() || self.fit_padding < 0.0 {
            self.fit_padding = defaults.fit_padding;
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = defaults.log_filter;
        }
        self
    }
}
