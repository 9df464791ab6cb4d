use kmap_shared::{Level, StatsRecord, SubUnit};

use crate::config::MapConfig;

/// Parameters of one stats lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub level: Level,
    pub name: String,
    pub code: String,
}

impl StatsQuery {
    pub fn params<'a>(&'a self, action: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("action", action),
            ("level", self.level.as_str()),
            ("name", &self.name),
            ("code", &self.code),
        ]
    }
}

/// Parameters of one sub-unit list lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SubUnitQuery {
    pub district: String,
    pub code: String,
}

impl SubUnitQuery {
    pub fn params<'a>(&'a self, action: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("action", action),
            ("district", &self.district),
            ("code", &self.code),
        ]
    }
}

/// Remote data the controller depends on.
#[allow(async_fn_in_trait)]
pub trait MapApi {
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<StatsRecord, String>;
    async fn fetch_subunits(&self, query: &SubUnitQuery) -> Result<Vec<SubUnit>, String>;
}

/// CMS AJAX endpoint reached through `gloo-net`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    ajax_url: String,
    stats_action: String,
    subunits_action: String,
}

impl HttpApi {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            ajax_url: config.ajax_url.clone(),
            stats_action: config.stats_action.clone(),
            subunits_action: config.subunits_action.clone(),
        }
    }
}

impl MapApi for HttpApi {
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<StatsRecord, String> {
        let resp = gloo_net::http::Request::get(&self.ajax_url)
            .query(query.params(&self.stats_action))
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }

        resp.json::<StatsRecord>()
            .await
            .map_err(|e| format!("parse error: {e}"))
    }

    async fn fetch_subunits(&self, query: &SubUnitQuery) -> Result<Vec<SubUnit>, String> {
        let resp = gloo_net::http::Request::get(&self.ajax_url)
            .query(query.params(&self.subunits_action))
            .send()
            .await
            .map_err(|e| format!("fetch error: {e}"))?;

        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }

        resp.json::<Vec<SubUnit>>()
            .await
            .map_err(|e| format!("parse error: {e}"))
    }
}

/// Fetch a static resource as text.
pub async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.text().await.map_err(|e| format!("read error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_params_carry_action_and_identity() {
        let query = StatsQuery {
            level: Level::Region,
            name: "Чүй".into(),
            code: "41".into(),
        };
        assert_eq!(
            query.params("kmap_get_stats"),
            [
                ("action", "kmap_get_stats"),
                ("level", "region"),
                ("name", "Чүй"),
                ("code", "41"),
            ]
        );
    }

    #[test]
    fn subunit_params_name_the_district() {
        let query = SubUnitQuery {
            district: "Ат-Башы".into(),
            code: "4102".into(),
        };
        assert_eq!(
            query.params("kmap_get_ayyl_aymaks"),
            [
                ("action", "kmap_get_ayyl_aymaks"),
                ("district", "Ат-Башы"),
                ("code", "4102"),
            ]
        );
    }
}
