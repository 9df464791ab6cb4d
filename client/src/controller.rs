use std::cell::RefCell;

use kmap_shared::colors::HIGHLIGHT_FILL;
use kmap_shared::{
    Bounds, Level, ShapeCatalog, StatsRecord, SubUnit, UiText, base_fill, render_subunit_list,
};

use crate::api::{MapApi, StatsQuery, SubUnitQuery};
use crate::labels::LabelRenderer;
use crate::surface::{LayerId, Surface, TextKind};

/// Drill-down position plus the markers that show it.
#[derive(Debug, Clone)]
pub struct SelectionState {
    pub level: Level,
    pub bounds: Bounds,
    pub selected: Option<String>,
    marker: Option<LayerId>,
    title_marker: Option<LayerId>,
}

impl SelectionState {
    fn new(bounds: Bounds) -> Self {
        Self {
            level: Level::Country,
            bounds,
            selected: None,
            marker: None,
            title_marker: None,
        }
    }
}

/// Stats lookup issued by a click. Only the newest one may touch the panel.
#[derive(Debug, Clone)]
pub struct StatsRequest {
    generation: u64,
    shape_id: String,
    pub query: StatsQuery,
}

/// Sub-unit lookup issued after a district's stats arrived.
#[derive(Debug, Clone)]
pub struct SubUnitRequest {
    generation: u64,
    pub query: SubUnitQuery,
}

/// Owns the UI state of the map and applies clicks, hovers and responses to
/// a [`Surface`].
pub struct Controller<S> {
    surface: S,
    catalog: ShapeCatalog,
    text: UiText,
    fit_padding: f64,
    state: SelectionState,
    labels: LabelRenderer,
    stats_generation: u64,
    subunit_generation: u64,
    /// Panel markup of the current selection, restored after a sub-unit hover.
    restore_markup: Option<String>,
    subunits: Vec<SubUnit>,
    hovered_subunit: Option<usize>,
}

impl<S: Surface> Controller<S> {
    pub fn new(surface: S, catalog: ShapeCatalog, text: UiText, fit_padding: f64) -> Self {
        let bounds = catalog.view_box().overlay_bounds();
        Self {
            surface,
            catalog,
            text,
            fit_padding,
            state: SelectionState::new(bounds),
            labels: LabelRenderer::default(),
            stats_generation: 0,
            subunit_generation: 0,
            restore_markup: None,
            subunits: Vec::new(),
            hovered_subunit: None,
        }
    }

    /// Draw the labels of the first level below the country.
    pub fn start(&mut self) -> usize {
        let level = self.state.level.next_finer();
        self.labels.refresh(&mut self.surface, &self.catalog, level)
    }

    #[cfg(test)]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[cfg(test)]
    pub fn subunits(&self) -> &[SubUnit] {
        &self.subunits
    }

    /// Start handling a click. Returns the stats lookup to perform, or `None`
    /// for ids that are not in the catalog.
    pub fn begin_click(&mut self, shape_id: &str) -> Option<StatsRequest> {
        let Some(shape) = self.catalog.get(shape_id) else {
            tracing::warn!(shape = shape_id, "click on unknown shape");
            return None;
        };

        self.stats_generation = self.stats_generation.wrapping_add(1);
        let query = StatsQuery {
            level: shape.level(),
            name: shape.name_or(&self.text.untitled).to_string(),
            code: shape.key.code.clone(),
        };
        if self.state.selected.as_deref() == Some(shape_id) {
            tracing::debug!(shape = shape_id, "selected shape clicked again");
        }
        tracing::info!(
            shape = shape_id,
            level = %query.level,
            code = %query.code,
            name = %query.name,
            "shape clicked"
        );

        Some(StatsRequest {
            generation: self.stats_generation,
            shape_id: shape_id.to_string(),
            query,
        })
    }

    /// Apply a stats response. On success the panel, viewport, markers and
    /// labels move to the clicked shape; for districts the follow-up sub-unit
    /// lookup is returned.
    pub fn complete_stats(
        &mut self,
        request: &StatsRequest,
        result: Result<StatsRecord, String>,
    ) -> Option<SubUnitRequest> {
        if request.generation != self.stats_generation {
            tracing::debug!(
                shape = %request.shape_id,
                generation = request.generation,
                current = self.stats_generation,
                "discarding superseded stats response"
            );
            return None;
        }

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(shape = %request.shape_id, error = %e, "stats request failed");
                return None;
            }
        };

        let svg_height = self.catalog.svg_height();
        let bounds = self
            .catalog
            .get(&request.shape_id)
            .map(|shape| shape.bounds(svg_height))?;
        let level = request.query.level;
        let name = request.query.name.as_str();
        tracing::info!(shape = %request.shape_id, industries = record.len(), "stats received");

        let markup = record.to_markup(&self.text);
        self.surface.set_stats_title(name);
        self.surface.set_stats_content(&markup);
        tracing::debug!(
            from = ?self.state.bounds.as_array(),
            to = ?bounds.as_array(),
            "fitting viewport"
        );
        self.surface.fit_bounds(&bounds, self.fit_padding);
        self.place_selection(bounds.centroid(), name);

        self.state.level = level;
        self.state.bounds = bounds;
        self.state.selected = Some(request.shape_id.clone());
        self.labels
            .refresh(&mut self.surface, &self.catalog, level.next_finer());

        // Any list on screen belongs to the previous selection.
        self.restore_markup = Some(markup);
        self.subunits.clear();
        self.hovered_subunit = None;
        self.subunit_generation = self.subunit_generation.wrapping_add(1);
        self.surface.set_subunit_list("");

        if !level.is_terminal() {
            return None;
        }
        Some(SubUnitRequest {
            generation: self.subunit_generation,
            query: SubUnitQuery {
                district: request.query.name.clone(),
                code: request.query.code.clone(),
            },
        })
    }

    /// Apply a sub-unit list response for the selected district.
    pub fn complete_subunits(
        &mut self,
        request: &SubUnitRequest,
        result: Result<Vec<SubUnit>, String>,
    ) {
        if request.generation != self.subunit_generation {
            tracing::debug!(
                district = %request.query.district,
                "discarding superseded sub-unit response"
            );
            return;
        }

        match result {
            Ok(units) => {
                tracing::info!(
                    district = %request.query.district,
                    count = units.len(),
                    "sub-units received"
                );
                let markup = render_subunit_list(&units, &self.text);
                self.surface.set_subunit_list(&markup);
                self.subunits = units;
            }
            Err(e) => {
                tracing::warn!(
                    district = %request.query.district,
                    error = %e,
                    "sub-unit request failed"
                );
                self.subunits.clear();
                self.surface.set_subunit_list("");
            }
        }
        self.hovered_subunit = None;
    }

    /// Show the stats of one listed sub-unit in place of the district's.
    pub fn hover_subunit(&mut self, index: usize) {
        let Some(unit) = self.subunits.get(index) else {
            tracing::debug!(index, "hover on missing sub-unit");
            return;
        };
        let markup = unit.stats.to_markup(&self.text);
        self.surface.set_stats_content(&markup);
        self.hovered_subunit = Some(index);
    }

    /// Put the selected district's stats back after a sub-unit hover.
    pub fn unhover_subunit(&mut self) {
        if self.hovered_subunit.take().is_none() {
            return;
        }
        if let Some(markup) = self.restore_markup.as_deref() {
            self.surface.set_stats_content(markup);
        }
    }

    pub fn pointer_enter(&mut self, shape_id: &str) {
        if self.catalog.get(shape_id).is_some() {
            self.surface.set_fill(shape_id, HIGHLIGHT_FILL);
        }
    }

    pub fn pointer_leave(&mut self, shape_id: &str) {
        if let Some(shape) = self.catalog.get(shape_id) {
            self.surface.set_fill(shape_id, base_fill(shape));
        }
    }

    /// Remove the previous selection and title markers, then add new ones.
    fn place_selection(&mut self, at: [f64; 2], title: &str) {
        if let Some(id) = self.state.marker.take() {
            self.surface.remove_layer(id);
        }
        if let Some(id) = self.state.title_marker.take() {
            self.surface.remove_layer(id);
        }
        self.state.marker = self.surface.add_marker(at);
        self.state.title_marker = self.surface.add_text(TextKind::Title, at, title);
        tracing::debug!(y = at[0], x = at[1], "selection marker placed");
    }
}

/// Run one click end to end. No borrow of the controller is held across a
/// request.
pub async fn handle_click<S, A>(controller: &RefCell<Controller<S>>, api: &A, shape_id: &str)
where
    S: Surface,
    A: MapApi,
{
    let request = controller.borrow_mut().begin_click(shape_id);
    let Some(request) = request else {
        return;
    };

    let result = api.fetch_stats(&request.query).await;
    let follow_up = controller.borrow_mut().complete_stats(&request, result);
    let Some(follow_up) = follow_up else {
        return;
    };

    let result = api.fetch_subunits(&follow_up.query).await;
    controller
        .borrow_mut()
        .complete_subunits(&follow_up, result);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use futures::executor::block_on;
    use kmap_shared::colors::{CAPITAL_FILL, DEFAULT_FILL};
    use kmap_shared::{BBox, Shape, ViewBox};
    use serde_json::json;

    use super::*;
    use crate::surface::testing::RecordingSurface;

    fn shape(id: &str, name: &str, capital: bool, bbox: BBox) -> Shape {
        Shape::from_attributes(
            |attr| match attr {
                "id" => Some(id.to_string()),
                "display_name" if !name.is_empty() => Some(name.to_string()),
                "data_bishkek" if capital => Some("1".to_string()),
                _ => None,
            },
            bbox,
        )
        .expect("shape")
    }

    fn catalog() -> ShapeCatalog {
        let mut catalog = ShapeCatalog::new(ViewBox::default());
        catalog.insert(shape(
            "region-41",
            "Chüy",
            false,
            BBox::new(100.0, 50.0, 200.0, 150.0),
        ));
        catalog.insert(shape(
            "region-11",
            "Bishkek",
            true,
            BBox::new(150.0, 80.0, 20.0, 20.0),
        ));
        catalog.insert(shape(
            "district-4101",
            "Alamüdün",
            false,
            BBox::new(120.0, 60.0, 40.0, 40.0),
        ));
        catalog.insert(shape(
            "district-4102",
            "Ysyk-Ata",
            false,
            BBox::new(200.0, 120.0, 60.0, 50.0),
        ));
        catalog.insert(shape(
            "district-4103",
            "",
            false,
            BBox::new(300.0, 300.0, 10.0, 10.0),
        ));
        catalog
    }

    fn controller() -> Controller<RecordingSurface> {
        Controller::new(
            RecordingSurface::default(),
            catalog(),
            UiText::default(),
            20.0,
        )
    }

    fn record(value: serde_json::Value) -> StatsRecord {
        StatsRecord::from_value(&value)
    }

    fn district_stats() -> StatsRecord {
        record(json!({"Сельское хозяйство": {"leasing_amount": 4.5, "equipment_quantity": 9, "new_jobs": 3}}))
    }

    fn units() -> Vec<SubUnit> {
        serde_json::from_value(json!([
            {"name": "Ак-Кашат", "stats": {"Туризм": {"leasing_amount": 1, "equipment_quantity": 1, "new_jobs": 2}}},
            {"name": "Лебединовка", "stats": {}},
            {"name": "Васильевка", "stats": {"Торговля": {"new_jobs": 11}}}
        ]))
        .expect("units")
    }

    /// In-memory endpoint keyed by shape code.
    #[derive(Default)]
    struct FakeApi {
        stats: HashMap<String, Result<StatsRecord, String>>,
        subunits: HashMap<String, Result<Vec<SubUnit>, String>>,
        stats_calls: RefCell<Vec<StatsQuery>>,
        subunit_calls: RefCell<Vec<SubUnitQuery>>,
    }

    impl MapApi for FakeApi {
        async fn fetch_stats(&self, query: &StatsQuery) -> Result<StatsRecord, String> {
            self.stats_calls.borrow_mut().push(query.clone());
            self.stats
                .get(&query.code)
                .cloned()
                .unwrap_or_else(|| Err("HTTP 404".into()))
        }

        async fn fetch_subunits(&self, query: &SubUnitQuery) -> Result<Vec<SubUnit>, String> {
            self.subunit_calls.borrow_mut().push(query.clone());
            self.subunits
                .get(&query.code)
                .cloned()
                .unwrap_or_else(|| Err("HTTP 404".into()))
        }
    }

    fn api() -> FakeApi {
        let mut api = FakeApi::default();
        api.stats.insert(
            "41".into(),
            Ok(record(json!({"Торговля": {"leasing_amount": 120, "equipment_quantity": 35, "new_jobs": 40}}))),
        );
        api.stats.insert("11".into(), Ok(StatsRecord::default()));
        api.stats.insert("4101".into(), Ok(district_stats()));
        api.stats.insert("4102".into(), Ok(record(json!({}))));
        api.subunits.insert("4101".into(), Ok(units()));
        api.subunits
            .insert("4102".into(), Err("fetch error: offline".into()));
        api
    }

    fn click(controller: &RefCell<Controller<RecordingSurface>>, api: &FakeApi, id: &str) {
        block_on(handle_click(controller, api, id));
    }

    #[test]
    fn start_labels_regions() {
        let mut ctrl = controller();
        assert_eq!(ctrl.start(), 2);
        let names: Vec<String> = ctrl
            .surface()
            .texts(TextKind::Label)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Chüy", "Bishkek"]);
        assert_eq!(ctrl.state().level, Level::Country);
        assert_eq!(
            ctrl.state().bounds.as_array(),
            [[0.0, 0.0], [1000.0, 1000.0]]
        );
    }

    #[test]
    fn region_click_updates_panel_viewport_markers_and_labels() {
        let ctrl = RefCell::new(controller());
        ctrl.borrow_mut().start();
        let api = api();

        click(&ctrl, &api, "region-41");

        let ctrl = ctrl.borrow();
        let surface = ctrl.surface();
        assert_eq!(surface.title, "Chüy");
        assert!(surface.content.starts_with("<h4 class=\"font-semibold\">Торговля</h4>"));
        assert_eq!(
            surface.fits,
            vec![(Bounds::new([800.0, 100.0], [950.0, 300.0]), 20.0)]
        );
        assert_eq!(surface.markers(), vec![[875.0, 200.0]]);
        assert_eq!(
            surface.texts(TextKind::Title),
            vec![("Chüy".to_string(), [875.0, 200.0])]
        );

        let labels: Vec<String> = surface
            .texts(TextKind::Label)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(labels, vec!["Alamüdün", "Ysyk-Ata"]);

        assert_eq!(ctrl.state().level, Level::Region);
        assert_eq!(ctrl.state().selected.as_deref(), Some("region-41"));
        assert_eq!(surface.list, "");
        assert!(api.subunit_calls.borrow().is_empty());
        assert_eq!(
            api.stats_calls.borrow().as_slice(),
            &[StatsQuery {
                level: Level::Region,
                name: "Chüy".into(),
                code: "41".into(),
            }]
        );
    }

    #[test]
    fn repeated_clicks_keep_a_single_marker_pair() {
        let ctrl = RefCell::new(controller());
        let api = api();

        for id in ["region-41", "region-11", "district-4101", "region-41", "region-41"] {
            click(&ctrl, &api, id);
            let ctrl = ctrl.borrow();
            assert_eq!(ctrl.surface().markers().len(), 1, "after {id}");
            assert_eq!(ctrl.surface().texts(TextKind::Title).len(), 1, "after {id}");
        }
        assert_eq!(
            ctrl.borrow().surface().texts(TextKind::Title)[0].0,
            "Chüy"
        );
    }

    #[test]
    fn district_click_lists_subunits_and_hover_restores_exact_markup() {
        let ctrl = RefCell::new(controller());
        let api = api();

        click(&ctrl, &api, "district-4101");

        let after_click = ctrl.borrow().surface().content.clone();
        assert_eq!(after_click, district_stats().to_markup(&UiText::default()));
        assert_eq!(ctrl.borrow().surface().list_items(), units().len());
        assert_eq!(ctrl.borrow().state().level, Level::District);
        assert_eq!(
            api.subunit_calls.borrow().as_slice(),
            &[SubUnitQuery {
                district: "Alamüdün".into(),
                code: "4101".into(),
            }]
        );

        for idx in 0..units().len() {
            ctrl.borrow_mut().hover_subunit(idx);
            let hovered = ctrl.borrow().surface().content.clone();
            assert_eq!(
                hovered,
                units()[idx].stats.to_markup(&UiText::default()),
                "hover {idx}"
            );
            ctrl.borrow_mut().unhover_subunit();
            assert_eq!(ctrl.borrow().surface().content, after_click, "unhover {idx}");
        }
    }

    #[test]
    fn district_labels_stay_at_district_level() {
        let ctrl = RefCell::new(controller());
        let api = api();

        click(&ctrl, &api, "district-4101");

        let labels: Vec<String> = ctrl
            .borrow()
            .surface()
            .texts(TextKind::Label)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(labels, vec!["Alamüdün", "Ysyk-Ata"]);
    }

    #[test]
    fn empty_district_stats_show_placeholder() {
        let ctrl = RefCell::new(controller());
        let api = api();

        click(&ctrl, &api, "district-4102");

        let ctrl = ctrl.borrow();
        assert_eq!(ctrl.surface().content, "<p>Нет данных</p>");
        assert_eq!(ctrl.surface().title, "Ysyk-Ata");
    }

    #[test]
    fn subunit_failure_clears_list() {
        let ctrl = RefCell::new(controller());
        let api = api();

        click(&ctrl, &api, "district-4101");
        assert_eq!(ctrl.borrow().surface().list_items(), 3);

        click(&ctrl, &api, "district-4102");
        let ctrl = ctrl.borrow();
        assert_eq!(ctrl.surface().list, "");
        assert!(ctrl.subunits().is_empty());
        assert_eq!(ctrl.state().selected.as_deref(), Some("district-4102"));
    }

    #[test]
    fn region_after_district_clears_subunit_list() {
        let ctrl = RefCell::new(controller());
        let api = api();

        click(&ctrl, &api, "region-41");
        click(&ctrl, &api, "district-4101");
        assert_eq!(ctrl.borrow().surface().list_items(), 3);

        click(&ctrl, &api, "region-11");
        let ctrl = ctrl.borrow();
        assert_eq!(ctrl.surface().list, "");
        assert!(ctrl.subunits().is_empty());
        assert_eq!(ctrl.state().level, Level::Region);
    }

    #[test]
    fn stats_failure_leaves_previous_state() {
        let ctrl = RefCell::new(controller());
        let mut api = api();
        api.stats.insert("4101".into(), Err("HTTP 500".into()));

        click(&ctrl, &api, "region-41");
        let (title, content, fits, level) = {
            let ctrl = ctrl.borrow();
            let s = ctrl.surface();
            (s.title.clone(), s.content.clone(), s.fits.len(), ctrl.state().level)
        };

        click(&ctrl, &api, "district-4101");

        let ctrl = ctrl.borrow();
        assert_eq!(ctrl.surface().title, title);
        assert_eq!(ctrl.surface().content, content);
        assert_eq!(ctrl.surface().fits.len(), fits);
        assert_eq!(ctrl.state().level, level);
        assert_eq!(ctrl.state().selected.as_deref(), Some("region-41"));
        assert_eq!(ctrl.surface().markers(), vec![[875.0, 200.0]]);
        assert!(api.subunit_calls.borrow().is_empty());
    }

    #[test]
    fn superseded_stats_response_is_discarded() {
        let mut ctrl = controller();

        let first = ctrl.begin_click("region-41").expect("request");
        let second = ctrl.begin_click("region-11").expect("request");

        assert!(ctrl.complete_stats(&second, Ok(StatsRecord::default())).is_none());
        assert_eq!(ctrl.surface().title, "Bishkek");

        let late = record(json!({"Торговля": {"new_jobs": 1}}));
        assert!(ctrl.complete_stats(&first, Ok(late)).is_none());
        assert_eq!(ctrl.surface().title, "Bishkek");
        assert_eq!(ctrl.surface().content, "<p>Нет данных</p>");
        assert_eq!(ctrl.state().selected.as_deref(), Some("region-11"));
        assert_eq!(ctrl.surface().fits.len(), 1);
    }

    #[test]
    fn superseded_subunit_response_is_discarded() {
        let mut ctrl = controller();

        let stats = ctrl.begin_click("district-4101").expect("request");
        let list = ctrl
            .complete_stats(&stats, Ok(district_stats()))
            .expect("follow-up");

        let region = ctrl.begin_click("region-41").expect("request");
        assert!(ctrl.complete_stats(&region, Ok(StatsRecord::default())).is_none());

        ctrl.complete_subunits(&list, Ok(units()));
        assert_eq!(ctrl.surface().list, "");
        assert!(ctrl.subunits().is_empty());
    }

    #[test]
    fn second_district_replaces_restore_target_and_list() {
        let mut ctrl = controller();

        let first = ctrl.begin_click("district-4101").expect("request");
        let first_list = ctrl
            .complete_stats(&first, Ok(district_stats()))
            .expect("follow-up");
        ctrl.complete_subunits(&first_list, Ok(units()));
        assert_eq!(ctrl.surface().list_items(), 3);

        // The second district's stats land before its list does: the old
        // list is gone, so nothing can restore the first district's stats.
        let second = ctrl.begin_click("district-4102").expect("request");
        let second_list = ctrl
            .complete_stats(&second, Ok(StatsRecord::default()))
            .expect("follow-up");
        assert_eq!(ctrl.surface().list, "");
        ctrl.hover_subunit(0);
        ctrl.unhover_subunit();
        assert_eq!(ctrl.surface().content, "<p>Нет данных</p>");

        ctrl.complete_subunits(&second_list, Ok(units()[..1].to_vec()));
        ctrl.hover_subunit(0);
        ctrl.unhover_subunit();
        assert_eq!(ctrl.surface().content, "<p>Нет данных</p>");
        assert_eq!(ctrl.surface().list_items(), 1);
    }

    #[test]
    fn unhover_without_hover_keeps_panel() {
        let mut ctrl = controller();
        let stats = ctrl.begin_click("district-4101").expect("request");
        let list = ctrl
            .complete_stats(&stats, Ok(district_stats()))
            .expect("follow-up");
        ctrl.complete_subunits(&list, Ok(units()));

        ctrl.hover_subunit(2);
        let hovered = ctrl.surface().content.clone();
        ctrl.hover_subunit(99);
        assert_eq!(ctrl.surface().content, hovered);
        ctrl.unhover_subunit();
        ctrl.unhover_subunit();
        assert_eq!(
            ctrl.surface().content,
            district_stats().to_markup(&UiText::default())
        );
    }

    #[test]
    fn unnamed_shape_is_queried_as_untitled() {
        let mut ctrl = controller();
        let request = ctrl.begin_click("district-4103").expect("request");
        assert_eq!(request.query.name, "Без названия");
        assert_eq!(request.query.level, Level::District);
        assert!(ctrl.begin_click("region-99").is_none());
    }

    #[test]
    fn hover_uses_highlight_then_base_fill() {
        let mut ctrl = controller();

        ctrl.pointer_enter("region-41");
        assert_eq!(ctrl.surface().fills["region-41"], HIGHLIGHT_FILL);
        ctrl.pointer_leave("region-41");
        assert_eq!(ctrl.surface().fills["region-41"], DEFAULT_FILL);

        ctrl.pointer_enter("region-11");
        ctrl.pointer_leave("region-11");
        assert_eq!(ctrl.surface().fills["region-11"], CAPITAL_FILL);

        ctrl.pointer_enter("lake-1");
        assert!(!ctrl.surface().fills.contains_key("lake-1"));
    }
}
