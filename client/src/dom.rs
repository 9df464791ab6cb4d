use std::collections::HashMap;

use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, SvgElement};

use kmap_shared::{BBox, Bounds, ViewBox};

use crate::config::{
    INITIAL_ZOOM, LABEL_CLASS, MAX_ZOOM, MIN_ZOOM, STATS_CONTENT_ID, STATS_TITLE_ID,
    SUBUNIT_LIST_ID, SVG_CLASS, TITLE_CLASS,
};
use crate::surface::{LayerId, Surface, TextKind};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    min_zoom: f64,
    max_zoom: f64,
    zoom: f64,
    zoom_control: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DivIconOptions<'a> {
    class_name: &'a str,
    html: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverlayOptions<'a> {
    interactive: bool,
    class_name: &'a str,
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

/// Call `target[method](...args)` with `this` bound to `target`.
fn call(target: &JsValue, method: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let func = get(target, method)?.dyn_into::<Function>()?;
    let array = Array::new();
    for arg in args {
        array.push(arg);
    }
    func.apply(target, &array)
}

fn number(target: &JsValue, key: &str) -> Result<f64, JsValue> {
    get(target, key)?
        .as_f64()
        .ok_or_else(|| JsValue::from_str(&format!("{key} is not a number")))
}

/// Bounding box of a rendered SVG element, via `getBBox()`.
pub fn measure(element: &Element) -> Result<BBox, JsValue> {
    let rect = call(element.as_ref(), "getBBox", &[])?;
    Ok(BBox::new(
        number(&rect, "x")?,
        number(&rect, "y")?,
        number(&rect, "width")?,
        number(&rect, "height")?,
    ))
}

/// Leaflet map plus the stats panels of the page.
pub struct LeafletSurface {
    leaflet: JsValue,
    map: JsValue,
    document: Document,
    shapes: HashMap<String, SvgElement>,
    layers: HashMap<u64, JsValue>,
    next_layer: u64,
}

impl LeafletSurface {
    /// Create the map in `container_id` with a flat coordinate system sized
    /// to the view box, centred on it.
    pub fn mount(
        document: Document,
        container_id: &str,
        view_box: &ViewBox,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let leaflet = get(window.as_ref(), "L")?;
        if leaflet.is_undefined() {
            return Err(JsValue::from_str("Leaflet (window.L) is not loaded"));
        }

        let options = to_js(&MapOptions {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom: INITIAL_ZOOM,
            zoom_control: true,
        })?;
        let simple_crs = get(&get(&leaflet, "CRS")?, "Simple")?;
        Reflect::set(&options, &JsValue::from_str("crs"), &simple_crs)?;

        let map = call(&leaflet, "map", &[&JsValue::from_str(container_id), &options])?;
        call(
            &map,
            "setView",
            &[&to_js(&view_box.center())?, &JsValue::from_f64(INITIAL_ZOOM)],
        )?;

        Ok(Self {
            leaflet,
            map,
            document,
            shapes: HashMap::new(),
            layers: HashMap::new(),
            next_layer: 0,
        })
    }

    /// Mount the parsed map graphic as an interactive overlay.
    pub fn add_svg_overlay(&self, svg: &Element, bounds: &Bounds) -> Result<(), JsValue> {
        let options = to_js(&OverlayOptions {
            interactive: true,
            class_name: SVG_CLASS,
        })?;
        let svg: &JsValue = svg.as_ref();
        let overlay = call(&self.leaflet, "svgOverlay", &[svg, &to_js(bounds)?, &options])?;
        call(&overlay, "addTo", &[&self.map])?;
        Ok(())
    }

    /// Remember the element behind a catalog shape so its fill can change.
    pub fn register_shape(&mut self, id: &str, element: SvgElement) {
        self.shapes.insert(id.to_string(), element);
    }

    fn track(&mut self, layer: JsValue) -> LayerId {
        self.next_layer += 1;
        self.layers.insert(self.next_layer, layer);
        LayerId(self.next_layer)
    }

    fn try_add_marker(
        &mut self,
        at: [f64; 2],
        options: Option<&JsValue>,
    ) -> Result<LayerId, JsValue> {
        let latlng = to_js(&at)?;
        let marker = match options {
            Some(options) => call(&self.leaflet, "marker", &[&latlng, options])?,
            None => call(&self.leaflet, "marker", &[&latlng])?,
        };
        call(&marker, "addTo", &[&self.map])?;
        Ok(self.track(marker))
    }

    fn try_add_text(
        &mut self,
        kind: TextKind,
        at: [f64; 2],
        text: &str,
    ) -> Result<LayerId, JsValue> {
        let class_name = match kind {
            TextKind::Label => LABEL_CLASS,
            TextKind::Title => TITLE_CLASS,
        };
        let html = kmap_shared::markup::escape_html(text);
        let icon = call(
            &self.leaflet,
            "divIcon",
            &[&to_js(&DivIconOptions {
                class_name,
                html: &html,
            })?],
        )?;

        let options: JsValue = Object::new().into();
        Reflect::set(&options, &JsValue::from_str("icon"), &icon)?;
        Reflect::set(&options, &JsValue::from_str("interactive"), &JsValue::FALSE)?;
        Reflect::set(&options, &JsValue::from_str("keyboard"), &JsValue::FALSE)?;
        self.try_add_marker(at, Some(&options))
    }

    fn try_fit_bounds(&self, bounds: &Bounds, padding: f64) -> Result<(), JsValue> {
        let options: JsValue = Object::new().into();
        Reflect::set(
            &options,
            &JsValue::from_str("padding"),
            &to_js(&[padding, padding])?,
        )?;
        call(&self.map, "fitBounds", &[&to_js(bounds)?, &options])?;
        Ok(())
    }

    fn set_panel(&self, id: &str, update: impl FnOnce(&Element)) {
        match self.document.get_element_by_id(id) {
            Some(element) => update(&element),
            None => tracing::warn!(panel = id, "panel element not found"),
        }
    }
}

impl Surface for LeafletSurface {
    fn add_marker(&mut self, at: [f64; 2]) -> Option<LayerId> {
        self.try_add_marker(at, None)
            .map_err(|e| tracing::warn!(error = ?e, "failed to add marker"))
            .ok()
    }

    fn add_text(&mut self, kind: TextKind, at: [f64; 2], text: &str) -> Option<LayerId> {
        self.try_add_text(kind, at, text)
            .map_err(|e| tracing::warn!(error = ?e, text, "failed to add text layer"))
            .ok()
    }

    fn remove_layer(&mut self, id: LayerId) {
        let Some(layer) = self.layers.remove(&id.0) else {
            return;
        };
        if let Err(e) = call(&self.map, "removeLayer", &[&layer]) {
            tracing::warn!(error = ?e, "failed to remove layer");
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: f64) {
        if let Err(e) = self.try_fit_bounds(bounds, padding) {
            tracing::warn!(error = ?e, "failed to fit bounds");
        }
    }

    fn set_stats_title(&mut self, title: &str) {
        self.set_panel(STATS_TITLE_ID, |el| el.set_text_content(Some(title)));
    }

    fn set_stats_content(&mut self, markup: &str) {
        self.set_panel(STATS_CONTENT_ID, |el| el.set_inner_html(markup));
    }

    fn set_subunit_list(&mut self, markup: &str) {
        self.set_panel(SUBUNIT_LIST_ID, |el| el.set_inner_html(markup));
    }

    fn set_fill(&mut self, shape_id: &str, color: &str) {
        let Some(element) = self.shapes.get(shape_id) else {
            return;
        };
        if let Err(e) = element.style().set_property("fill", color) {
            tracing::warn!(shape = shape_id, error = ?e, "failed to set fill");
        }
    }
}
