use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, DomParser, Element, Event, SupportedType, SvgElement};

use kmap_shared::subunits::{SUBUNIT_INDEX_ATTR, SUBUNIT_ITEM_CLASS};
use kmap_shared::{Shape, ShapeCatalog, ViewBox};

use crate::api::{self, HttpApi};
use crate::config::{MapConfig, SUBUNIT_LIST_ID};
use crate::controller::{Controller, handle_click};
use crate::dom::{self, LeafletSurface};

type SharedController = Rc<RefCell<Controller<LeafletSurface>>>;

fn js_err(e: wasm_bindgen::JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

/// Boot the map once the page DOM is ready.
pub fn start(config: MapConfig) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        tracing::error!("no document; map not started");
        return;
    };

    if document.ready_state() != "loading" {
        spawn_boot(config, document);
        return;
    }

    let doc = document.clone();
    let on_ready = Closure::once(move || spawn_boot(config, doc));
    if document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())
        .is_err()
    {
        tracing::error!("cannot wait for DOMContentLoaded; map not started");
        return;
    }
    on_ready.forget();
}

fn spawn_boot(config: MapConfig, document: Document) {
    spawn_local(async move {
        if let Err(e) = boot(config, document).await {
            tracing::error!(error = %e, "map failed to load");
        }
    });
}

async fn boot(config: MapConfig, document: Document) -> Result<(), String> {
    if config.map_url.trim().is_empty() {
        return Err("mapUrl is not configured".into());
    }

    let svg_text = api::fetch_text(&config.map_url).await?;
    let svg_root = parse_svg(&svg_text)?;
    let view_box = ViewBox::from_attribute(svg_root.get_attribute("viewBox").as_deref());
    tracing::info!(
        width = view_box.width,
        height = view_box.height,
        "map viewBox"
    );

    let mut surface =
        LeafletSurface::mount(document.clone(), &config.container_id, &view_box).map_err(js_err)?;
    surface
        .add_svg_overlay(&svg_root, &view_box.overlay_bounds())
        .map_err(js_err)?;

    // Shapes can only be measured once the overlay put them in the page.
    let (catalog, elements) = collect_shapes(&svg_root, view_box)?;
    for (id, element) in &elements {
        surface.register_shape(id, element.clone());
    }
    tracing::info!(shapes = catalog.len(), "map loaded");

    let api = Rc::new(HttpApi::from_config(&config));
    let controller: SharedController = Rc::new(RefCell::new(Controller::new(
        surface,
        catalog,
        config.labels.clone(),
        config.fit_padding,
    )));
    let labels = controller.borrow_mut().start();
    tracing::debug!(labels, "region labels drawn");

    for (id, element) in elements {
        bind_shape(&controller, &api, id, &element).map_err(js_err)?;
    }
    bind_subunit_list(&controller, &document).map_err(js_err)?;
    Ok(())
}

fn parse_svg(text: &str) -> Result<Element, String> {
    let parser = DomParser::new().map_err(js_err)?;
    let svg_doc = parser
        .parse_from_string(text, SupportedType::ImageSvgXml)
        .map_err(js_err)?;
    let root = svg_doc
        .document_element()
        .ok_or("map resource has no root element")?;
    if root.tag_name().eq_ignore_ascii_case("parsererror")
        || root.get_elements_by_tag_name("parsererror").length() > 0
    {
        return Err("map resource is not valid SVG".into());
    }
    Ok(root)
}

fn collect_shapes(
    svg_root: &Element,
    view_box: ViewBox,
) -> Result<(ShapeCatalog, Vec<(String, SvgElement)>), String> {
    let paths = svg_root.query_selector_all("path").map_err(js_err)?;
    let mut catalog = ShapeCatalog::new(view_box);
    let mut elements = Vec::with_capacity(paths.length() as usize);

    for idx in 0..paths.length() {
        let Some(element) = paths.get(idx).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let bbox = match dom::measure(&element) {
            Ok(bbox) => bbox,
            Err(e) => {
                tracing::warn!(id = ?element.get_attribute("id"), error = ?e, "cannot measure path");
                continue;
            }
        };
        match Shape::from_attributes(|name| element.get_attribute(name), bbox) {
            Ok(shape) => {
                tracing::debug!(
                    id = %shape.id,
                    display_name = ?shape.display_name,
                    "shape found"
                );
                let id = shape.id.clone();
                if let Some(old) = catalog.insert(shape) {
                    tracing::warn!(id = %old.id, "duplicate shape id, keeping the later one");
                }
                if let Ok(svg_element) = element.dyn_into::<SvgElement>() {
                    keep_latest(&mut elements, id, svg_element);
                }
            }
            Err(reason) => tracing::warn!(%reason, "path is not an interactive shape"),
        }
    }
    Ok((catalog, elements))
}

/// Record the element behind `id`, dropping an earlier element with the same
/// id so only the shape the catalog kept gets listeners.
fn keep_latest<T>(elements: &mut Vec<(String, T)>, id: String, element: T) {
    elements.retain(|(known, _)| *known != id);
    elements.push((id, element));
}

fn bind_shape(
    controller: &SharedController,
    api: &Rc<HttpApi>,
    id: String,
    element: &SvgElement,
) -> Result<(), wasm_bindgen::JsValue> {
    let on_click = {
        let controller = Rc::clone(controller);
        let api = Rc::clone(api);
        let id = id.clone();
        Closure::<dyn Fn(Event)>::new(move |event: Event| {
            event.stop_propagation();
            let controller = Rc::clone(&controller);
            let api = Rc::clone(&api);
            let id = id.clone();
            spawn_local(async move {
                handle_click(&controller, &*api, &id).await;
            });
        })
    };
    element.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_over = {
        let controller = Rc::clone(controller);
        let id = id.clone();
        Closure::<dyn Fn(Event)>::new(move |event: Event| {
            event.stop_propagation();
            if let Ok(mut ctrl) = controller.try_borrow_mut() {
                ctrl.pointer_enter(&id);
            }
        })
    };
    element.add_event_listener_with_callback("mouseover", on_over.as_ref().unchecked_ref())?;
    on_over.forget();

    let on_out = {
        let controller = Rc::clone(controller);
        Closure::<dyn Fn(Event)>::new(move |event: Event| {
            event.stop_propagation();
            if let Ok(mut ctrl) = controller.try_borrow_mut() {
                ctrl.pointer_leave(&id);
            }
        })
    };
    element.add_event_listener_with_callback("mouseout", on_out.as_ref().unchecked_ref())?;
    on_out.forget();
    Ok(())
}

/// One delegated listener pair on the list container; items are resolved by
/// their `data-index`.
fn bind_subunit_list(
    controller: &SharedController,
    document: &Document,
) -> Result<(), wasm_bindgen::JsValue> {
    let Some(list) = document.get_element_by_id(SUBUNIT_LIST_ID) else {
        tracing::warn!(panel = SUBUNIT_LIST_ID, "sub-unit list element not found");
        return Ok(());
    };

    let on_over = {
        let controller = Rc::clone(controller);
        Closure::<dyn Fn(Event)>::new(move |event: Event| {
            let Some(idx) = subunit_index(&event) else {
                return;
            };
            if let Ok(mut ctrl) = controller.try_borrow_mut() {
                ctrl.hover_subunit(idx);
            }
        })
    };
    list.add_event_listener_with_callback("mouseover", on_over.as_ref().unchecked_ref())?;
    on_over.forget();

    let on_out = {
        let controller = Rc::clone(controller);
        Closure::<dyn Fn(Event)>::new(move |event: Event| {
            if subunit_index(&event).is_none() {
                return;
            }
            if let Ok(mut ctrl) = controller.try_borrow_mut() {
                ctrl.unhover_subunit();
            }
        })
    };
    list.add_event_listener_with_callback("mouseout", on_out.as_ref().unchecked_ref())?;
    on_out.forget();
    Ok(())
}

fn subunit_index(event: &Event) -> Option<usize> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let item = target.closest(&format!(".{SUBUNIT_ITEM_CLASS}")).ok()??;
    item.get_attribute(SUBUNIT_INDEX_ATTR)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::keep_latest;

    #[test]
    fn duplicate_ids_keep_only_the_later_element() {
        let mut elements = Vec::new();
        keep_latest(&mut elements, "region-41".to_string(), "first");
        keep_latest(&mut elements, "district-4101".to_string(), "district");
        keep_latest(&mut elements, "region-41".to_string(), "second");

        assert_eq!(
            elements,
            vec![
                ("district-4101".to_string(), "district"),
                ("region-41".to_string(), "second"),
            ]
        );
    }
}
