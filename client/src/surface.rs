use kmap_shared::Bounds;

/// Handle of a layer added to the map host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Text layers the controller places on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Name label of a shape at the labelled level.
    Label,
    /// Name of the selected shape, shown next to the selection marker.
    Title,
}

/// Everything the controller draws or writes. Implemented over Leaflet and
/// the page DOM in the browser, and by a recorder in tests.
pub trait Surface {
    /// Pin marker at a map point. `None` when the host rejected it.
    fn add_marker(&mut self, at: [f64; 2]) -> Option<LayerId>;
    fn add_text(&mut self, kind: TextKind, at: [f64; 2], text: &str) -> Option<LayerId>;
    fn remove_layer(&mut self, id: LayerId);
    fn fit_bounds(&mut self, bounds: &Bounds, padding: f64);
    fn set_stats_title(&mut self, title: &str);
    fn set_stats_content(&mut self, markup: &str);
    /// Replace the sub-unit list area; an empty string clears it.
    fn set_subunit_list(&mut self, markup: &str);
    fn set_fill(&mut self, shape_id: &str, color: &str);
}
