use kmap_shared::{Level, ShapeCatalog};

use crate::surface::{LayerId, Surface, TextKind};

/// Owns the name labels currently on the map. Every refresh removes all of
/// them before drawing the requested level.
#[derive(Debug, Default)]
pub struct LabelRenderer {
    active: Vec<LayerId>,
    level: Option<Level>,
}

impl LabelRenderer {
    #[cfg(test)]
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn clear<S: Surface>(&mut self, surface: &mut S) {
        let removed = self.active.len();
        for id in self.active.drain(..) {
            surface.remove_layer(id);
        }
        if let Some(level) = self.level.take() {
            tracing::trace!(%level, removed, "labels cleared");
        }
    }

    /// Label every named shape at `level` at its centroid. Returns the number
    /// of labels drawn.
    pub fn refresh<S: Surface>(
        &mut self,
        surface: &mut S,
        catalog: &ShapeCatalog,
        level: Level,
    ) -> usize {
        self.clear(surface);

        let svg_height = catalog.svg_height();
        let mut skipped = 0usize;
        for shape in catalog.at_level(level) {
            let Some(name) = shape.display_name.as_deref() else {
                skipped += 1;
                tracing::debug!(shape = %shape.id, "no display_name, label skipped");
                continue;
            };
            if let Some(id) = surface.add_text(TextKind::Label, shape.centroid(svg_height), name) {
                self.active.push(id);
            }
        }
        self.level = Some(level);

        tracing::debug!(%level, labels = self.active.len(), skipped, "labels refreshed");
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use kmap_shared::{BBox, Shape, ViewBox};

    use super::*;
    use crate::surface::testing::RecordingSurface;

    fn shape(id: &str, name: Option<&str>, bbox: BBox) -> Shape {
        Shape::from_attributes(
            |attr| match attr {
                "id" => Some(id.to_string()),
                "display_name" => name.map(str::to_string),
                _ => None,
            },
            bbox,
        )
        .expect("shape")
    }

    fn catalog() -> ShapeCatalog {
        let mut catalog = ShapeCatalog::new(ViewBox::default());
        catalog.insert(shape("region-41", Some("Chüy"), BBox::new(100.0, 50.0, 200.0, 150.0)));
        catalog.insert(shape("region-42", None, BBox::new(0.0, 0.0, 10.0, 10.0)));
        catalog.insert(shape("district-4101", Some("Alamüdün"), BBox::new(120.0, 60.0, 40.0, 40.0)));
        catalog
    }

    #[test]
    fn labels_named_shapes_at_their_centroid() {
        let catalog = catalog();
        let mut surface = RecordingSurface::default();
        let mut labels = LabelRenderer::default();

        assert_eq!(labels.refresh(&mut surface, &catalog, Level::Region), 1);
        assert_eq!(
            surface.texts(TextKind::Label),
            vec![("Chüy".to_string(), [875.0, 200.0])]
        );
        assert_eq!(labels.level(), Some(Level::Region));
    }

    #[test]
    fn refresh_replaces_previous_labels() {
        let catalog = catalog();
        let mut surface = RecordingSurface::default();
        let mut labels = LabelRenderer::default();

        labels.refresh(&mut surface, &catalog, Level::Region);
        labels.refresh(&mut surface, &catalog, Level::District);
        labels.refresh(&mut surface, &catalog, Level::District);

        let texts = surface.texts(TextKind::Label);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "Alamüdün");
        assert_eq!(surface.removed, 2);
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let catalog = catalog();
        let mut surface = RecordingSurface::default();
        let mut labels = LabelRenderer::default();

        labels.refresh(&mut surface, &catalog, Level::Region);
        labels.clear(&mut surface);
        assert!(surface.layers.is_empty());
        assert_eq!(labels.level(), None);
    }
}
