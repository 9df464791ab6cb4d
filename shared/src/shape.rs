use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Bounds, ViewBox};
use crate::level::{Level, ShapeKey};

pub const ATTR_ID: &str = "id";
pub const ATTR_LEVEL: &str = "data-level";
pub const ATTR_CODE: &str = "code";
pub const ATTR_DISPLAY_NAME: &str = "display_name";
pub const ATTR_CAPITAL: &str = "data_bishkek";

/// A clickable area of the vector map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// DOM id of the source element.
    pub id: String,
    pub key: ShapeKey,
    pub display_name: Option<String>,
    pub bbox: BBox,
    /// Capital-city override for the resting fill.
    #[serde(default)]
    pub capital: bool,
}

impl Shape {
    /// Build a shape from its element attributes and measured box.
    ///
    /// Explicit `data-level` / `code` attributes win; otherwise both come
    /// from the `id` split on its first hyphen. Shapes at country level are
    /// rejected since the country is the canvas itself.
    pub fn from_attributes<F>(attr: F, bbox: BBox) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let id = attr(ATTR_ID).unwrap_or_default();
        let from_id = ShapeKey::parse(&id);

        let level = match attr(ATTR_LEVEL) {
            Some(raw) => raw.parse::<Level>()?,
            None => from_id
                .as_ref()
                .map(|key| key.level)
                .ok_or_else(|| format!("shape {id:?} has no level"))?,
        };
        if level == Level::Country {
            return Err(format!("shape {id:?} is tagged as country"));
        }

        let code = attr(ATTR_CODE)
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .or_else(|| from_id.map(|key| key.code))
            .unwrap_or_default();
        let key = ShapeKey::new(level, code);

        let display_name = attr(ATTR_DISPLAY_NAME)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let capital = attr(ATTR_CAPITAL).is_some_and(|raw| is_truthy(&raw));

        Ok(Self {
            id: if id.is_empty() { key.to_string() } else { id },
            key,
            display_name,
            bbox,
            capital,
        })
    }

    pub const fn level(&self) -> Level {
        self.key.level
    }

    pub fn bounds(&self, svg_height: f64) -> Bounds {
        Bounds::from_bbox(&self.bbox, svg_height)
    }

    pub fn centroid(&self, svg_height: f64) -> [f64; 2] {
        self.bounds(svg_height).centroid()
    }

    /// Display name, or `fallback` for unnamed shapes.
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(fallback)
    }
}

fn is_truthy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    !matches!(normalized.as_str(), "" | "0" | "false")
}

/// All shapes of one loaded map, in document order.
#[derive(Debug, Clone, Default)]
pub struct ShapeCatalog {
    view_box: ViewBox,
    shapes: Vec<Shape>,
    index: HashMap<String, usize>,
}

impl ShapeCatalog {
    pub fn new(view_box: ViewBox) -> Self {
        Self {
            view_box,
            shapes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a shape. A later shape with an existing id replaces the earlier
    /// one in place and the replaced shape is returned.
    pub fn insert(&mut self, shape: Shape) -> Option<Shape> {
        if let Some(&idx) = self.index.get(&shape.id) {
            return Some(std::mem::replace(&mut self.shapes[idx], shape));
        }
        self.index.insert(shape.id.clone(), self.shapes.len());
        self.shapes.push(shape);
        None
    }

    pub const fn view_box(&self) -> &ViewBox {
        &self.view_box
    }

    pub const fn svg_height(&self) -> f64 {
        self.view_box.height
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.index.get(id).map(|&idx| &self.shapes[idx])
    }

    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(move |shape| shape.level() == level)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
