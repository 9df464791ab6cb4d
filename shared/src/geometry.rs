use serde::{Deserialize, Serialize};

pub const DEFAULT_VIEW_SIZE: f64 = 1000.0;

/// Axis-aligned box in SVG pixel space (origin top-left, Y down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Two `[y, x]` corners in map space (origin bottom-left, Y up).
///
/// Serializes as `[[y1, x1], [y2, x2]]`, which is what the map host expects
/// for its simple (non-geographic) coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct Bounds {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl Bounds {
    pub const fn new(start: [f64; 2], end: [f64; 2]) -> Self {
        Self { start, end }
    }

    /// Flip a top-left-origin box into map space using the canvas height.
    pub fn from_bbox(bbox: &BBox, svg_height: f64) -> Self {
        Self {
            start: [svg_height - (bbox.y + bbox.height), bbox.x],
            end: [svg_height - bbox.y, bbox.x + bbox.width],
        }
    }

    /// Inverse of [`Bounds::from_bbox`] for the same `svg_height`.
    pub fn to_bbox(&self, svg_height: f64) -> BBox {
        BBox {
            x: self.start[1],
            y: svg_height - self.end[0],
            width: self.end[1] - self.start[1],
            height: self.end[0] - self.start[0],
        }
    }

    pub fn centroid(&self) -> [f64; 2] {
        [
            (self.start[0] + self.end[0]) / 2.0,
            (self.start[1] + self.end[1]) / 2.0,
        ]
    }

    pub fn contains(&self, point: [f64; 2]) -> bool {
        let (y_lo, y_hi) = ordered(self.start[0], self.end[0]);
        let (x_lo, x_hi) = ordered(self.start[1], self.end[1]);
        point[0] >= y_lo && point[0] <= y_hi && point[1] >= x_lo && point[1] <= x_hi
    }

    pub const fn as_array(&self) -> [[f64; 2]; 2] {
        [self.start, self.end]
    }
}

impl From<[[f64; 2]; 2]> for Bounds {
    fn from(corners: [[f64; 2]; 2]) -> Self {
        Self {
            start: corners[0],
            end: corners[1],
        }
    }
}

impl From<Bounds> for [[f64; 2]; 2] {
    fn from(bounds: Bounds) -> Self {
        bounds.as_array()
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Declared view dimensions of the source graphic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: DEFAULT_VIEW_SIZE,
            height: DEFAULT_VIEW_SIZE,
        }
    }
}

impl ViewBox {
    /// Parse a `viewBox` attribute (`minX minY width height`, whitespace or
    /// comma separated). Returns `None` unless all four numbers are present
    /// and the size is positive.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<f64>().ok());

        let min_x = parts.next()??;
        let min_y = parts.next()??;
        let width = parts.next()??;
        let height = parts.next()??;
        if parts.next().is_some() || !(width > 0.0 && height > 0.0) {
            return None;
        }
        Some(Self {
            min_x,
            min_y,
            width,
            height,
        })
    }

    /// Parse an optional attribute, falling back to a 1000x1000 canvas.
    pub fn from_attribute(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    /// Map-space rectangle the whole graphic is mounted into.
    pub const fn overlay_bounds(&self) -> Bounds {
        Bounds {
            start: [0.0, 0.0],
            end: [self.height, self.width],
        }
    }

    pub fn center(&self) -> [f64; 2] {
        self.overlay_bounds().centroid()
    }
}
