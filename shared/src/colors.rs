use crate::shape::Shape;

/// Fill applied while the pointer is over a shape.
pub const HIGHLIGHT_FILL: &str = "#CA9E67";
/// Resting fill of the capital-city shape.
pub const CAPITAL_FILL: &str = "#1e3a8a";
/// Resting fill of every other shape.
pub const DEFAULT_FILL: &str = "#022068";

pub fn base_fill(shape: &Shape) -> &'static str {
    if shape.capital {
        CAPITAL_FILL
    } else {
        DEFAULT_FILL
    }
}
