pub mod colors;
pub mod geometry;
pub mod level;
pub mod markup;
pub mod shape;
pub mod stats;
pub mod subunits;
pub mod text;

pub use colors::base_fill;
pub use geometry::*;
pub use level::*;
pub use shape::{Shape, ShapeCatalog};
pub use stats::{IndustryStats, StatsRecord, format_stats};
pub use subunits::{SubUnit, render_subunit_list};
pub use text::UiText;
