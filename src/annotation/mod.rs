mod model;
pub mod types;

pub use model::{disc_cells, AnnotationModel, LabelMask};
pub use types::{BrushMode, Label, Point, Rect};
