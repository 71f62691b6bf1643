mod composite;
mod overlay;

pub use composite::composite;
pub use overlay::{stroke_color, Canvas};
