mod adapter;
mod color_model;
pub mod types;

pub use adapter::SegmentationAdapter;
pub use color_model::ColorModelEngine;
pub use types::SegmentationEngine;

/// Create the default in-process engine.
pub fn create_default_engine(iterations: usize, smoothness: f64) -> Box<dyn SegmentationEngine> {
    Box::new(ColorModelEngine::new(iterations, smoothness))
}
