mod file;

pub use file::ImageFileOutput;
#[cfg(test)]
pub use file::DEFAULT_OUTPUT_NAME;

use image::RgbImage;
use std::path::PathBuf;

use crate::error::SessionError;

/// Trait for preview destinations
pub trait OutputSink {
    /// Persist a preview frame, returning where it actually went.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<PathBuf, SessionError>;

    /// Target the next write will use.
    fn target(&self) -> PathBuf;
}
