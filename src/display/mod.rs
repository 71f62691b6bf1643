mod window;

pub use window::WindowDisplay;

use anyhow::Result;
use image::RgbImage;

use crate::interaction::InputEvent;

/// Trait for input event sources
pub trait EventSource {
    /// Block until the next event. `None` means the source is exhausted.
    fn next_event(&mut self) -> Result<Option<InputEvent>>;
}

/// Trait for render targets
pub trait FrameSink {
    /// Show the working overlay and, once available, the preview.
    fn present(&mut self, working: &RgbImage, preview: Option<&RgbImage>) -> Result<()>;

    /// Report a user-facing status message.
    fn status(&mut self, message: &str);
}

/// Pack RGB into minifb's 0x00RRGGBB words.
pub fn to_argb_words(image: &RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}
