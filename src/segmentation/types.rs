use anyhow::Result;
use image::RgbImage;

use crate::annotation::{LabelMask, Rect};

/// How an engine call seeds its colour models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Overwrite the mask from the rectangle: outside is background,
    /// inside is probable foreground.
    Rect,
    /// Use the mask as given, including user scribbles.
    Mask,
}

/// Trait for foreground extraction engines.
/// Allows swapping the in-process colour model for a bound graph-cut library.
pub trait SegmentationEngine {
    /// Run one refinement round, updating `mask` in place.
    ///
    /// `rect` is only read for `InitMode::Rect`. Implementations must keep
    /// the mask dimensions and must not relabel definite cells in
    /// `InitMode::Mask`. Errors leave no guarantee about `mask` contents;
    /// callers pass a scratch copy.
    fn segment(
        &mut self,
        image: &RgbImage,
        mask: &mut LabelMask,
        rect: Rect,
        mode: InitMode,
    ) -> Result<()>;

    fn name(&self) -> &str;
}
