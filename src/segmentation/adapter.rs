use image::RgbImage;

use super::types::{InitMode, SegmentationEngine};
use crate::annotation::{Label, LabelMask, Rect};
use crate::error::SessionError;

/// Stable call contract in front of an engine:
/// `refine(image, mask, rect, initialized) -> mask'`.
///
/// The engine works on a copy, so a failed call leaves the caller's mask
/// untouched.
pub struct SegmentationAdapter {
    engine: Box<dyn SegmentationEngine>,
    calls: usize,
}

impl SegmentationAdapter {
    pub fn new(engine: Box<dyn SegmentationEngine>) -> Self {
        Self { engine, calls: 0 }
    }

    pub fn refine(
        &mut self,
        image: &RgbImage,
        mask: &LabelMask,
        rect: Rect,
        initialized: bool,
    ) -> Result<LabelMask, SessionError> {
        if image.dimensions() != mask.dimensions() {
            return Err(SessionError::SegmentationFailed(format!(
                "image is {:?} but mask is {:?}",
                image.dimensions(),
                mask.dimensions()
            )));
        }

        let mode = if initialized {
            InitMode::Mask
        } else {
            InitMode::Rect
        };

        let _span = tracing::debug_span!("refine", engine = self.engine.name(), ?mode).entered();
        self.calls += 1;

        let mut working = mask.clone();
        self.engine
            .segment(image, &mut working, rect, mode)
            .map_err(|e| SessionError::SegmentationFailed(format!("{e:#}")))?;

        if working.dimensions() != mask.dimensions() {
            return Err(SessionError::SegmentationFailed(format!(
                "engine returned a {:?} mask for a {:?} image",
                working.dimensions(),
                mask.dimensions()
            )));
        }

        tracing::debug!(
            call = self.calls,
            foreground =
                working.count(Label::Foreground) + working.count(Label::ProbableForeground),
            "refinement finished"
        );
        Ok(working)
    }

    /// Number of engine invocations so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls
    }
}
