use ndarray::Array2;

use super::types::{Label, Point, Rect};
use crate::error::SessionError;

/// Per-pixel labels, indexed `[[y, x]]`. Dimensions are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMask {
    cells: Array2<Label>,
}

impl LabelMask {
    /// All cells start as `Background`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: Array2::from_elem((height as usize, width as usize), Label::Background),
        }
    }

    pub fn width(&self) -> u32 {
        self.cells.ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.cells.nrows() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> Label {
        self.cells[[y as usize, x as usize]]
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        self.cells[[y as usize, x as usize]] = label;
    }

    #[cfg(test)]
    pub fn fill(&mut self, label: Label) {
        self.cells.fill(label);
    }

    pub fn count(&self, label: Label) -> usize {
        self.cells.iter().filter(|&&l| l == label).count()
    }

    pub fn cells(&self) -> &Array2<Label> {
        &self.cells
    }

    /// Paint a filled disc, clipped to the mask.
    pub fn stamp_disc(&mut self, center: Point, radius: i32, label: Label) {
        for (x, y) in disc_cells(center, radius, self.width(), self.height()) {
            self.set(x, y, label);
        }
    }
}

/// In-bounds cells of a filled disc of `radius` around `center`.
///
/// Only the part of the bounding box inside the image is scanned.
pub fn disc_cells(
    center: Point,
    radius: i32,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (u32, u32)> {
    let r = radius.max(0) as i64;
    let (cx, cy) = (center.x as i64, center.y as i64);
    let xs = (cx - r).max(0)..=(cx + r).min(width as i64 - 1);
    let ys = (cy - r).max(0)..=(cy + r).min(height as i64 - 1);
    ys.flat_map(move |y| {
        xs.clone().filter_map(move |x| {
            let (dx, dy) = (x - cx, y - cy);
            (dx * dx + dy * dy <= r * r).then_some((x as u32, y as u32))
        })
    })
}

/// Rectangle of interest plus label mask; the single source of truth the
/// interaction handlers mutate.
#[derive(Debug, Clone)]
pub struct AnnotationModel {
    rect: Rect,
    rect_frozen: bool,
    mask: LabelMask,
}

impl AnnotationModel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            rect: Rect::default(),
            rect_frozen: false,
            mask: LabelMask::new(width, height),
        }
    }

    pub fn set_rectangle(&mut self, rect: Rect) -> Result<(), SessionError> {
        if self.rect_frozen {
            return Err(SessionError::InvalidPhase("set_rectangle"));
        }
        self.rect = rect;
        Ok(())
    }

    /// Freeze the rectangle; later `set_rectangle` calls fail.
    pub fn freeze_rectangle(&mut self) {
        self.rect_frozen = true;
    }

    pub fn stamp_label(&mut self, center: Point, radius: i32, label: Label) {
        self.mask.stamp_disc(center, radius, label);
    }

    /// Install an engine result. The dimensions must match.
    pub fn replace_mask(&mut self, mask: LabelMask) -> Result<(), SessionError> {
        if mask.dimensions() != self.mask.dimensions() {
            return Err(SessionError::SegmentationFailed(format!(
                "mask is {:?}, expected {:?}",
                mask.dimensions(),
                self.mask.dimensions()
            )));
        }
        self.mask = mask;
        Ok(())
    }

    pub fn current_mask(&self) -> &LabelMask {
        &self.mask
    }

    pub fn current_rectangle(&self) -> Rect {
        self.rect
    }
}
