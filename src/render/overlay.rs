use image::{Rgb, RgbImage};

use crate::annotation::{disc_cells, Label, Point, Rect};

const RECT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const RECT_THICKNESS: i32 = 2;

/// Scribble colour on the working image: black for background strokes,
/// white for foreground strokes.
pub fn stroke_color(label: Label) -> Rgb<u8> {
    if label.is_foreground() {
        Rgb([255, 255, 255])
    } else {
        Rgb([0, 0, 0])
    }
}

/// The annotated working image shown in the input window.
///
/// Presentation only; segmentation never reads it.
pub struct Canvas {
    working: RgbImage,
}

impl Canvas {
    pub fn new(original: &RgbImage) -> Self {
        Self {
            working: original.clone(),
        }
    }

    /// Restore the pristine image, dropping every overlay.
    pub fn reset(&mut self, original: &RgbImage) {
        self.working.clone_from(original);
    }

    pub fn outline_rect(&mut self, rect: Rect) {
        // edges off the image stay off it, so the line walk stays short
        let (w, h) = (self.working.width() as i32, self.working.height() as i32);
        let clip_x = |v: i32| v.clamp(-RECT_THICKNESS, w.saturating_add(RECT_THICKNESS));
        let clip_y = |v: i32| v.clamp(-RECT_THICKNESS, h.saturating_add(RECT_THICKNESS));
        let (x0, y0) = (clip_x(rect.x), clip_y(rect.y));
        let (x1, y1) = (clip_x(rect.right()), clip_y(rect.bottom()));
        for t in -(RECT_THICKNESS / 2)..(RECT_THICKNESS - RECT_THICKNESS / 2) {
            self.line(x0 - t, y0 - t, x1 + t, y0 - t);
            self.line(x1 + t, y0 - t, x1 + t, y1 + t);
            self.line(x1 + t, y1 + t, x0 - t, y1 + t);
            self.line(x0 - t, y1 + t, x0 - t, y0 - t);
        }
    }

    pub fn stamp(&mut self, center: Point, radius: i32, color: Rgb<u8>) {
        let (w, h) = self.working.dimensions();
        for (x, y) in disc_cells(center, radius, w, h) {
            self.working.put_pixel(x, y, color);
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.working
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: Rgb<u8>) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.working.width() || y >= self.working.height() {
            return;
        }
        self.working.put_pixel(x, y, color);
    }

    /// Bresenham line, clipped per pixel.
    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, RECT_COLOR);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}
