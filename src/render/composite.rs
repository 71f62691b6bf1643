use image::{Rgb, RgbImage};

use crate::annotation::LabelMask;

/// Foreground-only preview: source colour where the mask is definite or
/// probable foreground, black elsewhere.
///
/// Pure function of its inputs. Cells outside the mask count as background.
pub fn composite(image: &RgbImage, mask: &LabelMask) -> RgbImage {
    let (mask_w, mask_h) = mask.dimensions();
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if x < mask_w && y < mask_h && mask.get(x, y).is_foreground() {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}
