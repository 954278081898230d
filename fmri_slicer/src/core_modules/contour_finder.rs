// THEORY:
// The `ContourFinder` is the first stage of the slicing layer. A slice sheet is
// mostly black background with several bright brain slices laid out on it, so a
// single global intensity threshold separates "slice" from "not slice" well.
//
// Algorithm steps:
// 1.  **Binarization**: Every pixel's Rec. 601 luma is compared against the
//     configured threshold; strictly brighter pixels become `max_value`, all
//     others 0.
// 2.  **External Contour Tracing**: Borders are traced with
//     `imageproc::contours::find_contours` (Suzuki-Abe border following). Only
//     outer borders without a parent are kept: holes, and islands inside holes,
//     belong to the slice that surrounds them. The mask is traced inside a
//     1 px background frame: `find_contours` misclassifies regions that touch
//     the left image column, and once one is misread every later region gets
//     it as a parent.
// 3.  **Bounding Boxes**: Each kept contour collapses into the smallest
//     axis-aligned box containing all of its border points.
//
// The stage is stateless: one sheet in, one list of boxes out, in raster
// discovery order.

use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::masks::luminance_mask;
use image::{GrayImage, RgbImage, imageops};
use imageproc::contours::{BorderType, Contour, find_contours};

pub mod contour_finder {
    use super::*;

    /// Thresholds the sheet's luma: strictly above `threshold` becomes `max_value`.
    pub fn binarize(image: &RgbImage, threshold: u8, max_value: u8) -> GrayImage {
        luminance_mask(image, threshold, max_value)
    }

    /// Boxes around every outermost foreground region of an already-binary mask.
    pub fn external_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
        let contours: Vec<Contour<u32>> = find_contours(&framed(mask));
        contours
            .iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .filter_map(bounding_rect)
            .collect()
    }

    /// Copy of `mask` inside a 1 px background border.
    fn framed(mask: &GrayImage) -> GrayImage {
        let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut framed, mask, 1, 1);
        framed
    }

    /// Binarizes the sheet and returns one box per external contour.
    pub fn binarize_and_find_boxes(image: &RgbImage, threshold: u8, max_value: u8) -> Vec<BoundingBox> {
        let mask = binarize(image, threshold, max_value);
        let boxes = external_boxes(&mask);
        log::debug!(
            "found {} external contours on {}x{} sheet",
            boxes.len(),
            image.width(),
            image.height()
        );
        boxes
    }

    fn bounding_rect(contour: &Contour<u32>) -> Option<BoundingBox> {
        let first = contour.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &contour.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        // Border points lie on foreground pixels, so they are at least 1 in the framed mask.
        Some(BoundingBox::new(min_x - 1, min_y - 1, max_x - min_x + 1, max_y - min_y + 1))
    }
}
