// THEORY:
// The `SliceExtractor` is the top of the slicing layer. It owns a `SlicerConfig`
// and chains the three slicing stages for one composite sheet:
//
//   sheet -> contour_finder (boxes) -> slice_validator (accepted boxes) -> crop
//
// Key architectural principles:
// 1.  **Pure Function**: `extract` takes `&self` and a borrowed sheet and returns
//     owned slices. Nothing is cached between calls, so one extractor can be
//     shared across threads and sheets freely.
// 2.  **Deterministic Output**: Accepted boxes are sorted in reading order (top to
//     bottom, then left to right) before cropping. Slice numbers written by the
//     batch layer therefore follow the layout of the sheet.
// 3.  **Copy, Never Alias**: Every slice is an owned copy of its region.
// 4.  **Clamped Crops**: The margin can reach past the sheet edges. The crop
//     rectangle is intersected with the image and the slice is flagged as
//     clamped, instead of reading out of bounds.

use crate::config::SlicerConfig;
use crate::core_modules::bounding_box::{BoundingBox, Rect};
use crate::core_modules::contour_finder::contour_finder;
use crate::core_modules::slice_validator::validate_and_dedupe;
use image::RgbImage;
use image::imageops;

/// One brain slice cut out of a composite sheet.
#[derive(Debug, Clone)]
pub struct Slice {
    /// The accepted contour box, in sheet coordinates.
    pub bounding_box: BoundingBox,
    /// The rectangle actually copied, after margin growth and clamping.
    pub region: Rect,
    /// True when the grown box reached past the sheet and was clamped.
    pub clamped: bool,
    pub image: RgbImage,
}

/// Cuts `box` grown by `margin` out of `image`.
///
/// Returns `None` if nothing of the grown box lies inside the image.
pub fn crop(image: &RgbImage, bounding_box: &BoundingBox, margin: u32) -> Option<Slice> {
    let requested = bounding_box.expanded(margin);
    let region = requested.clamp_to(image.width(), image.height());
    if region.is_empty() {
        return None;
    }

    let clamped = region != requested;
    if clamped {
        log::warn!(
            "crop of {:?} with margin {} exceeds {}x{} sheet, clamped to {:?}",
            bounding_box,
            margin,
            image.width(),
            image.height(),
            region
        );
    }

    let cropped = imageops::crop_imm(
        image,
        region.x1 as u32,
        region.y1 as u32,
        region.width() as u32,
        region.height() as u32,
    )
    .to_image();

    Some(Slice {
        bounding_box: *bounding_box,
        region,
        clamped,
        image: cropped,
    })
}

/// Splits composite slice sheets into individual slices.
#[derive(Debug, Clone, Default)]
pub struct SliceExtractor {
    config: SlicerConfig,
}

impl SliceExtractor {
    pub fn new(config: SlicerConfig) -> Self {
        Self { config }
    }

    /// Contour boxes of the binarized sheet, in discovery order.
    pub fn binarize_and_find_boxes(&self, image: &RgbImage) -> Vec<BoundingBox> {
        contour_finder::binarize_and_find_boxes(image, self.config.binary_threshold, self.config.max_value)
    }

    /// Accepted slice boxes of the sheet, in reading order.
    pub fn slice_boxes(&self, image: &RgbImage) -> Vec<BoundingBox> {
        let boxes = self.binarize_and_find_boxes(image);
        let mut accepted = validate_and_dedupe(&boxes, &self.config);
        accepted.sort_by_key(BoundingBox::reading_order_key);
        accepted
    }

    /// All slices of the sheet, in reading order.
    pub fn extract(&self, image: &RgbImage) -> Vec<Slice> {
        let boxes = self.slice_boxes(image);
        let slices: Vec<Slice> = boxes
            .iter()
            .filter_map(|bounding_box| {
                let slice = crop(image, bounding_box, self.config.margin);
                if slice.is_none() {
                    log::warn!("skipping {:?}: crop region lies outside the sheet", bounding_box);
                }
                slice
            })
            .collect();
        log::debug!("extracted {} slices from {} accepted boxes", slices.len(), boxes.len());
        slices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect as DrawRect;

    const SLICE_COLOR: Rgb<u8> = Rgb([180, 180, 180]);

    fn draw(image: &mut RgbImage, x: i32, y: i32, width: u32, height: u32) {
        draw_filled_rect_mut(image, DrawRect::at(x, y).of_size(width, height), SLICE_COLOR);
    }

    #[test]
    fn unclamped_crop_adds_margin_on_every_side() {
        let image = RgbImage::new(200, 200);
        let slice = crop(&image, &BoundingBox::new(50, 60, 30, 20), 15).expect("inside");
        assert!(!slice.clamped);
        assert_eq!(slice.image.dimensions(), (30 + 2 * 15, 20 + 2 * 15));
        assert_eq!(slice.region, Rect { x1: 35, y1: 45, x2: 95, y2: 95 });
    }

    #[test]
    fn crop_copies_the_source_pixels() {
        let mut image = RgbImage::new(100, 100);
        image.put_pixel(40, 40, Rgb([1, 2, 3]));
        let slice = crop(&image, &BoundingBox::new(30, 30, 20, 20), 5).expect("inside");
        assert_eq!(slice.image.get_pixel(15, 15), &Rgb([1, 2, 3]));
    }

    #[test]
    fn crop_near_edge_is_clamped() {
        let image = RgbImage::new(100, 80);
        let slice = crop(&image, &BoundingBox::new(5, 70, 20, 10), 15).expect("partly inside");
        assert!(slice.clamped);
        assert_eq!(slice.region, Rect { x1: 0, y1: 55, x2: 40, y2: 80 });
        assert_eq!(slice.image.dimensions(), (40, 25));
    }

    #[test]
    fn crop_fully_outside_is_skipped() {
        let image = RgbImage::new(10, 10);
        assert!(crop(&image, &BoundingBox::new(50, 50, 10, 10), 5).is_none());
    }

    #[test]
    fn slices_come_out_in_reading_order() {
        let mut sheet = RgbImage::new(400, 300);
        draw(&mut sheet, 220, 30, 60, 60);
        draw(&mut sheet, 40, 160, 60, 60);
        draw(&mut sheet, 40, 30, 60, 60);
        draw(&mut sheet, 220, 160, 60, 60);

        let extractor = SliceExtractor::default();
        let slices = extractor.extract(&sheet);
        let origins: Vec<(u32, u32)> = slices.iter().map(|s| (s.bounding_box.x, s.bounding_box.y)).collect();
        assert_eq!(origins, vec![(40, 30), (220, 30), (40, 160), (220, 160)]);
        assert!(slices.iter().all(|s| s.image.dimensions() == (90, 90) && !s.clamped));
    }

    #[test]
    fn slices_touching_sheet_edges_are_found_and_clamped() {
        let mut sheet = RgbImage::new(400, 300);
        draw(&mut sheet, 170, 0, 60, 60); // top
        draw(&mut sheet, 0, 120, 60, 60); // left
        draw(&mut sheet, 170, 120, 60, 60); // interior
        draw(&mut sheet, 340, 120, 60, 60); // right
        draw(&mut sheet, 170, 240, 60, 60); // bottom

        let slices = SliceExtractor::default().extract(&sheet);
        let found: Vec<(BoundingBox, bool, Rect, (u32, u32))> = slices
            .iter()
            .map(|s| (s.bounding_box, s.clamped, s.region, s.image.dimensions()))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    BoundingBox::new(170, 0, 60, 60),
                    true,
                    Rect { x1: 155, y1: 0, x2: 245, y2: 75 },
                    (90, 75)
                ),
                (
                    BoundingBox::new(0, 120, 60, 60),
                    true,
                    Rect { x1: 0, y1: 105, x2: 75, y2: 195 },
                    (75, 90)
                ),
                (
                    BoundingBox::new(170, 120, 60, 60),
                    false,
                    Rect { x1: 155, y1: 105, x2: 245, y2: 195 },
                    (90, 90)
                ),
                (
                    BoundingBox::new(340, 120, 60, 60),
                    true,
                    Rect { x1: 325, y1: 105, x2: 400, y2: 195 },
                    (75, 90)
                ),
                (
                    BoundingBox::new(170, 240, 60, 60),
                    true,
                    Rect { x1: 155, y1: 225, x2: 245, y2: 300 },
                    (90, 75)
                ),
            ]
        );
    }

    #[test]
    fn left_edge_slice_keeps_later_slices() {
        let mut sheet = RgbImage::new(300, 200);
        draw(&mut sheet, 0, 40, 90, 100);
        draw(&mut sheet, 150, 40, 90, 100);

        assert_eq!(
            SliceExtractor::default().slice_boxes(&sheet),
            vec![BoundingBox::new(0, 40, 90, 100), BoundingBox::new(150, 40, 90, 100)]
        );
    }

    #[test]
    fn sheet_frame_is_too_large_to_be_a_slice() {
        let mut sheet = RgbImage::new(600, 400);
        draw(&mut sheet, 0, 0, 600, 4);
        draw(&mut sheet, 0, 396, 600, 4);
        draw(&mut sheet, 0, 0, 4, 400);
        draw(&mut sheet, 596, 0, 4, 400);

        assert!(SliceExtractor::default().slice_boxes(&sheet).is_empty());
    }

    #[test]
    fn specks_are_too_small_to_be_slices() {
        let mut sheet = RgbImage::new(400, 200);
        draw(&mut sheet, 50, 50, 80, 80);
        draw(&mut sheet, 300, 20, 3, 3);
        draw(&mut sheet, 350, 150, 40, 6);

        assert_eq!(
            SliceExtractor::default().slice_boxes(&sheet),
            vec![BoundingBox::new(50, 50, 80, 80)]
        );
    }

    #[test]
    fn split_slice_keeps_its_largest_piece() {
        let mut sheet = RgbImage::new(300, 200);
        // One slice broken by a 5 px dark gap into a large and a small piece.
        draw(&mut sheet, 50, 50, 60, 80);
        draw(&mut sheet, 115, 50, 20, 80);

        let extractor = SliceExtractor::default();
        assert_eq!(extractor.slice_boxes(&sheet), vec![BoundingBox::new(50, 50, 60, 80)]);
    }
}
