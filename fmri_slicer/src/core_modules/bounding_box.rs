// THEORY:
// `BoundingBox` is the geometric currency of the slicing layer. Every contour
// found on a sheet is summarized as one axis-aligned box, and every later
// decision (size filtering, overlap resolution, cropping) is phrased in terms of
// these boxes.
//
// Key architectural principles:
// 1.  **Value Semantics**: A box is a plain `(x, y, width, height)` tuple. Two boxes
//     with identical coordinates are the same entity, which is why the type is
//     `Copy + Eq + Hash` and nothing else identifies it.
// 2.  **Signed Corners**: Margin expansion can push a corner past the sheet origin,
//     so corner math is done in `i64` through `Rect`. Clamping back into the image
//     happens only at crop time.
// 3.  **Stateless Data Container**: Like `Pixel`, a box knows how to describe
//     itself (area, corners, overlap) but has no idea which set it belongs to.

/// A box in source-image pixel coordinates: top-left corner plus extent.
/// `width` and `height` are always positive for boxes derived from contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Corner-form rectangle `[x1, y1, x2, y2)` with signed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Rect {
    /// Two rectangles overlap iff their intersection has strictly positive
    /// width and height. Touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        let dx = self.x2.min(other.x2) - self.x1.max(other.x1);
        let dy = self.y2.min(other.y2) - self.y1.max(other.y1);
        dx > 0 && dy > 0
    }

    pub fn width(&self) -> i64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i64 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Intersects this rectangle with `[0, width) x [0, height)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        Rect {
            x1: self.x1.clamp(0, width as i64),
            y1: self.y1.clamp(0, height as i64),
            x2: self.x2.clamp(0, width as i64),
            y2: self.y2.clamp(0, height as i64),
        }
    }
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The unexpanded corner form of this box.
    pub fn rect(&self) -> Rect {
        self.expanded(0)
    }

    /// The corner form grown by `margin` pixels on every side.
    pub fn expanded(&self, margin: u32) -> Rect {
        let margin = margin as i64;
        Rect {
            x1: self.x as i64 - margin,
            y1: self.y as i64 - margin,
            x2: self.x as i64 + self.width as i64 + margin,
            y2: self.y as i64 + self.height as i64 + margin,
        }
    }

    /// Key used to give slices a reproducible top-to-bottom, left-to-right order.
    pub fn reading_order_key(&self) -> (u32, u32, u32, u32) {
        (self.y, self.x, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let left = BoundingBox::new(0, 0, 10, 10).rect();
        let right = BoundingBox::new(10, 0, 10, 10).rect();
        assert!(!left.overlaps(&right));
        assert!(!right.overlaps(&left));
    }

    #[test]
    fn margin_turns_a_gap_into_an_overlap() {
        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(20, 0, 10, 10);
        assert!(!a.rect().overlaps(&b.rect()));
        assert!(!b.expanded(10).overlaps(&a.rect()));
        assert!(b.expanded(11).overlaps(&a.rect()));
    }

    #[test]
    fn expansion_can_go_negative() {
        let rect = BoundingBox::new(3, 4, 10, 10).expanded(15);
        assert_eq!(rect, Rect { x1: -12, y1: -11, x2: 28, y2: 29 });
    }

    #[test]
    fn clamping_keeps_rect_inside_image() {
        let rect = BoundingBox::new(3, 4, 10, 10).expanded(15).clamp_to(20, 100);
        assert_eq!(rect, Rect { x1: 0, y1: 0, x2: 20, y2: 29 });
        assert!(!rect.is_empty());
    }

    #[test]
    fn area_does_not_overflow() {
        assert_eq!(BoundingBox::new(0, 0, u32::MAX, 2).area(), u32::MAX as u64 * 2);
    }
}
