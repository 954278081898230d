// THEORY:
// Activation maps are rendered onto greyscale anatomy in color, so "is this pixel
// part of an activation?" reduces to "is this pixel saturated?". Grey anatomy has
// zero HSV saturation no matter how bright it is.
//
// This module holds the per-pixel masks both layers threshold with:
// - the luma mask (strictly brighter than a threshold), used to binarize sheets
//   and to re-threshold visualizations,
// - the binary saturation mask (255 where saturation >= threshold, else 0), and
// - the two-color visualization: highlight color on the mask, black elsewhere,
//   in the same RGB space as the input slice.

use crate::core_modules::pixel::pixel::Pixel;
use image::{GrayImage, Luma, Rgb, RgbImage};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Binary mask of pixels whose HSV saturation is at least `threshold`.
pub fn saturation_mask(image: &RgbImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if Pixel::from(image.get_pixel(x, y)).saturation_hsv() >= threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Paints `highlight` wherever the mask is set and black everywhere else.
pub fn visualize(mask: &GrayImage, highlight: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] > BACKGROUND {
            highlight
        } else {
            Rgb([BACKGROUND; 3])
        }
    })
}

/// Binary mask of pixels whose luma is strictly above `threshold`.
pub fn luminance_mask(image: &RgbImage, threshold: u8, max_value: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if Pixel::from(image.get_pixel(x, y)).luminance() > threshold {
            Luma([max_value])
        } else {
            Luma([BACKGROUND])
        }
    })
}
