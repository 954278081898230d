// THEORY (Single-Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the slicer. It is a "dumb"
// data container for one RGB pixel plus the handful of single-pixel metrics the
// rest of the system thresholds on. Nothing here looks at neighbours; anything
// spatial (contours, clusters) lives in the higher-level modules.
//
// Heuristic families:
// - Brightness: luminance (Rec. 601 luma), the intensity the sheet binarizer and
//   the cluster re-threshold both see.
// - Color strength: chroma (max - min) and HSV saturation, scaled to a byte the
//   same way 8-bit HSV images are usually stored (0..255).
// - Value: HSV value, max(R, G, B).
//
// All byte-scaled results are rounded, so a pure grey pixel always has
// saturation 0 and black always has luminance 0.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type Luminance = u8;
    pub type SaturationHSV = u8;
    pub type ValueHSV = u8;
    pub type Chroma = u8;

    // Rec. 601 weights in 14-bit fixed point: 0.299, 0.587, 0.114.
    const LUMA_RED: u32 = 4899;
    const LUMA_GREEN: u32 = 9617;
    const LUMA_BLUE: u32 = 1868;
    const LUMA_SHIFT: u32 = 14;
    const LUMA_ROUND: u32 = 1 << (LUMA_SHIFT - 1);

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// =================================Heuristics==================================

        /// Luminance estimate (Rec. 601 luma), rounded to a byte.
        ///
        /// - Weighted sum of RGB, computed in fixed point so results are exact
        ///   and reproducible across platforms.
        /// - This is the intensity every binary threshold in the crate reads.
        pub fn luminance(&self) -> Luminance {
            let weighted = LUMA_RED * self.red as u32
                + LUMA_GREEN * self.green as u32
                + LUMA_BLUE * self.blue as u32;
            ((weighted + LUMA_ROUND) >> LUMA_SHIFT) as Luminance
        }

        /// HSV Value (V): brightness defined as max(R, G, B).
        pub fn value_hsv(&self) -> ValueHSV {
            self.red.max(self.green.max(self.blue))
        }

        /// Chroma (C): color purity = max(R,G,B) - min(R,G,B).
        pub fn chroma(&self) -> Chroma {
            self.value_hsv() - self.red.min(self.green.min(self.blue))
        }

        /// Saturation (HSV): S = 255 * chroma / value, rounded.
        /// - Drops to zero for black and for every shade of grey.
        pub fn saturation_hsv(&self) -> SaturationHSV {
            let value = self.value_hsv();
            if value == 0 {
                return 0;
            }
            ((255.0f32 * self.chroma() as f32) / value as f32).round() as SaturationHSV
        }
    }

    impl From<Rgb<u8>> for Pixel {
        fn from(rgb: Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&Rgb<u8>> for Pixel {
        fn from(rgb: &Rgb<u8>) -> Self {
            Pixel::from(*rgb)
        }
    }

    impl From<Pixel> for Rgb<u8> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}
