// THEORY:
// The `ClusterCounter` is the top of the cluster layer. Given one cropped slice it
// answers a single question: how many activation regions of meaningful size does
// this slice contain?
//
// Pipeline per slice:
// 1.  **Saturation Mask**: Activation overlays are colored, anatomy is grey, so
//     HSV saturation >= threshold marks activation pixels.
// 2.  **Visualization**: The mask is rendered as highlight-on-black. This image is
//     both an output (written next to the slice) and the input of the count.
// 3.  **Re-threshold**: The visualization is turned back into luma and binarized
//     again. Any highlight color whose luma clears the secondary threshold gives
//     the same foreground, so the count never depends on the chosen color.
// 4.  **Feature Points**: Every foreground pixel becomes a `(row, col)` point.
// 5.  **Density Clustering**: DBSCAN groups the points; clusters with at least
//     `min_pixels` members are counted.
//
// An all-background slice is the ordinary "nothing here" path and yields 0.

use crate::config::ClusterConfig;
use crate::core_modules::density_clusterer::{Clustering, DensityClusterer, FeaturePoint};
use crate::core_modules::masks::{luminance_mask, saturation_mask, visualize};
use image::{GrayImage, Rgb, RgbImage};

const WHITE_PIXEL: u8 = 255;

/// Foreground coordinates of a mask, scanned row by row.
pub fn feature_points(mask: &GrayImage) -> Vec<FeaturePoint> {
    mask.enumerate_pixels()
        .filter(|(_, _, value)| value.0[0] > 0)
        .map(|(col, row, _)| FeaturePoint::new(row, col))
        .collect()
}

/// Counts significant activation clusters in slices.
#[derive(Debug, Clone, Default)]
pub struct ClusterCounter {
    config: ClusterConfig,
}

impl ClusterCounter {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Saturation mask of the slice and its two-color visualization.
    pub fn build_mask(&self, image: &RgbImage) -> (GrayImage, RgbImage) {
        let mask = saturation_mask(image, self.config.saturation_threshold);
        let visualization = visualize(&mask, Rgb(self.config.highlight_color));
        (mask, visualization)
    }

    /// Full DBSCAN result for a visualization image.
    pub fn cluster(&self, visualization: &RgbImage) -> Clustering {
        let clean = luminance_mask(visualization, self.config.binary_threshold, WHITE_PIXEL);
        let points = feature_points(&clean);
        if points.is_empty() {
            return Clustering::default();
        }
        DensityClusterer::new(self.config.radius, self.config.min_neighbors).fit(&points)
    }

    /// Number of clusters in the visualization with at least `min_pixels` members.
    pub fn count_clusters(&self, visualization: &RgbImage, min_pixels: usize) -> usize {
        let clustering = self.cluster(visualization);
        let count = clustering.significant_clusters(min_pixels);
        log::debug!(
            "cluster sizes {:?}, {} noise points, {} at or above {} px",
            clustering.sizes,
            clustering.noise_count(),
            count,
            min_pixels
        );
        count
    }

    /// Visualization and significant-cluster count of a slice, using an explicit
    /// minimum cluster size.
    pub fn find_clusters_with(&self, image: &RgbImage, min_pixels: usize) -> (RgbImage, usize) {
        let (_, visualization) = self.build_mask(image);
        let count = self.count_clusters(&visualization, min_pixels);
        (visualization, count)
    }

    /// Visualization and significant-cluster count of a slice, using the
    /// configured minimum cluster size.
    pub fn find_clusters(&self, image: &RgbImage) -> (RgbImage, usize) {
        self.find_clusters_with(image, self.config.min_pixels)
    }
}
