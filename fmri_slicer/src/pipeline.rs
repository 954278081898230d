// THEORY:
// The `pipeline` module is the top-level API for one slice sheet. It encapsulates
// both layers behind a single call: hand it a decoded sheet, get back every slice
// with its cluster visualization and count, already numbered in reading order.
//
// The pipeline holds no per-sheet state. `generate_report` borrows `&self`, so one
// `SheetPipeline` can serve any number of sheets, concurrently if the caller wants.

use crate::config::PipelineConfig;
use crate::core_modules::cluster_counter::ClusterCounter;
use crate::core_modules::slice_extractor::SliceExtractor;
use image::RgbImage;

// Re-export key data structures for the public API.
pub use crate::core_modules::bounding_box::BoundingBox;
pub use crate::core_modules::slice_extractor::Slice;

/// A decoded composite sheet and the name its outputs are filed under.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub image: RgbImage,
}

/// The result for one slice of a sheet.
#[derive(Debug, Clone)]
pub struct SliceAnalysis {
    /// 1-based position of the slice in reading order.
    pub slice_number: usize,
    pub slice: Slice,
    /// Two-color activation image, same size as the slice.
    pub visualization: RgbImage,
    pub cluster_count: usize,
}

/// One line of a per-sheet cluster report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow {
    pub slice_number: usize,
    pub cluster_count: usize,
}

/// The primary output of the pipeline for a single sheet.
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet_name: String,
    pub slices: Vec<SliceAnalysis>,
}

impl SheetReport {
    /// Report rows in ascending slice order.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.slices
            .iter()
            .map(|analysis| ReportRow {
                slice_number: analysis.slice_number,
                cluster_count: analysis.cluster_count,
            })
            .collect()
    }

    pub fn total_clusters(&self) -> usize {
        self.slices.iter().map(|analysis| analysis.cluster_count).sum()
    }
}

/// Slices a sheet and counts the activation clusters of every slice.
#[derive(Debug, Clone, Default)]
pub struct SheetPipeline {
    extractor: SliceExtractor,
    counter: ClusterCounter,
}

impl SheetPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            extractor: SliceExtractor::new(config.slicer.clone()),
            counter: ClusterCounter::new(config.clusters.clone()),
        }
    }

    pub fn generate_report(&self, sheet: &Sheet) -> SheetReport {
        // Stage 1: Slicing
        let slices = self.extractor.extract(&sheet.image);

        // Stage 2: Cluster counting, one slice at a time
        let slices: Vec<SliceAnalysis> = slices
            .into_iter()
            .enumerate()
            .map(|(index, slice)| {
                let (visualization, cluster_count) = self.counter.find_clusters(&slice.image);
                SliceAnalysis {
                    slice_number: index + 1,
                    slice,
                    visualization,
                    cluster_count,
                }
            })
            .collect();

        let report = SheetReport {
            sheet_name: sheet.name.clone(),
            slices,
        };
        log::info!(
            "sheet '{}': {} slices, {} significant clusters",
            report.sheet_name,
            report.slices.len(),
            report.total_clusters()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const ANATOMY: Rgb<u8> = Rgb([160, 160, 160]);
    const ACTIVATION: Rgb<u8> = Rgb([240, 30, 30]);

    fn synthetic_sheet() -> Sheet {
        let mut image = RgbImage::new(300, 200);
        // Left slice: two activations. Right slice: none.
        draw_filled_rect_mut(&mut image, Rect::at(30, 40).of_size(90, 100), ANATOMY);
        draw_filled_rect_mut(&mut image, Rect::at(40, 50).of_size(15, 15), ACTIVATION);
        draw_filled_rect_mut(&mut image, Rect::at(80, 100).of_size(15, 15), ACTIVATION);
        draw_filled_rect_mut(&mut image, Rect::at(180, 40).of_size(90, 100), ANATOMY);
        Sheet {
            name: String::from("sheet_thresh"),
            image,
        }
    }

    #[test]
    fn report_lists_slices_in_reading_order() {
        let report = SheetPipeline::default().generate_report(&synthetic_sheet());
        assert_eq!(report.sheet_name, "sheet_thresh");
        assert_eq!(
            report.rows(),
            vec![
                ReportRow { slice_number: 1, cluster_count: 2 },
                ReportRow { slice_number: 2, cluster_count: 0 },
            ]
        );
        assert_eq!(report.total_clusters(), 2);
        assert_eq!(report.slices[0].slice.bounding_box, BoundingBox::new(30, 40, 90, 100));
    }

    #[test]
    fn visualization_matches_slice_size() {
        let report = SheetPipeline::default().generate_report(&synthetic_sheet());
        for analysis in &report.slices {
            assert_eq!(analysis.visualization.dimensions(), analysis.slice.image.dimensions());
        }
    }

    #[test]
    fn min_pixels_comes_from_config() {
        let config = PipelineConfig {
            clusters: ClusterConfig {
                min_pixels: 500,
                ..ClusterConfig::default()
            },
            ..PipelineConfig::default()
        };
        let report = SheetPipeline::new(&config).generate_report(&synthetic_sheet());
        assert_eq!(report.total_clusters(), 0);
    }

    #[test]
    fn blank_sheet_has_no_slices() {
        let sheet = Sheet {
            name: String::from("blank"),
            image: RgbImage::new(64, 64),
        };
        let report = SheetPipeline::default().generate_report(&sheet);
        assert!(report.slices.is_empty());
        assert!(report.rows().is_empty());
    }
}
