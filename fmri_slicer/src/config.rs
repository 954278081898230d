// THEORY:
// Every threshold the slicer and the cluster counter use is a tunable, not a
// literal. This module gathers them into plain configuration structs whose
// `Default` impls carry the calibrated values the pipeline was tuned with.
//
// The structs are serde-enabled with `#[serde(default)]` on every level, so a
// TOML file only needs to name the fields it wants to change:
//
//     [clusters]
//     min_pixels = 200
//
//     [slicer]
//     dedupe_policy = "discovery_order"

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How `validate_and_dedupe` orders the boxes it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Stable sort by descending area, then resolve. Larger boxes settle first,
    /// so the outcome does not depend on contour discovery order (except for
    /// equal-area ties, which keep discovery order).
    #[default]
    AreaDescending,
    /// Resolve in contour discovery order, including deferred removal of boxes
    /// superseded later in the pass.
    DiscoveryOrder,
}

/// Tunables for turning one composite sheet into slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    /// Luma strictly above this value is foreground.
    pub binary_threshold: u8,
    /// Value written for foreground pixels of the binarized sheet.
    pub max_value: u8,
    /// Pixels added on every side, both for overlap tests and for cropping.
    pub margin: u32,
    /// Boxes narrower or shorter than this are noise.
    pub min_dimension: u32,
    /// Boxes wider or taller than this are background or the whole sheet.
    pub max_dimension: u32,
    pub dedupe_policy: DedupePolicy,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            binary_threshold: 65,
            max_value: 255,
            margin: 15,
            min_dimension: 10,
            max_dimension: 250,
            dedupe_policy: DedupePolicy::default(),
        }
    }
}

/// Tunables for finding activation clusters in one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// HSV saturation at or above this value marks an activation pixel.
    pub saturation_threshold: u8,
    /// Luma strictly above this value survives the visualization re-threshold.
    pub binary_threshold: u8,
    /// Neighbourhood radius (Euclidean, inclusive) for density clustering.
    pub radius: f64,
    /// Points, including the point itself, needed inside `radius` for a core point.
    pub min_neighbors: usize,
    /// Clusters with fewer members than this are not counted.
    pub min_pixels: usize,
    /// RGB color painted on activation pixels in the visualization.
    pub highlight_color: [u8; 3],
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: 72,
            binary_threshold: 32,
            radius: 2.0,
            min_neighbors: 2,
            min_pixels: 135,
            highlight_color: [255, 233, 0],
        }
    }
}

/// Where a batch run reads sheets from and writes its outputs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub input_dir: String,
    pub slices_dir: String,
    pub clusters_dir: String,
    /// Only files whose name ends with this suffix are treated as sheets.
    pub file_suffix: String,
    /// Extension used for every written image.
    pub image_extension: String,
    /// Worker count for the parallel pipeline. 0 means one per logical CPU.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: String::from("testPatient"),
            slices_dir: String::from("Slices"),
            clusters_dir: String::from("Clusters"),
            file_suffix: String::from("thresh.png"),
            image_extension: String::from("png"),
            workers: 0,
        }
    }
}

impl BatchConfig {
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Configuration for the whole sheet pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub slicer: SlicerConfig,
    pub clusters: ClusterConfig,
    pub batch: BatchConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(toml_string: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_string)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let toml_string = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_string).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
