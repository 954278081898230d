// THEORY:
// This file is the main entry point for the `fmri_slicer` library crate.
//
// The public surface is deliberately small: `SheetPipeline` (one sheet, in memory),
// `ParallelPipeline` (many sheets on a worker pool), the configuration structs
// that tune them, and the `batch` helpers that move sheets and reports between the
// file system and the pipeline. The slicing and clustering internals live under
// `core_modules` and are public only so they can be used and tested piecemeal.

pub mod batch;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{BatchConfig, ClusterConfig, DedupePolicy, PipelineConfig, SlicerConfig};
pub use core_modules::cluster_counter::ClusterCounter;
pub use core_modules::slice_extractor::SliceExtractor;
pub use error::{Error, Result};
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{ReportRow, Sheet, SheetPipeline, SheetReport, SliceAnalysis};
