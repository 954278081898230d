use std::path::PathBuf;

use thiserror::Error;

/// Errors raised around the pure core: file access, decoding, configuration
/// and worker-pool plumbing. The slicing and clustering algorithms themselves
/// are total over decoded images and never produce one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read or write image '{path}': {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write report '{path}': {source}")]
    Report {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("Failed to parse configuration '{path}': {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Worker pool failure: {0}")]
    Worker(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
