//! Error types for taxaheat.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing column '{0}' in input table")]
    MissingColumn(String),

    #[error("Duplicate taxon '{0}' in input table")]
    DuplicateTaxon(String),

    #[error("Invalid abundance '{value}' for taxon '{taxon}' in sample '{sample}'")]
    InvalidAbundance {
        value: String,
        taxon: String,
        sample: String,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, HeatmapError>;
