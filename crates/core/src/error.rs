//! Error types for windprep

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for windprep operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Shapefile error: {0}")]
    Shapefile(String),

    #[error("ZIP error: {0}")]
    Zip(String),

    #[error("invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("projection failed: {reason}")]
    Projection { reason: String },

    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("missing column '{0}' in input")]
    MissingColumn(&'static str),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

impl From<shapefile::Error> for Error {
    fn from(e: shapefile::Error) -> Self {
        Error::Shapefile(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e.to_string())
    }
}

/// Result type alias for windprep operations
pub type Result<T> = std::result::Result<T, Error>;
