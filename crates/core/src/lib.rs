//! # Windprep Core
//!
//! Core types and I/O for the windprep wind-turbine sample-preparation
//! toolkit.
//!
//! This crate provides:
//! - `Sample` / `SampleSet`: positive and negative training samples
//! - `BoundingBox`: axis-aligned extraction windows
//! - `Region`: geographic partitioning and acquisition windows
//! - Eckert IV → WGS84 coordinate conversion
//! - I/O for the inventory CSV and the CSV/GeoJSON/Shapefile exports

pub mod crs;
pub mod error;
pub mod io;
pub mod region;
pub mod sample;

pub use error::{Error, Result};
pub use region::Region;
pub use sample::{BoundingBox, DateRange, Sample, SampleClass, SampleSet};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::region::Region;
    pub use crate::sample::{BoundingBox, DateRange, Sample, SampleClass, SampleSet};
}
