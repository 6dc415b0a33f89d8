//! I/O for the inventory and the sample exports
//!
//! The pipeline reads one tabular input (the global turbine inventory) and
//! writes three formats with a fixed column set: CSV, GeoJSON and ESRI
//! Shapefile (zipped for platform upload), plus a plain-text summary report.

pub mod geojson;
pub mod inventory;
pub mod report;
pub mod samples;
pub mod shp;

pub use geojson::{read_geojson, write_geojson};
pub use inventory::{filter_country, read_inventory, InventoryRecord};
pub use report::write_summary;
pub use samples::{read_samples_csv, write_samples_csv};
pub use shp::{write_shapefile, zip_shapefile};
