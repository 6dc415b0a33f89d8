//! Global turbine inventory reader
//!
//! The inventory is a CSV with one row per turbine cluster:
//! `wind_id, X, Y, GID_0, turbines` where X/Y are Eckert IV metres and
//! GID_0 is the ISO-3 country code.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// One inventory row
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryRecord {
    /// Turbine cluster identifier
    pub wind_id: String,
    /// Projected (or geographic, see `crs::detect_interpretation`) x
    #[serde(rename = "X")]
    pub x: f64,
    /// Projected y
    #[serde(rename = "Y")]
    pub y: f64,
    /// ISO-3 country code
    #[serde(rename = "GID_0")]
    pub country: String,
    /// Number of turbines in the cluster
    pub turbines: u32,
}

/// Read the full inventory.
///
/// A missing file is reported as [`Error::MissingInput`] so the caller can
/// skip the unit of work instead of aborting the run.
pub fn read_inventory(path: impl AsRef<Path>) -> Result<Vec<InventoryRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<InventoryRecord>, _>>()?;
    info!(total = records.len(), "read inventory from {}", path.display());
    Ok(records)
}

/// Keep only rows with the given ISO-3 country code.
pub fn filter_country(records: &[InventoryRecord], country: &str) -> Vec<InventoryRecord> {
    let subset: Vec<InventoryRecord> = records
        .iter()
        .filter(|r| r.country == country)
        .cloned()
        .collect();
    info!(
        country = country,
        kept = subset.len(),
        total = records.len(),
        "filtered inventory"
    );
    subset
}
