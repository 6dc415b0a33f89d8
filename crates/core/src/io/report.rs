//! Plain-text summary report for a prepared dataset

use crate::crs::Crs;
use crate::error::Result;
use crate::region::Region;
use crate::sample::{SampleSet, DEFAULT_BUFFER_DEG};
use std::fmt::Write as _;
use std::path::Path;

/// Write `data_summary.txt` for a combined sample set.
pub fn write_summary(path: impl AsRef<Path>, set: &SampleSet) -> Result<()> {
    let mut out = String::new();
    let line = "=".repeat(60);

    writeln!(out, "Wind turbine detection dataset summary").ok();
    writeln!(out, "{line}\n").ok();
    writeln!(out, "Generated: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(out, "\nTotal samples: {}", set.len()).ok();
    writeln!(out, "  Positive (wind turbine): {}", set.positive_count()).ok();
    writeln!(out, "  Negative (background):   {}", set.negative_count()).ok();

    writeln!(out, "\nRegion distribution:").ok();
    for region in Region::NAMED.into_iter().chain([Region::Other]) {
        let subset = set.by_region(region);
        match region.prediction_window() {
            Some(window) => writeln!(
                out,
                "  {}: {} ({} to {})",
                region.name(),
                subset.len(),
                window.start_str(),
                window.end_str()
            )
            .ok(),
            None => writeln!(out, "  {}: {}", region.name(), subset.len()).ok(),
        };
    }

    let box_size = 2.0 * DEFAULT_BUFFER_DEG;
    writeln!(out, "\nBounding box size: {box_size}° x {box_size}° (about 289 m x 289 m)").ok();
    writeln!(out, "Coordinate system: {} (WGS84)", Crs::wgs84()).ok();

    std::fs::write(path.as_ref(), out)?;
    Ok(())
}
