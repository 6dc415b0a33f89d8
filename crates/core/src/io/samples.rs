//! Sample CSV export/import
//!
//! Fixed column set shared by all tabular exports:
//! `wind_id, center_x, center_y, xmin, ymin, xmax, ymax, class, label,
//! region, date_start, date_end, turbines`.
//!
//! Floats are written in shortest round-trip form, so reading a file back
//! reproduces the coordinates exactly.

use crate::error::{Error, Result};
use crate::sample::{BoundingBox, DateRange, Sample, SampleClass, SampleSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flat row form of a [`Sample`], matching the export column order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRow {
    pub wind_id: String,
    pub center_x: f64,
    pub center_y: f64,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub class: u8,
    pub label: String,
    pub region: String,
    pub date_start: String,
    pub date_end: String,
    pub turbines: u32,
}

impl From<&Sample> for SampleRow {
    fn from(s: &Sample) -> Self {
        Self {
            wind_id: s.id.clone(),
            center_x: s.center_x,
            center_y: s.center_y,
            xmin: s.bbox.min_x,
            ymin: s.bbox.min_y,
            xmax: s.bbox.max_x,
            ymax: s.bbox.max_y,
            class: s.class.code(),
            label: s.class.label().to_string(),
            region: s.region.name().to_string(),
            date_start: s.window.start_str(),
            date_end: s.window.end_str(),
            turbines: s.turbines,
        }
    }
}

impl SampleRow {
    /// Rebuild a [`Sample`]. The class code is authoritative; the label
    /// column is redundant and ignored.
    pub fn into_sample(self) -> Result<Sample> {
        let class = SampleClass::from_code(self.class).ok_or_else(|| Error::InvalidParameter {
            name: "class",
            value: self.class.to_string(),
            reason: "expected 0 or 1".into(),
        })?;
        let start = NaiveDate::parse_from_str(&self.date_start, "%Y-%m-%d")?;
        let end = NaiveDate::parse_from_str(&self.date_end, "%Y-%m-%d")?;
        Ok(Sample {
            id: self.wind_id,
            center_x: self.center_x,
            center_y: self.center_y,
            bbox: BoundingBox::new(self.xmin, self.ymin, self.xmax, self.ymax),
            class,
            region: self.region.parse()?,
            window: DateRange::new(start, end),
            turbines: self.turbines,
        })
    }
}

/// Write a sample set as CSV.
pub fn write_samples_csv(path: impl AsRef<Path>, set: &SampleSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for sample in set.iter() {
        writer.serialize(SampleRow::from(sample))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a sample CSV written by [`write_samples_csv`].
pub fn read_samples_csv(path: impl AsRef<Path>) -> Result<SampleSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut set = SampleSet::new();
    for row in reader.deserialize::<SampleRow>() {
        set.push(row?.into_sample()?);
    }
    Ok(set)
}
