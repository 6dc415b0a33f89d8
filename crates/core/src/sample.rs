//! Training samples and their extraction windows

use crate::region::{training_window, Region};
use chrono::NaiveDate;
use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};

/// Default half-width of a sample's extraction window, in degrees
/// (0.0026° × 0.0026° box, roughly 289 m × 289 m).
pub const DEFAULT_BUFFER_DEG: f64 = 0.0013;

/// Axis-aligned bounding box in lon/lat degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square box of half-width `buffer` centered on (x, y)
    pub fn around(x: f64, y: f64, buffer: f64) -> Self {
        Self::new(x - buffer, y - buffer, x + buffer, y + buffer)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Closed exterior ring as a geo-types polygon
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

/// Sample class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleClass {
    /// Background location (class 0)
    Background,
    /// Known turbine location (class 1)
    Turbine,
}

impl SampleClass {
    /// Numeric class code used in exports (1 = turbine, 0 = background)
    pub fn code(&self) -> u8 {
        match self {
            SampleClass::Background => 0,
            SampleClass::Turbine => 1,
        }
    }

    /// Text label used in exports
    pub fn label(&self) -> &'static str {
        match self {
            SampleClass::Background => "non_turbine",
            SampleClass::Turbine => "wind_turbine",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SampleClass::Background),
            1 => Some(SampleClass::Turbine),
            _ => None,
        }
    }
}

/// Inclusive acquisition date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build from `(year, month, day)` literals. Panics on an invalid
    /// calendar date, which static callers never pass.
    pub fn from_ymd(start: (i32, u32, u32), end: (i32, u32, u32)) -> Self {
        let date = |(y, m, d): (i32, u32, u32)| {
            NaiveDate::from_ymd_opt(y, m, d).expect("valid calendar date")
        };
        Self::new(date(start), date(end))
    }

    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// A positive or negative training sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier: inventory id for positives, `neg_<n>` for negatives
    pub id: String,
    /// Center longitude (degrees)
    pub center_x: f64,
    /// Center latitude (degrees)
    pub center_y: f64,
    /// Extraction window around the center
    pub bbox: BoundingBox,
    /// Class label
    pub class: SampleClass,
    /// Geographic region tag
    pub region: Region,
    /// Snow-free acquisition window
    pub window: DateRange,
    /// Turbine count at this location (0 for negatives)
    pub turbines: u32,
}

impl Sample {
    /// Positive sample at a known turbine location
    pub fn positive(id: impl Into<String>, lon: f64, lat: f64, turbines: u32, buffer: f64) -> Self {
        Self {
            id: id.into(),
            center_x: lon,
            center_y: lat,
            bbox: BoundingBox::around(lon, lat, buffer),
            class: SampleClass::Turbine,
            region: Region::classify(lon, lat),
            window: training_window(lat),
            turbines,
        }
    }

    /// Negative (background) sample, numbered in acceptance order
    pub fn negative(index: usize, lon: f64, lat: f64, buffer: f64) -> Self {
        Self {
            id: format!("neg_{index}"),
            center_x: lon,
            center_y: lat,
            bbox: BoundingBox::around(lon, lat, buffer),
            class: SampleClass::Background,
            region: Region::classify(lon, lat),
            window: training_window(lat),
            turbines: 0,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.class == SampleClass::Turbine
    }
}

/// Collection of samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn extend(&mut self, other: SampleSet) {
        self.samples.extend(other.samples);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn positive_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_positive()).count()
    }

    pub fn negative_count(&self) -> usize {
        self.len() - self.positive_count()
    }

    /// Subset with the given class
    pub fn by_class(&self, class: SampleClass) -> SampleSet {
        SampleSet::from_samples(
            self.samples
                .iter()
                .filter(|s| s.class == class)
                .cloned()
                .collect(),
        )
    }

    /// Subset in the given region
    pub fn by_region(&self, region: Region) -> SampleSet {
        SampleSet::from_samples(
            self.samples
                .iter()
                .filter(|s| s.region == region)
                .cloned()
                .collect(),
        )
    }

    /// Split into (north, south) subsets at the given latitude. Samples on
    /// the split line count as north, matching [`crate::region::training_window`].
    pub fn split_at_latitude(&self, lat: f64) -> (SampleSet, SampleSet) {
        let (north, south) = self
            .samples
            .iter()
            .cloned()
            .partition(|s| s.center_y >= lat);
        (SampleSet::from_samples(north), SampleSet::from_samples(south))
    }

    /// Center coordinates of all samples, `(lon, lat)` pairs
    pub fn centers(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.center_x, s.center_y))
            .collect()
    }
}

impl IntoIterator for SampleSet {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_around_center() {
        let b = BoundingBox::around(116.0, 40.0, 0.0013);
        assert!((b.width() - 0.0026).abs() < 1e-12);
        assert!((b.height() - 0.0026).abs() < 1e-12);
        let (cx, cy) = b.center();
        assert!((cx - 116.0).abs() < 1e-12);
        assert!((cy - 40.0).abs() < 1e-12);
        assert!(b.contains_point(116.0, 40.0));
        assert!(!b.contains_point(116.01, 40.0));
    }

    #[test]
    fn bbox_polygon_is_closed() {
        let poly = BoundingBox::new(0.0, 0.0, 1.0, 1.0).to_polygon();
        let ring = poly.exterior();
        assert_eq!(ring.0.len(), 5);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn positive_sample_fields() {
        let s = Sample::positive("w_42", 116.0, 40.0, 3, DEFAULT_BUFFER_DEG);
        assert_eq!(s.class.code(), 1);
        assert_eq!(s.class.label(), "wind_turbine");
        assert_eq!(s.region, Region::NorthChina);
        assert_eq!(s.window.start_str(), "2020-04-01");
        assert_eq!(s.turbines, 3);
    }

    #[test]
    fn negative_sample_fields() {
        let s = Sample::negative(7, 100.0, 30.0, DEFAULT_BUFFER_DEG);
        assert_eq!(s.id, "neg_7");
        assert_eq!(s.class.code(), 0);
        assert_eq!(s.class.label(), "non_turbine");
        assert_eq!(s.region, Region::SouthwestChina);
        assert_eq!(s.window.start_str(), "2020-01-01");
        assert_eq!(s.turbines, 0);
    }

    #[test]
    fn set_counts_and_filters() {
        let mut set = SampleSet::new();
        set.push(Sample::positive("a", 116.0, 40.0, 1, DEFAULT_BUFFER_DEG));
        set.push(Sample::negative(0, 100.0, 30.0, DEFAULT_BUFFER_DEG));
        set.push(Sample::negative(1, 117.0, 41.0, DEFAULT_BUFFER_DEG));

        assert_eq!(set.positive_count(), 1);
        assert_eq!(set.negative_count(), 2);
        assert_eq!(set.by_class(SampleClass::Background).len(), 2);
        assert_eq!(set.by_region(Region::NorthChina).len(), 2);
        assert_eq!(set.centers().len(), 3);
    }

    #[test]
    fn latitude_split_keeps_boundary_north() {
        let mut set = SampleSet::new();
        set.push(Sample::positive("n", 116.0, 40.0, 1, DEFAULT_BUFFER_DEG));
        set.push(Sample::positive("on_line", 110.0, 33.0, 1, DEFAULT_BUFFER_DEG));
        set.push(Sample::negative(0, 100.0, 30.0, DEFAULT_BUFFER_DEG));

        let (north, south) = set.split_at_latitude(33.0);
        assert_eq!(north.len(), 2);
        assert_eq!(south.len(), 1);
        assert!(north.iter().all(|s| s.center_y >= 33.0));
        assert_eq!(south.samples[0].id, "neg_0");
    }
}
