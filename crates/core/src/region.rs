//! Geographic partitioning of samples
//!
//! Two schemes coexist in the workflow:
//! - four named prediction regions with fixed bounding boxes and Sentinel-2
//!   acquisition windows, used for per-region exports and platform scripts;
//! - a north/south split at 33°N (Qinling–Huaihe line) that picks each
//!   sample's snow-free training window.

use crate::error::{Error, Result};
use crate::sample::{BoundingBox, DateRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latitude of the north/south split (Qinling–Huaihe line)
pub const NORTH_SOUTH_SPLIT_LAT: f64 = 33.0;

/// Default sampling bounds for the country subset (mainland China envelope)
pub fn country_bounds() -> BoundingBox {
    BoundingBox::new(73.5, 18.0, 135.0, 53.5)
}

/// Named geographic region of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthChina,
    EastChina,
    SouthwestChina,
    NorthwestChina,
    Other,
}

impl Region {
    /// The four named regions, in export order (excludes `Other`)
    pub const NAMED: [Region; 4] = [
        Region::NorthChina,
        Region::EastChina,
        Region::SouthwestChina,
        Region::NorthwestChina,
    ];

    /// Snake-case name used in file names and asset ids
    pub fn name(&self) -> &'static str {
        match self {
            Region::NorthChina => "north_china",
            Region::EastChina => "east_china",
            Region::SouthwestChina => "southwest_china",
            Region::NorthwestChina => "northwest_china",
            Region::Other => "other",
        }
    }

    /// Human-readable title, e.g. `North China`
    pub fn title(&self) -> String {
        self.name()
            .split('_')
            .map(|w| {
                let mut c = w.chars();
                match c.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fixed bounding box of a named region; `None` for `Other`
    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Region::NorthChina => Some(BoundingBox::new(110.0, 35.0, 120.0, 45.0)),
            Region::EastChina => Some(BoundingBox::new(115.0, 25.0, 125.0, 35.0)),
            Region::SouthwestChina => Some(BoundingBox::new(95.0, 25.0, 110.0, 35.0)),
            Region::NorthwestChina => Some(BoundingBox::new(75.0, 35.0, 100.0, 45.0)),
            Region::Other => None,
        }
    }

    /// Sentinel-2 acquisition window for region-level prediction; `None` for
    /// `Other`. Northern regions start in April to avoid snow cover.
    pub fn prediction_window(&self) -> Option<DateRange> {
        match self {
            Region::NorthChina | Region::NorthwestChina => {
                Some(DateRange::from_ymd((2024, 4, 1), (2024, 9, 30)))
            }
            Region::EastChina | Region::SouthwestChina => {
                Some(DateRange::from_ymd((2024, 1, 1), (2024, 9, 30)))
            }
            Region::Other => None,
        }
    }

    /// Classify a lon/lat point into a region. The first matching named
    /// region wins; points outside all four are `Other`.
    pub fn classify(lon: f64, lat: f64) -> Region {
        Region::NAMED
            .into_iter()
            .find(|r| {
                r.bbox()
                    .map(|b| b.contains_point(lon, lat))
                    .unwrap_or(false)
            })
            .unwrap_or(Region::Other)
    }
}

/// Snow-free training window for a sample, by latitude.
///
/// North of the split: April–May 2020. South: January–February 2020.
pub fn training_window(lat: f64) -> DateRange {
    if lat >= NORTH_SOUTH_SPLIT_LAT {
        DateRange::from_ymd((2020, 4, 1), (2020, 5, 31))
    } else {
        DateRange::from_ymd((2020, 1, 1), (2020, 2, 28))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "north_china" => Ok(Region::NorthChina),
            "east_china" => Ok(Region::EastChina),
            "southwest_china" => Ok(Region::SouthwestChina),
            "northwest_china" => Ok(Region::NorthwestChina),
            "other" => Ok(Region::Other),
            _ => Err(Error::UnknownRegion(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_named_regions() {
        assert_eq!(Region::classify(115.0, 40.0), Region::NorthChina);
        assert_eq!(Region::classify(120.0, 30.0), Region::EastChina);
        assert_eq!(Region::classify(100.0, 30.0), Region::SouthwestChina);
        assert_eq!(Region::classify(85.0, 40.0), Region::NorthwestChina);
    }

    #[test]
    fn classify_outside_is_other() {
        assert_eq!(Region::classify(135.0, 50.0), Region::Other);
        assert_eq!(Region::classify(75.0, 20.0), Region::Other);
    }

    #[test]
    fn overlap_prefers_first_named() {
        // (115..120, 35) lies in both north_china and east_china boxes;
        // north_china is listed first.
        assert_eq!(Region::classify(117.0, 35.0), Region::NorthChina);
    }

    #[test]
    fn name_round_trip() {
        for r in Region::NAMED {
            assert_eq!(r.name().parse::<Region>().unwrap(), r);
        }
    }

    #[test]
    fn titles() {
        assert_eq!(Region::SouthwestChina.title(), "Southwest China");
    }

    #[test]
    fn training_window_split() {
        assert_eq!(training_window(40.0).start_str(), "2020-04-01");
        assert_eq!(training_window(25.0).start_str(), "2020-01-01");
        // boundary latitude counts as north
        assert_eq!(training_window(33.0).start_str(), "2020-04-01");
    }
}
