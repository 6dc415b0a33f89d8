//! Coordinate Reference System handling
//!
//! The inventory ships in Eckert IV projected metres; everything downstream
//! (sampling, exports, platform scripts) works in WGS84 degrees. The
//! conversion lives in [`eckert`].

mod eckert;

pub use eckert::{
    detect_interpretation, eckert_iv_forward, eckert_iv_inverse, reproject_inventory,
    CoordInterpretation,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG code
    Epsg(u32),
    /// PROJ string
    Proj(String),
}

impl Crs {
    /// WGS84 geographic (EPSG:4326)
    pub fn wgs84() -> Self {
        Crs::Epsg(4326)
    }

    /// Spherical Eckert IV, the projection of the global inventory
    pub fn eckert_iv() -> Self {
        Crs::Proj("+proj=eck4 +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".into())
    }

    /// String identifier, e.g. `EPSG:4326`
    pub fn identifier(&self) -> String {
        match self {
            Crs::Epsg(code) => format!("EPSG:{code}"),
            Crs::Proj(s) => s.clone(),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_epsg() {
        assert_eq!(Crs::wgs84().identifier(), "EPSG:4326");
    }

    #[test]
    fn identifier_proj() {
        assert!(Crs::eckert_iv().identifier().starts_with("+proj=eck4"));
    }

    #[test]
    fn default_is_wgs84() {
        assert_eq!(Crs::default(), Crs::wgs84());
        assert_eq!(Crs::default().to_string(), "EPSG:4326");
    }
}
