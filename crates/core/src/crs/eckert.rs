//! Pure-Rust spherical Eckert IV ↔ WGS84 conversion (Snyder 1987).
//!
//! The global turbine inventory stores positions in Eckert IV metres
//! (`+proj=eck4 +datum=WGS84`). PROJ treats eck4 as spherical and uses the
//! WGS84 semi-major axis as the sphere radius, so we do the same. No external
//! C dependencies (no libproj).

use crate::crs::Crs;
use crate::error::{Error, Result};
use tracing::{debug, warn};

// ── Projection constants (Snyder 1987, USGS Prof. Paper 1395, p. 253) ────

/// Sphere radius: WGS84 semi-major axis (m)
const R: f64 = 6_378_137.0;
/// x scale: 2 / sqrt(pi * (4 + pi))
const C_X: f64 = 0.422_238_200_315_771_2;
/// y scale: 2 * sqrt(pi / (4 + pi))
const C_Y: f64 = 1.326_500_428_177_002_3;
/// theta equation constant: 2 + pi/2
const C_P: f64 = 3.570_796_326_794_896_6;

/// Newton iteration tolerance for the forward theta solve
const THETA_TOL: f64 = 1e-14;
const MAX_ITER: usize = 100;

/// How a batch of inventory coordinates should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordInterpretation {
    /// Projected Eckert IV metres, needs the inverse transform
    EckertIv,
    /// Already lon/lat degrees, pass through
    Geographic,
}

/// Decide whether a coordinate batch is already geographic.
///
/// Mirrors the upstream fallback rule: if every |x| ≤ 180 and |y| ≤ 90 the
/// values are plausibly degrees already.
pub fn detect_interpretation(points: &[(f64, f64)]) -> CoordInterpretation {
    let geographic = points
        .iter()
        .all(|&(x, y)| x.abs() <= 180.0 && y.abs() <= 90.0);
    if geographic {
        CoordInterpretation::Geographic
    } else {
        CoordInterpretation::EckertIv
    }
}

/// Project WGS84 (lon, lat) degrees to Eckert IV (x, y) metres.
///
/// Solves `theta + sin(theta)cos(theta) + 2 sin(theta) = (2 + pi/2) sin(lat)`
/// by Newton iteration (Snyder eq. 28-7..28-9).
pub fn eckert_iv_forward(lon: f64, lat: f64) -> (f64, f64) {
    let lam = lon.to_radians();
    let phi = lat.to_radians();

    let p = C_P * phi.sin();
    let mut theta = phi / 2.0;
    for _ in 0..MAX_ITER {
        let f = theta + theta.sin() * theta.cos() + 2.0 * theta.sin() - p;
        let df = 1.0 + (2.0 * theta).cos() + 2.0 * theta.cos();
        let step = f / df;
        theta -= step;
        if step.abs() < THETA_TOL {
            break;
        }
    }

    let x = C_X * R * lam * (1.0 + theta.cos());
    let y = C_Y * R * theta.sin();
    (x, y)
}

/// Unproject Eckert IV (x, y) metres to WGS84 (lon, lat) degrees.
///
/// Closed form (Snyder eq. 28-10..28-12). Fails if the input lies outside
/// the projection's valid range.
pub fn eckert_iv_inverse(x: f64, y: f64) -> Result<(f64, f64)> {
    let sin_theta = y / (C_Y * R);
    if !(-1.0..=1.0).contains(&sin_theta) {
        return Err(Error::Projection {
            reason: format!("y = {y} is outside the Eckert IV range"),
        });
    }
    let theta = sin_theta.asin();

    let sin_phi = (theta + theta.sin() * theta.cos() + 2.0 * theta.sin()) / C_P;
    if !(-1.0..=1.0).contains(&sin_phi) {
        return Err(Error::Projection {
            reason: format!("({x}, {y}) does not unproject to a valid latitude"),
        });
    }
    let phi = sin_phi.asin();
    let lam = x / (C_X * R * (1.0 + theta.cos()));

    let (lon, lat) = (lam.to_degrees(), phi.to_degrees());
    if lon.abs() > 180.0 + 1e-9 {
        return Err(Error::Projection {
            reason: format!("({x}, {y}) unprojects to longitude {lon} outside ±180"),
        });
    }
    Ok((lon, lat))
}

/// Convert a batch of inventory coordinates to WGS84 lon/lat.
///
/// Applies the inverse Eckert IV transform, unless the batch already looks
/// geographic, in which case the values pass through unchanged (with a
/// warning, since that means the inventory was not in its documented CRS).
pub fn reproject_inventory(points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
    match detect_interpretation(points) {
        CoordInterpretation::Geographic => {
            warn!("inventory coordinates already look geographic, skipping unprojection");
            Ok(points.to_vec())
        }
        CoordInterpretation::EckertIv => {
            debug!("unprojecting {} -> {}", Crs::eckert_iv(), Crs::wgs84());
            points
                .iter()
                .map(|&(x, y)| eckert_iv_inverse(x, y))
                .collect()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    // Reference values from an independent implementation of the Snyder
    // spherical Eckert IV formulas (R = 6378137):
    //   (116.4074, 39.9042) → (9885662.569, 4999386.498)   Beijing
    //   (87.6168, 43.8256)  → (7276446.914, 5430090.472)   Urumqi
    //   (110.0, 25.0)       → (9948574.099, 3232157.026)
    #[test]
    fn forward_beijing() {
        let (x, y) = eckert_iv_forward(116.4074, 39.9042);
        assert_close(x, 9_885_662.569, 0.01, "x");
        assert_close(y, 4_999_386.498, 0.01, "y");
    }

    #[test]
    fn forward_urumqi() {
        let (x, y) = eckert_iv_forward(87.6168, 43.8256);
        assert_close(x, 7_276_446.914, 0.01, "x");
        assert_close(y, 5_430_090.472, 0.01, "y");
    }

    #[test]
    fn inverse_beijing() {
        let (lon, lat) = eckert_iv_inverse(9_885_662.569, 4_999_386.498).unwrap();
        assert_close(lon, 116.4074, 1e-6, "lon");
        assert_close(lat, 39.9042, 1e-6, "lat");
    }

    #[test]
    fn round_trip_across_country_bounds() {
        for &(lon, lat) in &[
            (73.5, 18.0),
            (135.0, 53.5),
            (110.0, 25.0),
            (87.6168, 43.8256),
            (0.0, 0.0),
        ] {
            let (x, y) = eckert_iv_forward(lon, lat);
            let (lon2, lat2) = eckert_iv_inverse(x, y).unwrap();
            assert_close(lon2, lon, 1e-8, "lon round trip");
            assert_close(lat2, lat, 1e-8, "lat round trip");
        }
    }

    #[test]
    fn equator_origin() {
        let (x, y) = eckert_iv_forward(0.0, 0.0);
        assert_close(x, 0.0, 1e-6, "x at origin");
        assert_close(y, 0.0, 1e-6, "y at origin");
    }

    // Eckert IV maps each pole to a line of half the equator's length:
    // theta = pi/2 there, so x = C_X * R * lambda and longitude stays
    // recoverable. The inverse denominator 1 + cos(theta) is >= 1 for any
    // theta = asin(..) in [-pi/2, pi/2].
    #[test]
    fn pole_line_keeps_longitude() {
        for &lon in &[-180.0, -60.0, 0.0, 116.4074, 180.0] {
            let (x, y) = eckert_iv_forward(lon, 90.0);
            assert_close(y, C_Y * R, 1e-3, "y on the north pole line");
            let (lon2, lat2) = eckert_iv_inverse(x, y).unwrap();
            assert!(lon2.is_finite() && lat2.is_finite());
            assert_close(lon2, lon, 1e-6, "lon on the pole line");
            assert_close(lat2, 90.0, 1e-6, "lat on the pole line");
        }
    }

    #[test]
    fn inverse_rejects_out_of_range() {
        // Far beyond the pole line y = C_Y * R
        assert!(eckert_iv_inverse(0.0, 2.0e7).is_err());
    }

    #[test]
    fn detect_geographic_passthrough() {
        let pts = [(116.4, 39.9), (87.6, 43.8)];
        assert_eq!(
            detect_interpretation(&pts),
            CoordInterpretation::Geographic
        );
        let out = reproject_inventory(&pts).unwrap();
        assert_eq!(out, pts.to_vec());
    }

    #[test]
    fn detect_projected() {
        let pts = [(9_885_662.0, 4_999_386.0)];
        assert_eq!(detect_interpretation(&pts), CoordInterpretation::EckertIv);
    }
}
