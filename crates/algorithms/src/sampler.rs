//! Spatial negative sampler
//!
//! Draws uniformly-random candidate locations inside a bounding region and
//! accepts a candidate only if its Euclidean distance (in degrees) to every
//! positive location and every previously accepted negative exceeds a
//! minimum threshold. Terminates at the target count or when the attempt
//! budget runs out; under-generation is a warning, not an error.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};
use windprep_core::sample::BoundingBox;
use windprep_core::{Error, Result};

/// Parameters for negative sampling
#[derive(Debug, Clone)]
pub struct SamplerParams {
    /// Number of negatives to generate
    pub target_count: usize,
    /// Minimum Euclidean distance (degrees) to positives and earlier
    /// negatives
    pub min_distance: f64,
    /// Attempt budget. This is the only guard against a saturated region,
    /// so it must be finite.
    pub max_attempts: usize,
    /// RNG seed. `None` draws from entropy; set it for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            target_count: 1000,
            min_distance: 0.01,
            max_attempts: 10_000,
            seed: None,
        }
    }
}

impl SamplerParams {
    /// Conventional budget: ten attempts per requested negative.
    pub fn with_default_budget(target_count: usize, min_distance: f64, seed: Option<u64>) -> Self {
        Self {
            target_count,
            min_distance,
            max_attempts: target_count.saturating_mul(10),
            seed,
        }
    }
}

/// Squared distance from (x, y) to the nearest point in `points`, or
/// infinity for an empty slice.
fn nearest_sq_distance(points: &[(f64, f64)], x: f64, y: f64) -> f64 {
    points
        .iter()
        .map(|&(px, py)| {
            let dx = px - x;
            let dy = py - y;
            dx * dx + dy * dy
        })
        .fold(f64::INFINITY, f64::min)
}

/// Generate negative sample locations inside `region`.
///
/// # Arguments
/// * `positives` - Existing positive centers, `(lon, lat)` degrees
/// * `region` - Sampling bounds
/// * `params` - Target count, distance threshold, attempt budget, seed
///
/// # Returns
/// Accepted `(lon, lat)` locations, at most `target_count` of them, in
/// acceptance order. Every returned point is farther than `min_distance`
/// from all positives and from all earlier returned points.
pub fn sample_negatives(
    positives: &[(f64, f64)],
    region: BoundingBox,
    params: &SamplerParams,
) -> Result<Vec<(f64, f64)>> {
    if params.min_distance < 0.0 {
        return Err(Error::InvalidParameter {
            name: "min_distance",
            value: params.min_distance.to_string(),
            reason: "must be non-negative".into(),
        });
    }
    if region.width() <= 0.0 || region.height() <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "region",
            value: format!("{region:?}"),
            reason: "sampling region must have positive extent".into(),
        });
    }

    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let min_sq = params.min_distance * params.min_distance;
    let mut accepted: Vec<(f64, f64)> = Vec::with_capacity(params.target_count);
    let mut attempts = 0usize;

    while accepted.len() < params.target_count && attempts < params.max_attempts {
        attempts += 1;

        let x = rng.gen_range(region.min_x..region.max_x);
        let y = rng.gen_range(region.min_y..region.max_y);

        // Single batched pass over positives, then the accepted set.
        let nearest = nearest_sq_distance(positives, x, y)
            .min(nearest_sq_distance(&accepted, x, y));
        if nearest > min_sq {
            accepted.push((x, y));
        }
    }

    if accepted.len() < params.target_count {
        warn!(
            accepted = accepted.len(),
            target = params.target_count,
            attempts,
            "attempt budget exhausted before reaching target count"
        );
    } else {
        debug!(accepted = accepted.len(), attempts, "negative sampling finished");
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> BoundingBox {
        BoundingBox::new(73.5, 18.0, 135.0, 53.5)
    }

    fn grid_positives() -> Vec<(f64, f64)> {
        let mut pts = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                pts.push((80.0 + i as f64 * 5.0, 20.0 + j as f64 * 3.0));
            }
        }
        pts
    }

    #[test]
    fn respects_min_distance_to_positives_and_negatives() {
        let positives = grid_positives();
        let params = SamplerParams {
            target_count: 200,
            min_distance: 0.5,
            max_attempts: 20_000,
            seed: Some(42),
        };
        let negatives = sample_negatives(&positives, region(), &params).unwrap();
        assert!(!negatives.is_empty());

        for (i, &(x, y)) in negatives.iter().enumerate() {
            let d_pos = nearest_sq_distance(&positives, x, y).sqrt();
            assert!(d_pos > 0.5, "negative {i} too close to a positive: {d_pos}");
            let d_neg = nearest_sq_distance(&negatives[..i], x, y).sqrt();
            assert!(d_neg > 0.5, "negative {i} too close to an earlier negative: {d_neg}");
        }
    }

    #[test]
    fn never_exceeds_target_count() {
        let params = SamplerParams {
            target_count: 17,
            min_distance: 0.01,
            max_attempts: 10_000,
            seed: Some(7),
        };
        let negatives = sample_negatives(&[], region(), &params).unwrap();
        assert_eq!(negatives.len(), 17);
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let positives = grid_positives();
        let params = SamplerParams {
            target_count: 50,
            min_distance: 0.1,
            max_attempts: 5_000,
            seed: Some(1234),
        };
        let a = sample_negatives(&positives, region(), &params).unwrap();
        let b = sample_negatives(&positives, region(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn all_points_inside_region() {
        let r = BoundingBox::new(100.0, 30.0, 101.0, 31.0);
        let params = SamplerParams {
            target_count: 100,
            min_distance: 0.0,
            max_attempts: 1_000,
            seed: Some(5),
        };
        let negatives = sample_negatives(&[], r, &params).unwrap();
        assert_eq!(negatives.len(), 100);
        for &(x, y) in &negatives {
            assert!(r.contains_point(x, y));
        }
    }

    #[test]
    fn saturated_region_terminates_undersized() {
        // min_distance larger than the region diagonal: after the first
        // acceptance nothing else can qualify.
        let r = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let params = SamplerParams {
            target_count: 100,
            min_distance: 5.0,
            max_attempts: 500,
            seed: Some(99),
        };
        let negatives = sample_negatives(&[], r, &params).unwrap();
        assert_eq!(negatives.len(), 1);
    }

    #[test]
    fn impossible_threshold_returns_empty() {
        // A positive in the middle of a tiny region with a huge threshold:
        // no candidate can ever be accepted.
        let r = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let params = SamplerParams {
            target_count: 10,
            min_distance: 10.0,
            max_attempts: 200,
            seed: Some(3),
        };
        let negatives = sample_negatives(&[(0.5, 0.5)], r, &params).unwrap();
        assert!(negatives.is_empty());
    }

    #[test]
    fn rejects_negative_min_distance() {
        let params = SamplerParams {
            min_distance: -1.0,
            ..SamplerParams::default()
        };
        assert!(sample_negatives(&[], region(), &params).is_err());
    }

    #[test]
    fn rejects_degenerate_region() {
        let r = BoundingBox::new(10.0, 10.0, 10.0, 20.0);
        assert!(sample_negatives(&[], r, &SamplerParams::default()).is_err());
    }

    #[test]
    fn default_budget_is_ten_per_target() {
        let p = SamplerParams::with_default_budget(2000, 0.01, Some(1));
        assert_eq!(p.max_attempts, 20_000);
    }
}
