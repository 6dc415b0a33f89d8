//! Feature extraction for the local fallback classifier
//!
//! Until platform-extracted spectral features are available, samples are
//! described by their geometry alone: center coordinates and the four bbox
//! corners.

use ndarray::Array2;
use windprep_core::{Error, Result, SampleSet};

/// Column names of the geometric feature matrix
pub const FEATURE_NAMES: [&str; 6] = ["center_x", "center_y", "xmin", "ymin", "xmax", "ymax"];

/// Build the geometric feature matrix and class-label vector for a set.
///
/// # Returns
/// `(features, labels)` with one row per sample and
/// [`FEATURE_NAMES`]`.len()` columns.
pub fn geometric_features(set: &SampleSet) -> Result<(Array2<f64>, Vec<u8>)> {
    if set.is_empty() {
        return Err(Error::Other("cannot extract features from an empty sample set".into()));
    }

    let mut flat = Vec::with_capacity(set.len() * FEATURE_NAMES.len());
    let mut labels = Vec::with_capacity(set.len());
    for s in set.iter() {
        flat.extend_from_slice(&[
            s.center_x,
            s.center_y,
            s.bbox.min_x,
            s.bbox.min_y,
            s.bbox.max_x,
            s.bbox.max_y,
        ]);
        labels.push(s.class.code());
    }

    let features = Array2::from_shape_vec((set.len(), FEATURE_NAMES.len()), flat)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok((features, labels))
}
