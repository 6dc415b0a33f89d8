//! Local fallback classifier
//!
//! Gaussian signature classifiers over sample feature vectors, used when
//! the cloud platform is unavailable. Each class gets a signature (per-
//! feature mean and standard deviation) estimated from training rows;
//! prediction is nearest-centroid (minimum distance) or diagonal-Gaussian
//! maximum likelihood.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use windprep_core::{Error, Result};

/// Guard against zero variance in a degenerate training column
const MIN_STD_DEV: f64 = 1e-10;

/// A class signature derived from training rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSignature {
    /// Class label (output value)
    pub label: u8,
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature standard deviation (used by maximum likelihood)
    pub std_dev: Vec<f64>,
}

/// Estimate per-class signatures from a feature matrix and labels.
///
/// Classes with fewer than 2 training rows are skipped. Signatures are
/// returned in ascending label order.
pub fn signatures_from_training(
    features: &Array2<f64>,
    labels: &[u8],
) -> Result<Vec<ClassSignature>> {
    if features.nrows() != labels.len() {
        return Err(Error::Other(format!(
            "feature rows ({}) do not match labels ({})",
            features.nrows(),
            labels.len()
        )));
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let cols = features.ncols();
    let mut signatures = Vec::new();
    for (label, rows) in &by_class {
        if rows.len() < 2 {
            continue;
        }
        let n = rows.len() as f64;

        let mut mean = vec![0.0; cols];
        for &r in rows {
            for (c, m) in mean.iter_mut().enumerate() {
                *m += features[[r, c]];
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std_dev = vec![0.0; cols];
        for &r in rows {
            for (c, v) in std_dev.iter_mut().enumerate() {
                let d = features[[r, c]] - mean[c];
                *v += d * d;
            }
        }
        for v in &mut std_dev {
            *v = (*v / (n - 1.0)).sqrt().max(MIN_STD_DEV);
        }

        signatures.push(ClassSignature {
            label: *label,
            mean,
            std_dev,
        });
    }
    Ok(signatures)
}

fn check_signatures(signatures: &[ClassSignature], cols: usize) -> Result<()> {
    if signatures.len() < 2 {
        return Err(Error::Other(
            "classification requires at least 2 class signatures".into(),
        ));
    }
    for sig in signatures {
        if sig.mean.len() != cols || sig.std_dev.len() != cols {
            return Err(Error::Other(format!(
                "signature for class {} has wrong dimensionality",
                sig.label
            )));
        }
        if sig.std_dev.iter().any(|&s| s <= 0.0) {
            return Err(Error::Other(format!(
                "class {} has a non-positive std_dev",
                sig.label
            )));
        }
    }
    Ok(())
}

fn sq_distance(row: ArrayView1<'_, f64>, mean: &[f64]) -> f64 {
    row.iter()
        .zip(mean)
        .map(|(v, m)| (v - m) * (v - m))
        .sum()
}

/// Minimum distance classification.
///
/// Assigns each row to the class with the nearest centroid. Simple and
/// fast but ignores class variance.
pub fn minimum_distance(features: &Array2<f64>, signatures: &[ClassSignature]) -> Result<Vec<u8>> {
    check_signatures(signatures, features.ncols())?;

    let predictions = features
        .rows()
        .into_iter()
        .map(|row| {
            let mut best_dist = f64::INFINITY;
            let mut best_label = signatures[0].label;
            for sig in signatures {
                let dist = sq_distance(row, &sig.mean);
                if dist < best_dist {
                    best_dist = dist;
                    best_label = sig.label;
                }
            }
            best_label
        })
        .collect();
    Ok(predictions)
}

/// Maximum likelihood classification.
///
/// Assigns each row to the class with the highest diagonal-Gaussian
/// log-likelihood:
///
/// `ln P(x|c) = Σ_j [ -ln(σ_cj) - 0.5 ln(2π) - (x_j - μ_cj)² / (2 σ_cj²) ]`
pub fn maximum_likelihood(
    features: &Array2<f64>,
    signatures: &[ClassSignature],
) -> Result<Vec<u8>> {
    check_signatures(signatures, features.ncols())?;

    // Precompute the per-class constant term: -Σ ln σ - d/2 ln(2π)
    let half_ln_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
    let log_consts: Vec<f64> = signatures
        .iter()
        .map(|sig| {
            -sig.std_dev.iter().map(|s| s.ln()).sum::<f64>()
                - sig.std_dev.len() as f64 * half_ln_2pi
        })
        .collect();

    let predictions = features
        .rows()
        .into_iter()
        .map(|row| {
            let mut best_ll = f64::NEG_INFINITY;
            let mut best_label = signatures[0].label;
            for (i, sig) in signatures.iter().enumerate() {
                let exponent: f64 = row
                    .iter()
                    .zip(sig.mean.iter().zip(&sig.std_dev))
                    .map(|(v, (m, s))| {
                        let z = (v - m) / s;
                        z * z
                    })
                    .sum();
                let ll = log_consts[i] - 0.5 * exponent;
                if ll > best_ll {
                    best_ll = ll;
                    best_label = sig.label;
                }
            }
            best_label
        })
        .collect();
    Ok(predictions)
}

/// Stratified train/test split of row indices.
///
/// Shuffles within each class with a seeded RNG, then assigns
/// `test_fraction` of each class to the test set.
pub fn train_test_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(Error::InvalidParameter {
            name: "test_fraction",
            value: test_fraction.to_string(),
            reason: "must be in (0, 1)".into(),
        });
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut rows) in by_class {
        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64) * test_fraction).round() as usize;
        let n_test = n_test.min(rows.len().saturating_sub(1));
        test.extend(rows.drain(..n_test));
        train.extend(rows);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// 2×2 confusion matrix for the binary turbine/background problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    /// counts[actual][predicted], classes 0 and 1
    counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    /// Tally predictions against ground truth. Labels must be 0 or 1.
    pub fn from_predictions(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(Error::Other(format!(
                "actual ({}) and predicted ({}) lengths differ",
                actual.len(),
                predicted.len()
            )));
        }
        let mut counts = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a > 1 || p > 1 {
                return Err(Error::Other(format!("labels must be 0 or 1, got ({a}, {p})")));
            }
            counts[a as usize][p as usize] += 1;
        }
        Ok(Self { counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.counts[0][0] + self.counts[1][1]) as f64 / total as f64
    }

    /// Cohen's kappa: agreement beyond chance
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let po = self.accuracy();
        let pe = (0..2)
            .map(|c| {
                let actual_c = (self.counts[c][0] + self.counts[c][1]) as f64;
                let predicted_c = (self.counts[0][c] + self.counts[1][c]) as f64;
                (actual_c / total) * (predicted_c / total)
            })
            .sum::<f64>();
        if (1.0 - pe).abs() < f64::EPSILON {
            return 0.0;
        }
        (po - pe) / (1.0 - pe)
    }

    /// Precision for a class: TP / (TP + FP)
    pub fn precision(&self, class: u8) -> f64 {
        let c = class as usize;
        let tp = self.counts[c][c] as f64;
        let predicted = (self.counts[0][c] + self.counts[1][c]) as f64;
        if predicted == 0.0 {
            0.0
        } else {
            tp / predicted
        }
    }

    /// Recall for a class: TP / (TP + FN)
    pub fn recall(&self, class: u8) -> f64 {
        let c = class as usize;
        let tp = self.counts[c][c] as f64;
        let actual = (self.counts[c][0] + self.counts[c][1]) as f64;
        if actual == 0.0 {
            0.0
        } else {
            tp / actual
        }
    }

    /// F1 score for a class
    pub fn f1(&self, class: u8) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "              predicted 0  predicted 1")?;
        writeln!(
            f,
            "actual 0      {:>11}  {:>11}",
            self.counts[0][0], self.counts[0][1]
        )?;
        writeln!(
            f,
            "actual 1      {:>11}  {:>11}",
            self.counts[1][0], self.counts[1][1]
        )?;
        writeln!(f, "accuracy: {:.4}  kappa: {:.4}", self.accuracy(), self.kappa())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Two well-separated clusters: class 1 near (116, 40), class 0 near
    /// (100, 30).
    fn clustered_data() -> (Array2<f64>, Vec<u8>) {
        let features = array![
            [116.0, 40.0],
            [116.1, 40.1],
            [115.9, 39.9],
            [100.0, 30.0],
            [100.1, 30.1],
            [99.9, 29.9],
        ];
        let labels = vec![1, 1, 1, 0, 0, 0];
        (features, labels)
    }

    #[test]
    fn signatures_are_per_class_means() {
        let (features, labels) = clustered_data();
        let sigs = signatures_from_training(&features, &labels).unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].label, 0);
        assert_eq!(sigs[1].label, 1);
        assert!((sigs[1].mean[0] - 116.0).abs() < 1e-9);
        assert!((sigs[0].mean[1] - 30.0).abs() < 1e-9);
        assert!(sigs.iter().all(|s| s.std_dev.iter().all(|&v| v > 0.0)));
    }

    #[test]
    fn singleton_class_is_skipped() {
        let features = array![[1.0], [2.0], [100.0]];
        let labels = vec![0, 0, 1];
        let sigs = signatures_from_training(&features, &labels).unwrap();
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].label, 0);
    }

    #[test]
    fn minimum_distance_separates_clusters() {
        let (features, labels) = clustered_data();
        let sigs = signatures_from_training(&features, &labels).unwrap();
        let test = array![[115.8, 40.2], [100.2, 29.8]];
        let predicted = minimum_distance(&test, &sigs).unwrap();
        assert_eq!(predicted, vec![1, 0]);
    }

    #[test]
    fn maximum_likelihood_separates_clusters() {
        let (features, labels) = clustered_data();
        let sigs = signatures_from_training(&features, &labels).unwrap();
        let test = array![[116.05, 39.95], [99.95, 30.05]];
        let predicted = maximum_likelihood(&test, &sigs).unwrap();
        assert_eq!(predicted, vec![1, 0]);
    }

    #[test]
    fn too_few_signatures_is_an_error() {
        let (features, _) = clustered_data();
        let one = vec![ClassSignature {
            label: 0,
            mean: vec![0.0, 0.0],
            std_dev: vec![1.0, 1.0],
        }];
        assert!(minimum_distance(&features, &one).is_err());
        assert!(maximum_likelihood(&features, &one).is_err());
    }

    #[test]
    fn split_is_stratified_and_deterministic() {
        let labels: Vec<u8> = [vec![1u8; 40], vec![0u8; 60]].concat();
        let (train_a, test_a) = train_test_split(&labels, 0.3, 42).unwrap();
        let (train_b, test_b) = train_test_split(&labels, 0.3, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        assert_eq!(train_a.len() + test_a.len(), 100);
        let test_pos = test_a.iter().filter(|&&i| labels[i] == 1).count();
        let test_neg = test_a.len() - test_pos;
        assert_eq!(test_pos, 12); // 30% of 40
        assert_eq!(test_neg, 18); // 30% of 60
    }

    #[test]
    fn split_rejects_bad_fraction() {
        assert!(train_test_split(&[0, 1], 0.0, 1).is_err());
        assert!(train_test_split(&[0, 1], 1.0, 1).is_err());
    }

    #[test]
    fn confusion_matrix_metrics() {
        // 40 TN, 10 FP, 5 FN, 45 TP
        let mut actual = Vec::new();
        let mut predicted = Vec::new();
        for _ in 0..40 {
            actual.push(0);
            predicted.push(0);
        }
        for _ in 0..10 {
            actual.push(0);
            predicted.push(1);
        }
        for _ in 0..5 {
            actual.push(1);
            predicted.push(0);
        }
        for _ in 0..45 {
            actual.push(1);
            predicted.push(1);
        }
        let cm = ConfusionMatrix::from_predictions(&actual, &predicted).unwrap();
        assert!((cm.accuracy() - 0.85).abs() < 1e-12);
        assert!((cm.precision(1) - 45.0 / 55.0).abs() < 1e-12);
        assert!((cm.recall(1) - 0.9).abs() < 1e-12);
        // po = 0.85, pe = 0.5*0.45 + 0.5*0.55 = 0.5 → kappa = 0.7
        assert!((cm.kappa() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn perfect_prediction_kappa_is_one() {
        let actual = vec![0, 0, 1, 1];
        let cm = ConfusionMatrix::from_predictions(&actual, &actual).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < 1e-12);
        assert!((cm.kappa() - 1.0).abs() < 1e-12);
    }
}
