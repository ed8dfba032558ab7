//! Class rebalancing by synthetic oversampling
//!
//! The churn table is heavily skewed towards non-churners, so training
//! oversamples every minority class up to the majority count with SMOTE
//! before scaling and splitting.

mod smote;

pub use smote::SMOTE;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Original rows first, synthetic rows after
    pub x: Array2<f64>,
    pub y: Array1<i64>,
    /// Synthetic samples generated per class, in label order
    pub n_synthetic: Vec<(i64, usize)>,
}

impl ResampleResult {
    pub fn total_synthetic(&self) -> usize {
        self.n_synthetic.iter().map(|(_, n)| n).sum()
    }
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Learn per-class targets
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Class distribution, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices for each class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

/// Convert a 0/1 float label vector into class ids
pub fn labels_to_classes(y: &Array1<f64>) -> Array1<i64> {
    y.mapv(|v| v.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_class_counts_ordered() {
        let y = array![1i64, 0, 1, 2, 0, 1];
        let counts: Vec<(i64, usize)> = class_counts(&y).into_iter().collect();
        assert_eq!(counts, vec![(0, 2), (1, 3), (2, 1)]);

        let idx = class_indices(&y);
        assert_eq!(idx[&1], vec![0, 2, 5]);
    }

    #[test]
    fn test_labels_to_classes() {
        let y = array![0.0, 1.0, 1.0];
        assert_eq!(labels_to_classes(&y), array![0i64, 1, 1]);
    }
}
