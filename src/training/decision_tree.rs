//! Binary classification tree (CART, Gini impurity)

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::Classifier;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the fraction of positive samples that reached it
    Leaf { value: f64, n_samples: usize },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Gini impurity of a node with `pos` positives out of `n`
fn gini(pos: f64, n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let p = pos / n;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// Classification tree over 0/1 labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random for each split; all features when `None`
    pub max_features: Option<usize>,
    random_state: u64,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Fit on the given row indices of `x` (duplicates allowed, as in a
    /// bootstrap sample)
    pub fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if rows.is_empty() {
            return Err(ChurnError::TrainingError(
                "Cannot fit a decision tree on zero samples".to_string(),
            ));
        }
        if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
            return Err(ChurnError::TrainingError(format!(
                "Decision tree expects 0/1 labels, found {}",
                bad
            )));
        }

        self.n_features = x.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        self.root = Some(self.build_tree(x, y, rows, 0, &mut rng));
        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = rows.len();
        let positives: f64 = rows.iter().map(|&i| y[i]).sum();
        let leaf = TreeNode::Leaf {
            value: positives / n_samples as f64,
            n_samples,
        };

        let pure = positives == 0.0 || positives == n_samples as f64;
        if pure
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let features = self.candidate_features(rng);
        let Some((feature_idx, threshold)) = self.find_best_split(x, y, rows, positives, &features)
        else {
            return leaf;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&i| x[[i, feature_idx]] <= threshold);
        if left_rows.len() < self.min_samples_leaf || right_rows.len() < self.min_samples_leaf {
            return leaf;
        }

        let left = self.build_tree(x, y, &left_rows, depth + 1, rng);
        let right = self.build_tree(x, y, &right_rows, depth + 1, rng);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
            n_samples,
            impurity: gini(positives, n_samples as f64),
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => index::sample(rng, self.n_features, k.max(1)).into_vec(),
            _ => (0..self.n_features).collect(),
        }
    }

    /// Best (feature, threshold) by Gini decrease, scanning each candidate
    /// feature once in sorted order
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &[usize],
        positives: f64,
        features: &[usize],
    ) -> Option<(usize, f64)> {
        let n = rows.len();
        let parent = gini(positives, n as f64);
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = rows.to_vec();

        for &f in features {
            sorted.sort_by(|&a, &b| x[[a, f]].partial_cmp(&x[[b, f]]).unwrap_or(Ordering::Equal));

            let mut left_pos = 0.0;
            for pos in 0..n - 1 {
                let (cur, next) = (sorted[pos], sorted[pos + 1]);
                left_pos += y[cur];

                let (v, next_v) = (x[[cur, f]], x[[next, f]]);
                if next_v <= v {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(left_pos, n_left as f64)
                    + n_right as f64 * gini(positives - left_pos, n_right as f64))
                    / n as f64;
                let gain = parent - weighted;

                if best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((f, v + (next_v - v) / 2.0, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ChurnError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| root.predict(row)).collect())
    }

    fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_tree_separates_threshold() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0], [5.0, 5.0], [6.0, 5.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        match tree.root().unwrap() {
            TreeNode::Split { feature_idx, threshold, .. } => {
                assert_eq!(*feature_idx, 0);
                assert!((threshold - 3.5).abs() < 1e-12);
            }
            TreeNode::Leaf { .. } => panic!("expected a split at the root"),
        }
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y: Array1<f64> = (0..40).map(|i| ((i / 3) % 2) as f64).collect();

        let mut tree = DecisionTree::new().with_max_depth(Some(2));
        tree.fit(&x, &y).unwrap();
        assert!(tree.root().unwrap().depth() <= 2);

        let proba = tree.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let mut tree = DecisionTree::new();
        let err = tree.fit(&array![[1.0], [2.0]], &array![0.0, 2.0]).unwrap_err();
        assert!(matches!(err, ChurnError::TrainingError(_)));
    }

    #[test]
    fn test_feature_subsampling_is_seeded() {
        let x = Array2::from_shape_fn((60, 6), |(i, j)| ((i * 7 + j * 13) % 17) as f64);
        let y: Array1<f64> = (0..60).map(|i| (i % 2) as f64).collect();

        let fit = |seed| {
            let mut tree = DecisionTree::new().with_max_features(Some(2)).with_random_state(seed);
            tree.fit(&x, &y).unwrap();
            tree.predict_proba(&x).unwrap()
        };
        assert_eq!(fit(3), fit(3));
    }
}
