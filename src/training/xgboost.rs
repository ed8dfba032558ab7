//! XGBoost-style gradient boosting for binary classification
//!
//! Trees are fitted to the gradient and hessian of the logistic loss:
//! - leaf weight: w* = -G / (H + lambda)
//! - split gain: 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ
//! - splits must leave at least `min_child_weight` hessian on each side

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::Classifier;

/// XGBoost configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XGBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum loss reduction to make a split
    pub gamma: f64,
    /// Row fraction sampled per tree
    pub subsample: f64,
    /// Column fraction sampled per tree
    pub colsample_bytree: f64,
    pub random_state: u64,
}

impl Default for XGBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum XGBNode {
    Leaf { weight: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<XGBNode>,
        right: Box<XGBNode>,
    },
}

impl XGBNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                XGBNode::Leaf { weight } => return *weight,
                XGBNode::Split { feature, threshold, left, right } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

/// Gradient statistics shared by every node of one boosting round
struct RoundStats<'a> {
    x: &'a Array2<f64>,
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
    features: &'a [usize],
    config: &'a XGBoostConfig,
}

impl RoundStats<'_> {
    fn build(&self, rows: &[usize], depth: usize) -> XGBNode {
        let g_sum: f64 = rows.iter().map(|&i| self.grad[i]).sum();
        let h_sum: f64 = rows.iter().map(|&i| self.hess[i]).sum();
        let weight = -g_sum / (h_sum + self.config.reg_lambda);

        if depth >= self.config.max_depth || rows.len() < 2 || h_sum < self.config.min_child_weight {
            return XGBNode::Leaf { weight };
        }

        let best = self
            .features
            .par_iter()
            .filter_map(|&f| self.best_split_for_feature(rows, f, g_sum, h_sum))
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal).then(b.0.cmp(&a.0)));

        match best {
            Some((feature, threshold, gain)) if gain > self.config.gamma => {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                    rows.iter().partition(|&&i| self.x[[i, feature]] <= threshold);
                if left_rows.is_empty() || right_rows.is_empty() {
                    return XGBNode::Leaf { weight };
                }

                XGBNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.build(&left_rows, depth + 1)),
                    right: Box::new(self.build(&right_rows, depth + 1)),
                }
            }
            _ => XGBNode::Leaf { weight },
        }
    }

    /// Exact greedy scan over one feature: (feature, threshold, gain)
    fn best_split_for_feature(
        &self,
        rows: &[usize],
        feature: usize,
        g_total: f64,
        h_total: f64,
    ) -> Option<(usize, f64, f64)> {
        let x = self.x;
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| x[[a, feature]].partial_cmp(&x[[b, feature]]).unwrap_or(Ordering::Equal));

        let lambda = self.config.reg_lambda;
        let parent_score = g_total * g_total / (h_total + lambda);
        let (mut g_left, mut h_left) = (0.0, 0.0);
        let mut best: Option<(f64, f64)> = None;

        for pos in 0..sorted.len().saturating_sub(1) {
            let (cur, next) = (sorted[pos], sorted[pos + 1]);
            g_left += self.grad[cur];
            h_left += self.hess[cur];

            let (v, next_v) = (x[[cur, feature]], x[[next, feature]]);
            if next_v <= v {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                    - parent_score);
            if best.map_or(true, |(_, g)| gain > g) {
                best = Some((v + (next_v - v) / 2.0, gain));
            }
        }

        best.map(|(threshold, gain)| (feature, threshold, gain))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

/// Gradient boosted trees with logistic loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XGBoostClassifier {
    config: XGBoostConfig,
    trees: Vec<XGBNode>,
    /// Initial log-odds
    base_score: f64,
    n_features: usize,
}

impl Default for XGBoostClassifier {
    fn default() -> Self {
        Self::new(XGBoostConfig::default())
    }
}

impl XGBoostClassifier {
    pub fn new(config: XGBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn raw_score(&self, sample: ArrayView1<f64>) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|t| self.config.learning_rate * t.predict(sample))
                .sum::<f64>()
    }
}

impl Classifier for XGBoostClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::TrainingError(
                "Cannot fit XGBoost on an empty matrix".to_string(),
            ));
        }

        self.n_features = n_features;
        let p = y.mean().unwrap_or(0.5).clamp(1e-7, 1.0 - 1e-7);
        self.base_score = (p / (1.0 - p)).ln();
        let mut raw = Array1::from_elem(n_samples, self.base_score);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        self.trees.clear();

        for _ in 0..self.config.n_estimators {
            let probs = raw.mapv(sigmoid);
            let grad: Array1<f64> = &probs - y;
            let hess: Array1<f64> = probs.mapv(|p| (p * (1.0 - p)).max(1e-7));

            let rows = subsample(&mut rng, n_samples, self.config.subsample);
            let features = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let stats = RoundStats {
                x,
                grad: &grad,
                hess: &hess,
                features: &features,
                config: &self.config,
            };
            let tree = stats.build(&rows, 0);

            for (i, r) in raw.iter_mut().enumerate() {
                *r += self.config.learning_rate * tree.predict(x.row(i));
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() && self.config.n_estimators > 0 {
            return Err(ChurnError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ChurnError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| sigmoid(self.raw_score(row))).collect())
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
