//! Random forest classifier

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::ForestParams;
use super::decision_tree::DecisionTree;
use super::models::Classifier;

/// Strategy for the number of features tried at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// floor(sqrt(n_features))
    Sqrt,
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::All => n_features,
        }
    }
}

/// Bagged ensemble of Gini trees.
///
/// Each tree is fitted on its own bootstrap sample with a seed derived from
/// `random_state`, so the forest is reproducible regardless of how rayon
/// schedules the work. The positive class wins only with a strictly
/// greater mean probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    params: ForestParams,
    pub max_features: MaxFeatures,
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            trees: Vec::new(),
            params,
            max_features: MaxFeatures::Sqrt,
            n_features: 0,
        }
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn bootstrap_rows(&self, rng: &mut ChaCha8Rng, n_samples: usize) -> Vec<usize> {
        if self.params.bootstrap {
            (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
        } else {
            (0..n_samples).collect()
        }
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || self.params.n_estimators == 0 {
            return Err(ChurnError::TrainingError(
                "Random forest needs at least one sample and one tree".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let max_features = self.max_features.resolve(self.n_features);
        let base_seed = self.params.random_state;

        let trees: Result<Vec<DecisionTree>> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let rows = self.bootstrap_rows(&mut rng, n_samples);

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.params.max_depth)
                    .with_min_samples_split(self.params.min_samples_split)
                    .with_min_samples_leaf(self.params.min_samples_leaf)
                    .with_max_features(Some(max_features))
                    .with_random_state(rng.gen());
                tree.fit_rows(x, y, &rows)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<_>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for p in &per_tree {
            sum += p;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
