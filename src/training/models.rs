//! Classifier trait and evaluation metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::config::Metric;

/// Held-out classification metrics.
///
/// Precision and recall are macro averages: the unweighted mean over every
/// class that appears in the truth or the predictions. A per-class ratio with
/// a zero denominator counts as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute classification metrics from class labels encoded as floats
    pub fn compute_classification(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len();
        if n == 0 {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1_score: 0.0,
                n_samples: 0,
            };
        }

        let to_class = |v: &f64| v.round() as i64;

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| to_class(t) == to_class(p))
            .count();

        let classes: BTreeSet<i64> = y_true.iter().chain(y_pred.iter()).map(to_class).collect();

        let mut precision_sum = 0.0;
        let mut recall_sum = 0.0;
        for &class in &classes {
            let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
            for (t, p) in y_true.iter().zip(y_pred.iter()) {
                match (to_class(t) == class, to_class(p) == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            precision_sum += ratio(tp, tp + fp);
            recall_sum += ratio(tp, tp + fn_);
        }

        let n_classes = classes.len() as f64;
        let precision = precision_sum / n_classes;
        let recall = recall_sum / n_classes;
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: correct as f64 / n as f64,
            precision,
            recall,
            f1_score,
            n_samples: n,
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Binary classifier over a dense feature matrix
pub trait Classifier: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive class per row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Class labels (0.0 / 1.0), positive at probability >= 0.5
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn is_fitted(&self) -> bool;
}
