//! Linear classifier

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::config::LogisticParams;
use super::models::Classifier;

/// Logistic regression for binary classification, fitted by batch gradient
/// descent with an L2 penalty on the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    params: LogisticParams,
    /// Iterations actually run by the last fit
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticParams::default())
    }
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            params,
            n_iter: 0,
        }
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }
}

impl Classifier for LogisticRegression {
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
                "Cannot fit logistic regression on an empty matrix".to_string(),
            ));
        }

        let mut weights = Array1::<f64>::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.params.learning_rate;
        let alpha = self.params.alpha;

        self.n_iter = 0;
        for _ in 0..self.params.max_iter {
            self.n_iter += 1;
            let predictions = Self::sigmoid(&(x.dot(&weights) + bias));
            let errors = &predictions - y;

            let dw = x.t().dot(&errors) / n_samples as f64 + alpha * &weights;
            let db = errors.mean().unwrap_or(0.0);

            let step = (dw.mapv(|v| v * v).sum() + db * db).sqrt() * lr;
            weights = weights - lr * dw;
            bias -= lr * db;

            if step < self.params.tol {
                break;
            }
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(ChurnError::TrainingError(
                "Logistic regression diverged".to_string(),
            ));
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} columns", coefficients.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(Self::sigmoid(&(x.dot(coefficients) + self.intercept)))
    }

    fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logistic_regression() {
        let x = array![
            [1.0, 1.0],
            [1.5, 1.5],
            [2.0, 2.0],
            [5.0, 5.0],
            [5.5, 5.5],
            [6.0, 6.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new(LogisticParams { max_iter: 1000, ..Default::default() });
        model.fit(&x, &y).unwrap();
        assert!(model.is_fitted());

        let pred = model.predict(&x).unwrap();
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 5, "only {} of 6 correct", correct);
    }

    #[test]
    fn test_predict_proba_orders_extremes() {
        let x = array![[0.0, 0.0], [10.0, 10.0]];
        let y = array![0.0, 1.0];

        let mut model = LogisticRegression::default();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[1] > 0.5);
    }

    #[test]
    fn test_unfitted_and_shape_errors() {
        let model = LogisticRegression::default();
        assert!(matches!(model.predict(&array![[1.0]]), Err(ChurnError::ModelNotFitted)));

        let mut model = LogisticRegression::default();
        assert!(model.fit(&array![[1.0], [2.0]], &array![0.0]).is_err());
    }

    #[test]
    fn test_respects_max_iter() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegression::new(LogisticParams { max_iter: 7, ..Default::default() });
        model.fit(&x, &y).unwrap();
        assert!(model.n_iter() <= 7);
    }
}
