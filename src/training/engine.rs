//! Training engine: feature table, SMOTE, scaling, split, fit, score

use crate::artifact::{ArtifactStore, TrainedArtifact};
use crate::error::{ChurnError, Result};
use crate::preprocessing::StandardScaler;
use crate::synthetic::{labels_to_classes, Sampler, SMOTE};
use crate::utils::DataLoader;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::DataFrame;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::config::{Metric, ModelKind, TrainingConfig};
use super::linear_models::LogisticRegression;
use super::models::{Classifier, ModelMetrics};
use super::random_forest::RandomForest;
use super::xgboost::XGBoostClassifier;

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    XGBoost(XGBoostClassifier),
}

impl TrainedModel {
    /// Fit a fresh model of the given kind
    pub fn fit(kind: &ModelKind, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self> {
        let model = match kind {
            ModelKind::LogisticRegression(params) => {
                let mut model = LogisticRegression::new(params.clone());
                model.fit(x, y)?;
                TrainedModel::LogisticRegression(model)
            }
            ModelKind::RandomForest(params) => {
                let mut model = RandomForest::new(params.clone());
                model.fit(x, y)?;
                TrainedModel::RandomForest(model)
            }
            ModelKind::XGBoost(config) => {
                let mut model = XGBoostClassifier::new(config.clone());
                model.fit(x, y)?;
                TrainedModel::XGBoost(model)
            }
        };
        Ok(model)
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::XGBoost(m) => m,
        }
    }

    /// Class labels (0.0 / 1.0)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.classifier().predict(x)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.classifier().predict_proba(x)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TrainedModel::LogisticRegression(_) => "Logistic Regression",
            TrainedModel::RandomForest(_) => "Random Forest",
            TrainedModel::XGBoost(_) => "XGBoost",
        }
    }
}

/// Outcome of one evaluate run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: String,
    pub metrics: ModelMetrics,
    /// Rows in the training table before resampling
    pub n_raw_samples: usize,
    pub n_synthetic: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

impl EvaluationReport {
    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics.get(metric)
    }
}

/// Shuffled train/test partition
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(test_size * n)` of them
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<Split> {
    let n = x.nrows();
    if n != y.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("y length = {}", n),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ChurnError::ValidationError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ChurnError::TrainingError(format!(
            "Cannot split {} samples with test_size {}",
            n, test_size
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(n_test);

    Ok(Split {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: y.select(Axis(0), train_idx),
        y_test: y.select(Axis(0), test_idx),
    })
}

/// Runs the churn training pipeline
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
    loader: DataLoader,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn load_training_data(&self) -> Result<DataFrame> {
        self.loader.load_csv(&self.config.data_path)
    }

    /// Train and score a model on a raw churn table without persisting it
    pub fn fit_frame(
        &self,
        df: &DataFrame,
        kind: &ModelKind,
    ) -> Result<(TrainedArtifact, EvaluationReport)> {
        let start = Instant::now();
        let features = &self.config.features;

        let table = features.build(df)?;
        debug!(rows = table.n_samples(), features = table.x.ncols(), "Built feature table");

        let classes = labels_to_classes(&table.y);
        let resampled = SMOTE::new()
            .with_k_neighbors(self.config.smote_k_neighbors)
            .with_seed(self.config.random_seed)
            .fit_resample(&table.x, &classes)?;
        debug!(
            rows = resampled.x.nrows(),
            synthetic = resampled.total_synthetic(),
            "Resampled with SMOTE"
        );

        let mut scaler = StandardScaler::new();
        let x = scaler.fit_transform(&resampled.x)?;
        let y = resampled.y.mapv(|c| c as f64);

        let split = train_test_split(&x, &y, self.config.test_size, self.config.random_seed)?;
        let model = TrainedModel::fit(kind, &split.x_train, &split.y_train)?;

        let y_pred = model.predict(&split.x_test)?;
        let metrics = ModelMetrics::compute_classification(&split.y_test, &y_pred);
        let elapsed = start.elapsed().as_secs_f64();

        info!(
            model = %kind,
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            train = split.x_train.nrows(),
            test = split.x_test.nrows(),
            secs = elapsed,
            "Model evaluated"
        );

        let report = EvaluationReport {
            model: kind.name().to_string(),
            metrics: metrics.clone(),
            n_raw_samples: table.n_samples(),
            n_synthetic: resampled.total_synthetic(),
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            training_time_secs: elapsed,
        };
        let artifact = TrainedArtifact::new(model, scaler, features.schema.clone(), metrics);

        Ok((artifact, report))
    }

    /// Load the training CSV, train, and overwrite the stored artifact
    pub fn run(&self, kind: &ModelKind, store: &ArtifactStore) -> Result<EvaluationReport> {
        let df = self.load_training_data()?;
        let (artifact, report) = self.fit_frame(&df, kind)?;
        store.save(&artifact)?;
        Ok(report)
    }
}
