//! Training configuration: model kinds, metrics and pipeline constants

use crate::preprocessing::FeatureTableBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::xgboost::XGBoostConfig;

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub max_iter: usize,
    pub learning_rate: f64,
    /// L2 penalty strength
    pub alpha: f64,
    /// Stop once the norm of a weight update drops below this
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            max_iter: 200,
            learning_rate: 0.5,
            alpha: 1e-4,
            tol: 1e-6,
        }
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            random_state: 42,
        }
    }
}

/// Supported classifier kinds, each carrying its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression(LogisticParams),
    RandomForest(ForestParams),
    XGBoost(XGBoostConfig),
}

impl ModelKind {
    /// Names accepted over HTTP and on the command line
    pub const NAMES: [&'static str; 3] = ["Logistic Regression", "Random Forest", "XGBoost"];

    /// Parse a display name into a kind with default hyperparameters
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Logistic Regression" => Some(ModelKind::LogisticRegression(LogisticParams::default())),
            "Random Forest" => Some(ModelKind::RandomForest(ForestParams::default())),
            "XGBoost" => Some(ModelKind::XGBoost(XGBoostConfig::default())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression(_) => "Logistic Regression",
            ModelKind::RandomForest(_) => "Random Forest",
            ModelKind::XGBoost(_) => "XGBoost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluation metric that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Accuracy" => Some(Metric::Accuracy),
            "Precision" => Some(Metric::Precision),
            "Recall" => Some(Metric::Recall),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "Accuracy",
            Metric::Precision => "Precision",
            Metric::Recall => "Recall",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline settings shared by every model kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    /// Held-out fraction, rounded up
    pub test_size: f64,
    pub random_seed: u64,
    pub smote_k_neighbors: usize,
    pub features: FeatureTableBuilder,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data/custChurn.csv"),
            test_size: 0.3,
            random_seed: 42,
            smote_k_neighbors: 5,
            features: FeatureTableBuilder::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}
