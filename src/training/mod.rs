//! Model training module
//!
//! Fits one of three binary classifiers on the resampled, scaled churn table:
//! - Logistic regression (gradient descent)
//! - Random forest (bagged Gini trees)
//! - XGBoost-style gradient boosting

mod config;
mod engine;
mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;
pub mod xgboost;

pub use config::{ForestParams, LogisticParams, Metric, ModelKind, TrainingConfig};
pub use engine::{train_test_split, EvaluationReport, Split, TrainEngine, TrainedModel};
pub use models::{Classifier, ModelMetrics};
pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LogisticRegression;
pub use random_forest::{MaxFeatures, RandomForest};
pub use xgboost::{XGBoostClassifier, XGBoostConfig};
