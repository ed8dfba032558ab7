//! Churn Service - customer churn prediction
//!
//! Trains a binary churn classifier on a labeled telecom customer table and
//! serves predictions over HTTP.
//!
//! # Modules
//!
//! - [`preprocessing`] - Feature schema, one-hot encoding, standard scaling
//! - [`synthetic`] - SMOTE oversampling of the minority class
//! - [`training`] - Logistic regression, random forest and gradient boosted trees
//! - [`artifact`] - Persisted model + scaler pair
//! - [`inference`] - Single-record and batch prediction
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use churn_service::artifact::ArtifactStore;
//! use churn_service::training::{ModelKind, TrainEngine, TrainingConfig};
//!
//! # fn main() -> churn_service::Result<()> {
//! let store = ArtifactStore::new("./saved_models/churn_mlmod.bin");
//! let kind = ModelKind::from_name("Random Forest").expect("known model");
//! let report = TrainEngine::new(TrainingConfig::new("./data/custChurn.csv")).run(&kind, &store)?;
//! println!("accuracy = {:.3}", report.metrics.accuracy);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod synthetic;
pub mod training;
pub mod artifact;
pub mod inference;

// Services
pub mod server;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{ChurnError, Result};
