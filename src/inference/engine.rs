//! Inference engine implementation

use crate::artifact::{ArtifactStore, TrainedArtifact};
use crate::error::Result;
use crate::preprocessing::{FeatureSchema, MissingFeaturePolicy};
use crate::utils::DataLoader;
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Predicts churn with whatever artifact the store currently holds.
///
/// The artifact is loaded on every call, so a prediction that starts after
/// an evaluate finished always uses the newly trained model and scaler.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    store: Arc<ArtifactStore>,
    loader: DataLoader,
}

impl InferenceEngine {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self {
            store,
            loader: DataLoader::new(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.store.schema()
    }

    /// Current artifact, or `ArtifactNotFound`
    pub fn artifact(&self) -> Result<TrainedArtifact> {
        self.store.load()
    }

    /// Predict a single record given as feature name -> value
    pub fn predict_one(&self, record: &Map<String, Value>, policy: MissingFeaturePolicy) -> Result<bool> {
        let x = self.schema().align_record(record, policy)?;
        let predictions = self.predict_matrix(&x)?;
        Ok(predictions.first().copied().unwrap_or(false))
    }

    /// Predict every row of a frame, in row order
    pub fn predict_many(&self, df: &DataFrame, policy: MissingFeaturePolicy) -> Result<Vec<bool>> {
        let x = self.schema().align_frame(df, policy)?;
        self.predict_matrix(&x)
    }

    /// Read a CSV file and predict every row
    pub fn predict_csv(&self, path: &Path, policy: MissingFeaturePolicy) -> Result<Vec<bool>> {
        let df = self.loader.load_csv(path)?;
        self.predict_many(&df, policy)
    }

    /// Predict rows already aligned to the schema (unscaled)
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<Vec<bool>> {
        let start = Instant::now();
        let artifact = self.store.load()?;
        let predictions = artifact.predict(x)?;

        debug!(
            rows = x.nrows(),
            model = %artifact.model_kind,
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Predicted"
        );
        Ok(predictions)
    }
}
