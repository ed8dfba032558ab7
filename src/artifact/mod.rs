//! Trained model artifact
//!
//! One artifact holds everything inference needs: the fitted classifier, the
//! scaler fitted during training and the feature schema both were fitted on.
//! It is written as a single bincode file that every evaluate overwrites.

mod store;

pub use store::ArtifactStore;

use crate::error::{ChurnError, Result};
use crate::preprocessing::{FeatureSchema, StandardScaler};
use crate::training::{ModelMetrics, TrainedModel};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Bump when the envelope layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Persisted (model, scaler) pair with the metadata it was trained under
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifact {
    pub format_version: u32,
    pub model_kind: String,
    pub created_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
    pub model: TrainedModel,
    /// Held-out metrics from the training run
    pub metrics: ModelMetrics,
}

/// Artifact summary without the fitted parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model: String,
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub features: Vec<String>,
    pub metrics: ModelMetrics,
}

impl TrainedArtifact {
    pub fn new(
        model: TrainedModel,
        scaler: StandardScaler,
        schema: FeatureSchema,
        metrics: ModelMetrics,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_kind: model.kind_name().to_string(),
            created_at: Utc::now(),
            schema,
            scaler,
            model,
            metrics,
        }
    }

    /// Fail unless this artifact can serve inputs aligned to `expected`
    pub fn validate(&self, expected: &FeatureSchema) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ChurnError::SchemaMismatch(format!(
                "artifact format version {} is not supported (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        expected.ensure_compatible(&self.schema)?;
        if self.scaler.n_features() != self.schema.len() {
            return Err(ChurnError::SchemaMismatch(format!(
                "scaler was fitted on {} features, schema has {}",
                self.scaler.n_features(),
                self.schema.len()
            )));
        }
        Ok(())
    }

    /// Scale raw aligned features with the stored scaler and classify them
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<bool>> {
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let scaled = self.scaler.transform(x)?;
        let labels = self.model.predict(&scaled)?;
        Ok(labels.iter().map(|&v| v >= 0.5).collect())
    }

    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            model: self.model_kind.clone(),
            format_version: self.format_version,
            created_at: self.created_at,
            features: self.schema.columns().to_vec(),
            metrics: self.metrics.clone(),
        }
    }
}
