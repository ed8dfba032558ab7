//! Application state management

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::artifact::ArtifactStore;
use crate::inference::InferenceEngine;
use crate::preprocessing::MissingFeaturePolicy;
use crate::training::TrainEngine;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<ArtifactStore>,
    pub trainer: TrainEngine,
    pub inference: InferenceEngine,
    /// Held for the whole train-and-persist step of an evaluate request
    pub training_gate: Mutex<()>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(ArtifactStore::new(config.model_path.clone()));
        let trainer = TrainEngine::new(config.training_config());
        let inference = InferenceEngine::new(Arc::clone(&store));

        Self {
            config,
            store,
            trainer,
            inference,
            training_gate: Mutex::new(()),
        }
    }

    /// Request override (`?strict=`) first, then the configured default
    pub fn policy_for(&self, strict: Option<bool>) -> MissingFeaturePolicy {
        MissingFeaturePolicy::from_strict_flag(strict.unwrap_or(self.config.strict_features))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("model_path", &self.store.path())
            .finish()
    }
}
