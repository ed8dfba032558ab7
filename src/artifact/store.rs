//! Single-file artifact store with atomic replacement

use crate::error::{ChurnError, Result};
use crate::preprocessing::FeatureSchema;
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::TrainedArtifact;

/// Stores the one live artifact at a fixed path.
///
/// Writers go to a sibling temp file that is fsynced and renamed over the
/// target, so readers see either the previous artifact or the new one.
/// In-process readers and writers also share an `RwLock`.
#[derive(Debug)]
pub struct ArtifactStore {
    path: PathBuf,
    schema: FeatureSchema,
    lock: RwLock<()>,
}

impl ArtifactStore {
    /// Store at `path` serving the current churn schema
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_schema(path, FeatureSchema::churn_v1())
    }

    pub fn with_schema(path: impl Into<PathBuf>, schema: FeatureSchema) -> Self {
        Self {
            path: path.into(),
            schema,
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn exists(&self) -> bool {
        let _guard = self.lock.read();
        self.path.is_file()
    }

    /// Serialize and atomically replace the stored artifact
    pub fn save(&self, artifact: &TrainedArtifact) -> Result<()> {
        artifact.validate(&self.schema)?;
        let bytes = bincode::serialize(artifact)?;

        let _guard = self.lock.write();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.temp_path();
        if let Err(e) = Self::write_synced(&tmp_path, &bytes) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove partial artifact");
            }
            return Err(e);
        }
        fs::rename(&tmp_path, &self.path)?;

        info!(
            path = %self.path.display(),
            model = %artifact.model_kind,
            bytes = bytes.len(),
            "Saved model artifact"
        );
        Ok(())
    }

    /// Read and validate the stored artifact
    pub fn load(&self) -> Result<TrainedArtifact> {
        let bytes = {
            let _guard = self.lock.read();
            match fs::read(&self.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ChurnError::ArtifactNotFound(self.path.display().to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        };

        let artifact: TrainedArtifact = bincode::deserialize(&bytes).map_err(|e| {
            ChurnError::SerializationError(format!(
                "Failed to decode artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;
        artifact.validate(&self.schema)?;

        debug!(path = %self.path.display(), model = %artifact.model_kind, "Loaded model artifact");
        Ok(artifact)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }
}
