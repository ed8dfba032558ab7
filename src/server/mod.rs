//! Churn Prediction Server Module
//!
//! REST API for retraining the churn classifier and predicting single
//! records or uploaded CSV batches.

mod api;
mod error;
mod handlers;
mod state;
mod upload;

pub use api::create_router;
pub use error::{ServerError, MODEL_NOT_FOUND};
pub use state::AppState;
pub use upload::TempUpload;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::training::TrainingConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Labeled CSV every evaluate request trains on
    pub training_data: PathBuf,
    pub model_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
    /// Reject predict requests with missing features unless `?strict=` says otherwise
    pub strict_features: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            training_data: std::env::var("TRAINING_DATA")
                .unwrap_or_else(|_| "./data/custChurn.csv".to_string())
                .into(),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./saved_models/churn_mlmod.bin".to_string())
                .into(),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100 * 1024 * 1024), // 100MB
            strict_features: std::env::var("STRICT_FEATURES")
                .ok()
                .map(|s| parse_flag(&s))
                .unwrap_or(false),
        }
    }
}

impl ServerConfig {
    /// Training settings for the configured data file
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::new(self.training_data.clone())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    std::fs::create_dir_all(&config.upload_dir)?;
    if !config.training_data.exists() {
        warn!(
            training_data = %config.training_data.display(),
            "Training data not found, evaluate requests will fail until it exists"
        );
    }

    let state = Arc::new(AppState::new(config.clone()));
    let app = create_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        address = %addr,
        training_data = %config.training_data.display(),
        model_path = %config.model_path.display(),
        model_trained = state.store.exists(),
        strict_features = config.strict_features,
        max_upload_size_mb = config.max_upload_size / 1024 / 1024,
        started_at = %start_time.to_rfc3339(),
        "Churn server starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, shutting down");
        }
        let stop_time = chrono::Utc::now();
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = stop_time.signed_duration_since(start_time).num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
