//! HTTP request handlers

use std::sync::Arc;
use std::time::Instant;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::training::{Metric, ModelKind};

use super::error::{Result, ServerError};
use super::state::AppState;
use super::upload::TempUpload;

const NO_FILE_UPLOADED: &str = "No file uploaded";

/// Optional `?strict=true|false` override of the missing-feature policy
#[derive(Debug, Default, Deserialize)]
pub struct StrictQuery {
    strict: Option<bool>,
}

fn bad_request(message: impl ToString) -> ServerError {
    ServerError::BadRequest(message.to_string())
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    model: Option<String>,
    metric: Option<String>,
}

/// Retrain on the configured data and report one held-out metric.
///
/// An unknown metric name still trains and persists; only the response body
/// changes.
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    let kind = request
        .model
        .as_deref()
        .and_then(ModelKind::from_name)
        .ok_or_else(|| bad_request("Invalid model"))?;
    let metric_name = request
        .metric
        .ok_or_else(|| bad_request("metric is required"))?;

    let _gate = state.training_gate.lock().await;
    let start = Instant::now();
    info!(model = %kind, metric = %metric_name, "Evaluate requested");

    let worker = Arc::clone(&state);
    let report = tokio::task::spawn_blocking(move || worker.trainer.run(&kind, &worker.store)).await??;

    let value = match Metric::from_name(&metric_name) {
        Some(metric) => json!(report.metric(metric)),
        None => json!("Metric not found"),
    };
    info!(
        model = %report.model,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Evaluate finished"
    );

    let mut body = Map::new();
    body.insert(metric_name, value);
    Ok(Json(Value::Object(body)))
}

// ============================================================================
// Inference
// ============================================================================

/// Classify one record given as a JSON object of feature values
pub async fn predict(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<StrictQuery>, QueryRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let Json(body) = payload.map_err(|e| bad_request(e.body_text()))?;

    let record = match body {
        Value::Object(map) => map,
        _ => return Err(bad_request("Request body must be a JSON object of feature values")),
    };
    let policy = state.policy_for(query.strict);

    let worker = Arc::clone(&state);
    let prediction =
        tokio::task::spawn_blocking(move || worker.inference.predict_one(&record, policy)).await??;

    debug!(prediction, "Single prediction");
    Ok(Json(json!({ "prediction": prediction })))
}

/// Classify every row of an uploaded CSV (multipart field `file`)
pub async fn predict_list(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<StrictQuery>, QueryRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let mut multipart = multipart.map_err(|_| bad_request(NO_FILE_UPLOADED))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| bad_request(e.body_text()))? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let data = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
        if data.is_empty() {
            break;
        }

        let stored = TempUpload::write(&state.config.upload_dir, &file_name, &data)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to store upload: {}", e)))?;
        info!(file_name = %file_name, bytes = data.len(), "Batch file received");
        upload = Some(stored);
        break;
    }
    let upload = upload.ok_or_else(|| bad_request(NO_FILE_UPLOADED))?;
    let policy = state.policy_for(query.strict);

    let worker = Arc::clone(&state);
    let path = upload.path().to_path_buf();
    let predictions =
        tokio::task::spawn_blocking(move || worker.inference.predict_csv(&path, policy)).await??;
    drop(upload);

    let rows: Vec<Value> = predictions
        .iter()
        .map(|p| json!({ "prediction": p }))
        .collect();
    Ok(Json(json!({ "predictions": rows })))
}

// ============================================================================
// Model / system
// ============================================================================

/// Metadata of the stored artifact
pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let worker = Arc::clone(&state);
    let artifact = tokio::task::spawn_blocking(move || worker.inference.artifact()).await??;

    serde_json::to_value(artifact.metadata())
        .map(Json)
        .map_err(|e| ServerError::Internal(e.to_string()))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_trained": state.store.exists(),
    }))
}
