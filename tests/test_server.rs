//! Integration test: Server API endpoints

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use churn_service::server::{create_router, AppState, ServerConfig, MODEL_NOT_FOUND};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "churn-test-boundary";

fn test_app(dir: &Path, strict_features: bool) -> axum::Router {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        training_data: common::write_training_csv(dir, 150),
        model_path: dir.join("saved_models").join("churn_mlmod.bin"),
        upload_dir: dir.join("uploads"),
        max_upload_size: 10 * 1024 * 1024,
        strict_features,
    };
    create_router(Arc::new(AppState::new(config)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn churner() -> Value {
    json!({
        "account length": 110,
        "area code": 415,
        "number vmail messages": 8,
        "total day minutes": 320.0,
        "total day calls": 100,
        "total day charge": 54.4,
        "total eve minutes": 200.0,
        "total eve calls": 100,
        "total eve charge": 17.0,
        "total night minutes": 200.0,
        "total night calls": 100,
        "total intl minutes": 10.0,
        "total intl calls": 5,
        "customer service calls": 7,
        "international plan_yes": 1
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_trained"], false);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(&app, Request::get("/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_predict_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(&app, json_request("POST", "/predict/", churner())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MODEL_NOT_FOUND);

    let (status, body) = send(&app, Request::get("/model/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MODEL_NOT_FOUND);
}

#[tokio::test]
async fn test_evaluate_rejects_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(
        &app,
        json_request("POST", "/evaluate/", json!({ "model": "SVM", "metric": "Accuracy" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid model");

    let (status, body) = send(
        &app,
        json_request("POST", "/evaluate/", json!({ "model": "XGBoost" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "metric is required");

    // neither request trained anything
    assert!(!dir.path().join("saved_models").join("churn_mlmod.bin").exists());
}

#[tokio::test]
async fn test_evaluate_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/evaluate/",
            json!({ "model": "Logistic Regression", "metric": "Accuracy" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let accuracy = body["Accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
    assert!(dir.path().join("saved_models").join("churn_mlmod.bin").exists());

    let (status, body) = send(&app, json_request("POST", "/predict", churner())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], true);

    let (status, body) = send(&app, Request::get("/model").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "Logistic Regression");
    assert_eq!(body["features"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_unknown_metric_still_trains() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/churn/evaluate/",
            json!({ "model": "Random Forest", "metric": "AUC" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "AUC": "Metric not found" }));
    assert!(dir.path().join("saved_models").join("churn_mlmod.bin").exists());
}

#[tokio::test]
async fn test_predict_list() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, _) = send(
        &app,
        json_request("POST", "/evaluate/", json!({ "model": "XGBoost", "metric": "Recall" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = vec![(320.0, 7, true), (120.0, 0, false), (130.0, 1, false)];
    let csv = common::feature_csv(&rows);
    let (status, body) = send(&app, multipart_request("/churn/predict_list/", "file", "batch.csv", &csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "predictions": [
                { "prediction": true },
                { "prediction": false },
                { "prediction": false }
            ]
        })
    );

    // uploads are cleaned up once the request finishes
    assert!(dir.path().join("uploads").exists());
    assert_eq!(upload_count(dir.path()), 0);
}

fn upload_count(dir: &Path) -> usize {
    std::fs::read_dir(dir.join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_predict_list_rejects_malformed_cells() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, _) = send(
        &app,
        json_request("POST", "/evaluate/", json!({ "model": "Logistic Regression", "metric": "Accuracy" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let csv = common::feature_csv(&[(320.0, 7, true)]).replace("320.0", "garbage");
    for uri in ["/predict_list/", "/predict_list/?strict=true"] {
        let (status, body) = send(&app, multipart_request(uri, "file", "batch.csv", &csv)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("total day minutes"));
    }
    assert_eq!(upload_count(dir.path()), 0);
}

#[tokio::test]
async fn test_predict_list_cleans_up_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);
    let csv = common::feature_csv(&[(320.0, 7, true)]);

    let (status, body) = send(&app, multipart_request("/predict_list/", "file", "batch.csv", &csv)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], MODEL_NOT_FOUND);
    assert_eq!(upload_count(dir.path()), 0);

    // an undecodable artifact fails the pipeline after the upload is stored
    let model_path = dir.path().join("saved_models").join("churn_mlmod.bin");
    std::fs::create_dir_all(model_path.parent().unwrap()).unwrap();
    std::fs::write(&model_path, b"not an artifact").unwrap();

    let (status, body) = send(&app, multipart_request("/predict_list/", "file", "batch.csv", &csv)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(body["error"], MODEL_NOT_FOUND);
    assert_eq!(upload_count(dir.path()), 0);
}

#[tokio::test]
async fn test_predict_list_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(&app, multipart_request("/predict_list/", "other", "x.csv", "a\n1\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = send(&app, json_request("POST", "/predict_list/", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_strict_mode_rejects_missing_features() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), true);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/evaluate/",
            json!({ "model": "Logistic Regression", "metric": "Precision" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let partial = json!({ "total day minutes": 320.0 });
    let (status, body) = send(&app, json_request("POST", "/predict/", partial.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing required features"));

    // the query flag overrides the configured default
    let (status, body) = send(&app, json_request("POST", "/predict/?strict=false", partial)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"].is_boolean());
}

#[tokio::test]
async fn test_predict_rejects_non_object_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path(), false);

    let (status, body) = send(&app, json_request("POST", "/predict/", json!([1, 2, 3]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
