//! Integration test: Full pipeline (CSV → features → SMOTE → train → artifact → predict)

mod common;

use churn_service::artifact::ArtifactStore;
use churn_service::inference::InferenceEngine;
use churn_service::preprocessing::MissingFeaturePolicy;
use churn_service::training::{Metric, ModelKind, TrainEngine, TrainingConfig};
use churn_service::ChurnError;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn churner_record() -> Map<String, Value> {
    record(json!({
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
    }))
}

fn loyal_record() -> Map<String, Value> {
    let mut r = churner_record();
    r.insert("total day minutes".into(), json!(120.0));
    r.insert("total day charge".into(), json!(20.4));
    r.insert("customer service calls".into(), json!(0));
    r.insert("international plan_yes".into(), json!(0));
    r
}

#[test]
fn test_every_model_trains_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_training_csv(dir.path(), 150);
    let engine = TrainEngine::new(TrainingConfig::new(&data));

    for name in ModelKind::NAMES {
        let store = ArtifactStore::new(dir.path().join(format!("{}.bin", name.replace(' ', "_"))));
        let kind = ModelKind::from_name(name).unwrap();

        let report = engine.run(&kind, &store).unwrap();
        assert_eq!(report.model, name);
        assert_eq!(report.n_raw_samples, 150);
        // 25 churners are oversampled up to the 125 loyal customers
        assert_eq!(report.n_synthetic, 100);
        assert_eq!(report.n_test, 75);
        assert_eq!(report.n_train, 175);
        assert!(
            report.metric(Metric::Accuracy) > 0.85,
            "{} accuracy {}",
            name,
            report.metric(Metric::Accuracy)
        );

        let artifact = store.load().unwrap();
        assert_eq!(artifact.model_kind, name);
        assert_eq!(artifact.metadata().features.len(), 15);
    }
}

#[test]
fn test_predictions_after_training() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_training_csv(dir.path(), 150);
    let store = Arc::new(ArtifactStore::new(dir.path().join("model.bin")));
    let kind = ModelKind::from_name("Random Forest").unwrap();
    TrainEngine::new(TrainingConfig::new(&data)).run(&kind, &store).unwrap();

    let inference = InferenceEngine::new(Arc::clone(&store));
    let lenient = MissingFeaturePolicy::Lenient;

    assert!(inference.predict_one(&churner_record(), lenient).unwrap());
    assert!(!inference.predict_one(&loyal_record(), lenient).unwrap());

    // repeated calls without retraining give the same answer
    for _ in 0..3 {
        assert!(inference.predict_one(&churner_record(), lenient).unwrap());
    }

    // an empty record is all zeros and predicts the same way every time
    let zeros = inference.predict_one(&Map::new(), lenient).unwrap();
    assert_eq!(inference.predict_one(&Map::new(), lenient).unwrap(), zeros);
    let err = inference
        .predict_one(&Map::new(), MissingFeaturePolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, ChurnError::ValidationError(_)));
}

#[test]
fn test_batch_csv_keeps_row_order() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_training_csv(dir.path(), 150);
    let store = Arc::new(ArtifactStore::new(dir.path().join("model.bin")));
    let kind = ModelKind::from_name("XGBoost").unwrap();
    TrainEngine::new(TrainingConfig::new(&data)).run(&kind, &store).unwrap();

    let rows = vec![
        (320.0, 7, true),
        (120.0, 0, false),
        (125.0, 1, false),
        (330.0, 6, true),
    ];
    let batch = dir.path().join("batch.csv");
    std::fs::write(&batch, common::feature_csv(&rows)).unwrap();

    let predictions = InferenceEngine::new(store)
        .predict_csv(&batch, MissingFeaturePolicy::Lenient)
        .unwrap();
    assert_eq!(predictions, vec![true, false, false, true]);
}

#[test]
fn test_retraining_replaces_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_training_csv(dir.path(), 150);
    let store = ArtifactStore::new(dir.path().join("model.bin"));
    let engine = TrainEngine::new(TrainingConfig::new(&data));

    engine
        .run(&ModelKind::from_name("Logistic Regression").unwrap(), &store)
        .unwrap();
    let first = store.load().unwrap();

    engine
        .run(&ModelKind::from_name("Random Forest").unwrap(), &store)
        .unwrap();
    let second = store.load().unwrap();

    assert_eq!(first.model_kind, "Logistic Regression");
    assert_eq!(second.model_kind, "Random Forest");
    // same data and seed, so the scaler is identical across runs
    assert_eq!(first.scaler, second.scaler);
}

#[test]
fn test_inference_follows_retraining() {
    let dir = tempfile::tempdir().unwrap();
    let first_data = common::write_training_csv(dir.path(), 150);
    let second_dir = dir.path().join("second");
    std::fs::create_dir_all(&second_dir).unwrap();
    let second_data = common::write_training_csv(&second_dir, 198);

    let store = Arc::new(ArtifactStore::new(dir.path().join("model.bin")));
    let inference = InferenceEngine::new(Arc::clone(&store));
    let lenient = MissingFeaturePolicy::Lenient;

    TrainEngine::new(TrainingConfig::new(&first_data))
        .run(&ModelKind::from_name("Logistic Regression").unwrap(), &store)
        .unwrap();
    let first = inference.artifact().unwrap();
    assert_eq!(first.model_kind, "Logistic Regression");
    assert!(inference.predict_one(&churner_record(), lenient).unwrap());

    TrainEngine::new(TrainingConfig::new(&second_data))
        .run(&ModelKind::from_name("Random Forest").unwrap(), &store)
        .unwrap();
    let second = inference.artifact().unwrap();
    assert_eq!(second.model_kind, "Random Forest");
    assert_ne!(first.scaler, second.scaler);

    // the same engine now answers with the retrained model and scaler
    for rec in [churner_record(), loyal_record(), Map::new()] {
        let aligned = inference.schema().align_record(&rec, lenient).unwrap();
        let expected = second.predict(&aligned).unwrap()[0];
        assert_eq!(inference.predict_one(&rec, lenient).unwrap(), expected);
    }
}

#[test]
fn test_training_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_training_csv(dir.path(), 120);
    let engine = TrainEngine::new(TrainingConfig::new(&data));
    let df = engine.load_training_data().unwrap();
    let kind = ModelKind::from_name("Random Forest").unwrap();

    let (_, a) = engine.fit_frame(&df, &kind).unwrap();
    let (_, b) = engine.fit_frame(&df, &kind).unwrap();
    assert_eq!(a.metrics.accuracy, b.metrics.accuracy);
    assert_eq!(a.metrics.recall, b.metrics.recall);
}

#[test]
fn test_missing_training_data_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.bin"));
    let engine = TrainEngine::new(TrainingConfig::new(dir.path().join("absent.csv")));

    let err = engine
        .run(&ModelKind::from_name("XGBoost").unwrap(), &store)
        .unwrap_err();
    assert!(matches!(err, ChurnError::DataError(_)));
    assert!(!store.exists());
}
