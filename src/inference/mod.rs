//! Inference module
//!
//! Aligns single records or uploaded tables to the feature schema, applies
//! the stored scaler and classifies each row as churn / no churn.

mod engine;

pub use engine::InferenceEngine;
