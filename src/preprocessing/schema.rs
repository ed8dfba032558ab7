//! Fixed feature schema shared by training and inference
//!
//! The schema is persisted inside every trained artifact and checked on load,
//! so a scaler fitted on one column order is never applied to another.

use crate::error::{ChurnError, Result};
use super::columns_to_array2;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current schema version. Bump when the column list changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Ordered model input columns
pub const CHURN_FEATURES: [&str; 15] = [
    "account length",
    "area code",
    "number vmail messages",
    "total day minutes",
    "total day calls",
    "total day charge",
    "total eve minutes",
    "total eve calls",
    "total eve charge",
    "total night minutes",
    "total night calls",
    "total intl minutes",
    "total intl calls",
    "customer service calls",
    "international plan_yes",
];

/// What to do when an inference input lacks a required feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingFeaturePolicy {
    /// Fill absent features with 0
    #[default]
    Lenient,
    /// Reject the input with a validation error
    Strict,
}

impl MissingFeaturePolicy {
    pub fn from_strict_flag(strict: bool) -> Self {
        if strict {
            MissingFeaturePolicy::Strict
        } else {
            MissingFeaturePolicy::Lenient
        }
    }
}

/// Versioned, ordered list of model input columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub columns: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::churn_v1()
    }
}

impl FeatureSchema {
    /// The 15-column churn schema
    pub fn churn_v1() -> Self {
        Self {
            version: SCHEMA_VERSION,
            columns: CHURN_FEATURES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Fail unless `other` has the same version and identical column order
    pub fn ensure_compatible(&self, other: &FeatureSchema) -> Result<()> {
        if self.version != other.version {
            return Err(ChurnError::SchemaMismatch(format!(
                "schema version {} does not match expected version {}",
                other.version, self.version
            )));
        }
        if self.columns != other.columns {
            return Err(ChurnError::SchemaMismatch(format!(
                "feature columns {:?} do not match expected {:?}",
                other.columns, self.columns
            )));
        }
        Ok(())
    }

    /// Select the schema columns from a training table.
    ///
    /// The frame must hold exactly the schema's columns (any order).
    pub fn select_exact(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !present.contains(c))
            .map(|c| c.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ChurnError::SchemaMismatch(format!(
                "training table lacks features: {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = present
            .iter()
            .filter(|c| !self.columns.contains(c))
            .map(|c| c.as_str())
            .collect();
        if !extra.is_empty() {
            return Err(ChurnError::SchemaMismatch(format!(
                "training table has unexpected columns: {}",
                extra.join(", ")
            )));
        }

        // bad training data is a pipeline failure, not a caller error
        columns_to_array2(df, &self.columns).map_err(|e| match e {
            ChurnError::ValidationError(msg) => ChurnError::DataError(msg),
            other => other,
        })
    }

    /// Build a 1 x n feature row from a field -> value mapping.
    ///
    /// Fields outside the schema are ignored. Categorical fields must already
    /// be dummy encoded by the caller (e.g. `international plan_yes`).
    pub fn align_record(
        &self,
        record: &Map<String, Value>,
        policy: MissingFeaturePolicy,
    ) -> Result<Array2<f64>> {
        let mut row = Vec::with_capacity(self.columns.len());
        let mut missing = Vec::new();

        for name in &self.columns {
            match record.get(name) {
                Some(value) => match coerce_value(name, value)? {
                    Some(v) => row.push(v),
                    None => {
                        missing.push(name.as_str());
                        row.push(0.0);
                    }
                },
                None => {
                    missing.push(name.as_str());
                    row.push(0.0);
                }
            }
        }

        self.check_missing(&missing, policy)?;

        Array2::from_shape_vec((1, self.columns.len()), row).map_err(|e| ChurnError::ShapeError {
            expected: format!("1 x {}", self.columns.len()),
            actual: e.to_string(),
        })
    }

    /// Build an n x 15 matrix from an arbitrary frame.
    ///
    /// Absent columns are filled with 0 (or rejected under the strict policy),
    /// extra columns are dropped, unparseable cells become 0.
    pub fn align_frame(&self, df: &DataFrame, policy: MissingFeaturePolicy) -> Result<Array2<f64>> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| !present.contains(c))
            .map(|c| c.as_str())
            .collect();
        self.check_missing(&missing, policy)?;

        let mut aligned = df.clone();
        for name in &missing {
            aligned.with_column(Series::new((*name).into(), vec![0.0f64; df.height()]))?;
        }

        columns_to_array2(&aligned, &self.columns)
    }

    fn check_missing(&self, missing: &[&str], policy: MissingFeaturePolicy) -> Result<()> {
        if policy == MissingFeaturePolicy::Strict && !missing.is_empty() {
            return Err(ChurnError::ValidationError(format!(
                "Missing required features: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

/// Coerce a JSON value to a feature value. `None` means "treat as absent".
fn coerce_value(name: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| {
            ChurnError::ValidationError(format!("Feature '{}' is not a finite number", name))
        }),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if let Ok(v) = trimmed.parse::<f64>() {
                if !v.is_finite() {
                    return Err(ChurnError::ValidationError(format!(
                        "Feature '{}' is not a finite number",
                        name
                    )));
                }
                return Ok(Some(v));
            }
            match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(Some(1.0)),
                "false" | "no" => Ok(Some(0.0)),
                _ => Err(ChurnError::ValidationError(format!(
                    "Feature '{}' has non-numeric value '{}'",
                    name, s
                ))),
            }
        }
        Value::Array(_) | Value::Object(_) => Err(ChurnError::ValidationError(format!(
            "Feature '{}' must be a scalar value",
            name
        ))),
    }
}
