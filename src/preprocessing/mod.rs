//! Feature table building
//!
//! Turns the raw telecom churn table into the fixed model input:
//! - identifier columns dropped (`phone number`, `state`)
//! - text columns dummy encoded with the first level dropped
//! - highly correlated columns dropped
//! - columns checked against and ordered by the [`FeatureSchema`]
//!
//! Inference inputs skip the encoding step and are aligned directly to the
//! schema (see [`FeatureSchema::align_record`] and [`FeatureSchema::align_frame`]).

mod encoder;
mod scaler;
mod schema;

pub use encoder::OneHotEncoder;
pub use scaler::StandardScaler;
pub use schema::{FeatureSchema, MissingFeaturePolicy, CHURN_FEATURES, SCHEMA_VERSION};

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Features and label ready for resampling
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl TrainingTable {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }
}

/// Builds the training feature matrix from the raw churn table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTableBuilder {
    pub label_column: String,
    /// Columns with no predictive contract
    pub identifier_columns: Vec<String>,
    /// Columns dropped after encoding because they duplicate another feature
    pub correlated_columns: Vec<String>,
    pub schema: FeatureSchema,
}

impl Default for FeatureTableBuilder {
    fn default() -> Self {
        Self {
            label_column: "churn".to_string(),
            identifier_columns: vec!["phone number".to_string(), "state".to_string()],
            correlated_columns: vec![
                "voice mail plan_yes".to_string(),
                "total night charge".to_string(),
                "total intl charge".to_string(),
            ],
            schema: FeatureSchema::churn_v1(),
        }
    }
}

impl FeatureTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Derive the feature matrix and label vector from a raw training table
    pub fn build(&self, df: &DataFrame) -> Result<TrainingTable> {
        let label = df
            .column(&self.label_column)
            .map_err(|_| ChurnError::FeatureNotFound(self.label_column.clone()))?;
        let y = parse_label(label.as_materialized_series())?;

        let mut table = df.clone();
        for name in &self.identifier_columns {
            if has_column(&table, name) {
                table = table.drop(name)?;
            }
        }

        let mut encoder = OneHotEncoder::new();
        table = encoder.fit_transform(&table, &[self.label_column.as_str()])?;

        for name in self.correlated_columns.iter().chain(std::iter::once(&self.label_column)) {
            if has_column(&table, name) {
                table = table.drop(name)?;
            }
        }

        let x = self.schema.select_exact(&table)?;
        if x.nrows() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        Ok(TrainingTable {
            x,
            y,
            feature_names: self.schema.columns().to_vec(),
        })
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Parse the churn label into 0.0 / 1.0.
///
/// Accepts boolean columns, text (`true/false`, `yes/no`, `1/0`) and numbers.
pub fn parse_label(series: &Series) -> Result<Array1<f64>> {
    let name = series.name().to_string();
    let null_label = |i: usize| ChurnError::DataError(format!("Label '{}' is null at row {}", name, i));

    match series.dtype() {
        DataType::Boolean => series
            .bool()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.map(|b| if b { 1.0 } else { 0.0 }).ok_or_else(|| null_label(i)))
            .collect(),
        DataType::String => series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let text = v.ok_or_else(|| null_label(i))?;
                match text.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => Ok(1.0),
                    "false" | "no" | "0" => Ok(0.0),
                    other => Err(ChurnError::DataError(format!(
                        "Unrecognized label '{}' at row {}",
                        other, i
                    ))),
                }
            })
            .collect(),
        _ => {
            let cast = series
                .cast(&DataType::Float64)
                .map_err(|e| ChurnError::DataError(e.to_string()))?;
            cast.f64()?
                .into_iter()
                .enumerate()
                .map(|(i, v)| v.map(|x| if x != 0.0 { 1.0 } else { 0.0 }).ok_or_else(|| null_label(i)))
                .collect()
        }
    }
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Null and blank cells become 0. Text that does not parse as a finite
/// number is a `ValidationError` naming the column and row.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let series = column.as_materialized_series();
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| ChurnError::DataError(e.to_string()))?;
            let text = match series.dtype() {
                DataType::String => Some(series.str()?),
                _ => None,
            };

            let values = series_f64
                .f64()
                .map_err(|e| ChurnError::DataError(e.to_string()))?
                .into_iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(x) if x.is_finite() => Ok(x),
                    Some(x) => Err(ChurnError::ValidationError(format!(
                        "Feature '{}' has non-finite value {} at row {}",
                        col_name, x, row
                    ))),
                    None => match text.and_then(|ca| ca.get(row)).map(str::trim) {
                        Some(cell) if !cell.is_empty() => Err(ChurnError::ValidationError(format!(
                            "Feature '{}' has non-numeric value '{}' at row {}",
                            col_name, cell, row
                        ))),
                        _ => Ok(0.0),
                    },
                })
                .collect::<Result<Vec<f64>>>();
            values
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}
