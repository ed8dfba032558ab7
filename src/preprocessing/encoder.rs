//! Dummy (one-hot) encoding of text columns

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder producing `<column>_<category>` indicator columns.
///
/// Categories are the sorted distinct non-null values of each column. With
/// `drop_first` the lowest category is left out, so a yes/no column becomes a
/// single `<column>_yes` indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    drop_first: bool,
    // (column, sorted categories) in the order the columns appear in the frame
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self {
            drop_first: true,
            categories: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }

    /// Learn categories for every text column not listed in `exclude`
    pub fn fit(&mut self, df: &DataFrame, exclude: &[&str]) -> Result<&mut Self> {
        self.categories.clear();

        for column in df.get_columns() {
            let name = column.name().to_string();
            if exclude.contains(&name.as_str()) || column.dtype() != &DataType::String {
                continue;
            }

            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| ChurnError::DataError(e.to_string()))?;
            let levels: BTreeSet<String> = ca.into_iter().flatten().map(str::to_string).collect();
            self.categories.push((name, levels.into_iter().collect()));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted column by its indicator columns, appended at the end
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut indicators: Vec<Series> = Vec::new();
        for (name, levels) in &self.categories {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::FeatureNotFound(name.clone()))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| ChurnError::DataError(e.to_string()))?;

            let skip = usize::from(self.drop_first);
            for level in levels.iter().skip(skip) {
                let values: Vec<f64> = ca
                    .into_iter()
                    .map(|v| if v == Some(level.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                indicators.push(Series::new(format!("{}_{}", name, level).into(), values));
            }
        }

        let mut result = df.clone();
        for (name, _) in &self.categories {
            result = result.drop(name)?;
        }
        for series in indicators {
            result.with_column(series)?;
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, exclude: &[&str]) -> Result<DataFrame> {
        self.fit(df, exclude)?;
        self.transform(df)
    }

    /// Names of the indicator columns `transform` produces
    pub fn output_columns(&self) -> Vec<String> {
        let skip = usize::from(self.drop_first);
        self.categories
            .iter()
            .flat_map(|(name, levels)| {
                levels.iter().skip(skip).map(move |level| format!("{}_{}", name, level))
            })
            .collect()
    }
}
