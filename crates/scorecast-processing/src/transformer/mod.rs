//! Fit-once feature transformer.
//!
//! [`FeatureTransformer`] is the unfit description of which columns are
//! encoded and how. Fitting consumes it and yields a [`FittedTransformer`],
//! which can only `transform`. There is no path from a fitted transformer
//! back to fitting, so test and inference data can never refit it.
//!
//! # Output layout
//!
//! ```text
//! [ numeric columns (standardized) | one-hot block per categorical column ]
//! ```
//!
//! Numeric columns come first in declaration order, followed by each
//! categorical column's indicator block in declaration order, each block
//! ordered by the sorted training vocabulary.

mod categorical;
mod numeric;

pub use categorical::CategoricalPipeline;
pub use numeric::NumericPipeline;

use crate::artifact;
use crate::error::{ProcessingError, Result};
use crate::schema::{CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::utils::require_columns;
use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version of the persisted [`FittedTransformer`] layout.
pub const TRANSFORMER_FORMAT_VERSION: u32 = 1;

/// Unfit transformer: the numeric and categorical column lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTransformer {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
}

impl Default for FeatureTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureTransformer {
    /// Transformer for the student dataset's feature columns.
    pub fn new() -> Self {
        Self::with_columns(&NUMERIC_FEATURES, &CATEGORICAL_FEATURES)
    }

    /// Transformer over arbitrary column lists.
    pub fn with_columns(numeric: &[&str], categorical: &[&str]) -> Self {
        Self {
            numeric_columns: numeric.iter().map(|c| c.to_string()).collect(),
            categorical_columns: categorical.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Learn imputation, scaling and vocabulary from the training features.
    pub fn fit(self, df: &DataFrame) -> Result<FittedTransformer> {
        if df.height() == 0 {
            return Err(ProcessingError::EmptyDataset(
                "cannot fit transformer on zero rows".to_string(),
            ));
        }

        let numeric = self
            .numeric_columns
            .iter()
            .map(|c| NumericPipeline::fit(df, c))
            .collect::<Result<Vec<_>>>()?;
        let categorical = self
            .categorical_columns
            .iter()
            .map(|c| CategoricalPipeline::fit(df, c))
            .collect::<Result<Vec<_>>>()?;

        let fitted = FittedTransformer {
            format_version: TRANSFORMER_FORMAT_VERSION,
            numeric,
            categorical,
        };
        info!(
            rows = df.height(),
            output_width = fitted.n_features_out(),
            "Fitted feature transformer"
        );
        Ok(fitted)
    }

    /// Fit on `df` and encode it in one step.
    pub fn fit_transform(self, df: &DataFrame) -> Result<(FittedTransformer, Array2<f64>)> {
        let fitted = self.fit(df)?;
        let matrix = fitted.transform(df)?;
        Ok((fitted, matrix))
    }
}

/// Transformer with learned state. Persisted as the preprocessor artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformer {
    format_version: u32,
    numeric: Vec<NumericPipeline>,
    categorical: Vec<CategoricalPipeline>,
}

impl FittedTransformer {
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Output column count: numeric columns plus every vocabulary size.
    pub fn n_features_out(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.width()).sum::<usize>()
    }

    /// Names of the output columns, in output order.
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|p| p.column().to_string()).collect();
        for pipeline in &self.categorical {
            for category in pipeline.categories() {
                names.push(format!("{}_{}", pipeline.column(), category));
            }
        }
        names
    }

    /// Columns an input frame must carry.
    pub fn input_columns(&self) -> Vec<&str> {
        self.numeric
            .iter()
            .map(|p| p.column())
            .chain(self.categorical.iter().map(|p| p.column()))
            .collect()
    }

    /// Encode `df` with the fitted state. Never refits.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        require_columns(df, &self.input_columns())?;
        let rows = df.height();
        let mut out = Array2::<f64>::zeros((rows, self.n_features_out()));
        let mut offset = 0;

        for pipeline in &self.numeric {
            let values = pipeline.transform(df)?;
            for (row, v) in values.into_iter().enumerate() {
                out[[row, offset]] = v;
            }
            offset += 1;
        }

        for pipeline in &self.categorical {
            let width = pipeline.width();
            let block = pipeline.transform(df)?;
            for row in 0..rows {
                for j in 0..width {
                    out[[row, offset + j]] = block[row * width + j];
                }
            }
            offset += width;
        }

        Ok(out)
    }

    /// Compatibility tag for artifacts produced against this exact state.
    pub fn fingerprint(&self) -> Result<String> {
        artifact::fingerprint(self)
    }
}
