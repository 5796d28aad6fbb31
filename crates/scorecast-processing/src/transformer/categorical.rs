//! Categorical column pipeline: most-frequent imputation, one-hot encoding
//! over the training vocabulary, then scaling by the per-column standard
//! deviation without centring.
//!
//! Values outside the vocabulary encode as an all-zero block.

use crate::error::Result;
use crate::imputers::MostFrequentImputer;
use crate::utils::string_values;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fitted state for one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalPipeline {
    imputer: MostFrequentImputer,
    /// Sorted, deduplicated training categories.
    categories: Vec<String>,
    /// Divisor per indicator column.
    scales: Vec<f64>,
}

impl CategoricalPipeline {
    pub(crate) fn fit(df: &DataFrame, column: &str) -> Result<Self> {
        let values = string_values(df, column)?;
        let imputer = MostFrequentImputer::fit(column, &values)?;
        let filled = imputer.transform(values);

        let mut categories = filled.clone();
        categories.sort();
        categories.dedup();

        let mut counts = vec![0usize; categories.len()];
        for value in &filled {
            if let Ok(pos) = categories.binary_search(value) {
                counts[pos] += 1;
            }
        }

        let n = filled.len() as f64;
        let scales = counts
            .iter()
            .map(|&count| {
                // Population std of a 0/1 indicator with mean p.
                let p = count as f64 / n;
                let std = (p * (1.0 - p)).sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Ok(Self {
            imputer,
            categories,
            scales,
        })
    }

    pub fn column(&self) -> &str {
        self.imputer.column()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of output columns this pipeline contributes.
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Encode every row; returns one `width()`-wide block per row, flattened.
    pub(crate) fn transform(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let values = self.imputer.transform(string_values(df, self.column())?);
        let width = self.width();
        let mut out = vec![0.0; values.len() * width];
        let mut unseen = 0usize;

        for (row, value) in values.iter().enumerate() {
            match self.categories.binary_search(value) {
                Ok(pos) => out[row * width + pos] = 1.0 / self.scales[pos],
                Err(_) => unseen += 1,
            }
        }

        if unseen > 0 {
            warn!(
                column = self.column(),
                unseen, "Unknown categories encoded as all-zero indicators"
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn fitted() -> CategoricalPipeline {
        let train = df!["lunch" => ["standard", "free/reduced", "standard", "standard"]].unwrap();
        CategoricalPipeline::fit(&train, "lunch").unwrap()
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        assert_eq!(fitted().categories(), ["free/reduced", "standard"]);
        assert_eq!(fitted().width(), 2);
    }

    #[test]
    fn test_one_hot_scaled_without_centering() {
        let pipeline = fitted();
        let test = df!["lunch" => ["standard", "free/reduced"]].unwrap();
        let out = pipeline.transform(&test).unwrap();

        // p = 0.25 (free/reduced) and 0.75 (standard); both give std = sqrt(0.75 * 0.25).
        let inv = 1.0 / 0.1875f64.sqrt();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - inv).abs() < 1e-12);
        assert!((out[2] - inv).abs() < 1e-12);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn test_unseen_category_is_zero_block() {
        let pipeline = fitted();
        let test = df!["lunch" => ["catered"]].unwrap();
        assert_eq!(pipeline.transform(&test).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_value_takes_mode() {
        let pipeline = fitted();
        let test = df!["lunch" => [None::<&str>, Some("standard")]].unwrap();
        let out = pipeline.transform(&test).unwrap();
        assert_eq!(out[0..2], out[2..4]);
    }

    #[test]
    fn test_single_category_has_unit_scale() {
        let train = df!["gender" => ["female", "female"]].unwrap();
        let pipeline = CategoricalPipeline::fit(&train, "gender").unwrap();
        assert_eq!(pipeline.transform(&train).unwrap(), vec![1.0, 1.0]);
    }
}
