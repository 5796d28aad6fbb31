//! Numeric column pipeline: median imputation, then standard scaling.

use crate::error::Result;
use crate::imputers::MedianImputer;
use crate::utils::{mean_and_std, numeric_values};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Fitted state for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPipeline {
    imputer: MedianImputer,
    mean: f64,
    scale: f64,
}

impl NumericPipeline {
    pub(crate) fn fit(df: &DataFrame, column: &str) -> Result<Self> {
        let values = numeric_values(df, column)?;
        let imputer = MedianImputer::fit(column, &values)?;
        let filled = imputer.transform(&values);

        let (mean, std) = mean_and_std(&filled);
        // Constant columns are centred but left unscaled.
        let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };

        Ok(Self {
            imputer,
            mean,
            scale,
        })
    }

    pub fn column(&self) -> &str {
        self.imputer.column()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub(crate) fn transform(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let values = numeric_values(df, self.column())?;
        Ok(self
            .imputer
            .transform(&values)
            .into_iter()
            .map(|v| (v - self.mean) / self.scale)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_standardizes_with_training_statistics() {
        let train = df!["math_score" => [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]].unwrap();
        let pipeline = NumericPipeline::fit(&train, "math_score").unwrap();

        assert_eq!(pipeline.mean(), 5.0);
        assert_eq!(pipeline.scale(), 2.0);

        let test = df!["math_score" => [5.0, 9.0, 1.0]].unwrap();
        assert_eq!(pipeline.transform(&test).unwrap(), vec![0.0, 2.0, -2.0]);
    }

    #[test]
    fn test_missing_values_take_median_before_scaling() {
        let train = df!["reading_score" => [Some(10.0), None, Some(30.0)]].unwrap();
        let pipeline = NumericPipeline::fit(&train, "reading_score").unwrap();

        // Filled column is [10, 20, 30]; the filled row lands on the mean.
        let out = pipeline.transform(&train).unwrap();
        assert_eq!(out[1], 0.0);
        assert!(out[0] < 0.0 && out[2] > 0.0);
    }

    #[test]
    fn test_constant_column_has_unit_scale() {
        let train = df!["math_score" => [50.0, 50.0, 50.0]].unwrap();
        let pipeline = NumericPipeline::fit(&train, "math_score").unwrap();

        assert_eq!(pipeline.scale(), 1.0);
        assert_eq!(pipeline.transform(&train).unwrap(), vec![0.0, 0.0, 0.0]);
    }
}
